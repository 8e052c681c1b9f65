//! Core data models for the simulator.

mod box_score;
mod highlights;
mod ids;
mod match_result;
mod player;
mod possession;
mod record;

pub use box_score::*;
pub use highlights::*;
pub use ids::*;
pub use match_result::*;
pub use player::*;
pub use possession::*;
pub use record::*;

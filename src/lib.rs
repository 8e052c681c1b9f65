//! # Courtside
//!
//! A stochastic basketball match simulator.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, possessions, box scores, results)
//! - **engine**: Possession resolver and match orchestrator
//! - **highlights**: Key-moment detection over a finished match
//! - **commentary**: Narrative generation, provider-backed or templated
//! - **calculate**: Shooting percentages, MVP scoring, series aggregation
//! - **storage**: JSONL match store and roster loading
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod commentary;
pub mod config;
pub mod engine;
pub mod highlights;
pub mod models;
pub mod storage;

pub use models::*;

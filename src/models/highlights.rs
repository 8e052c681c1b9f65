//! Key moments and the highlight package built from them.

use serde::{Deserialize, Serialize};

use super::{parse_clock, TeamSide};

/// How much a moment matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    /// Higher is more important.
    pub fn rank(&self) -> u8 {
        match self {
            Importance::High => 2,
            Importance::Medium => 1,
            Importance::Low => 0,
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Importance::High => write!(f, "high"),
            Importance::Medium => write!(f, "medium"),
            Importance::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentType {
    ClutchShot,
    MomentumSwing,
    Run,
    Comeback,
    HighlightPlay,
    Milestone,
}

impl std::fmt::Display for MomentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MomentType::ClutchShot => write!(f, "clutch_shot"),
            MomentType::MomentumSwing => write!(f, "momentum_swing"),
            MomentType::Run => write!(f, "run"),
            MomentType::Comeback => write!(f, "comeback"),
            MomentType::HighlightPlay => write!(f, "highlight_play"),
            MomentType::Milestone => write!(f, "milestone"),
        }
    }
}

/// A detected key moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMoment {
    pub quarter: u32,
    pub clock: String,
    pub description: String,
    pub importance: Importance,

    #[serde(rename = "type")]
    pub moment_type: MomentType,

    /// Side the moment favors, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamSide>,

    #[serde(default)]
    pub players: Vec<String>,
}

impl GameMoment {
    pub fn seconds_remaining(&self) -> u32 {
        parse_clock(&self.clock).unwrap_or(0)
    }

    /// Sort key placing earlier game time first.
    pub fn chronological_key(&self) -> (u32, std::cmp::Reverse<u32>) {
        (self.quarter, std::cmp::Reverse(self.seconds_remaining()))
    }
}

/// Which path produced the highlight prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentarySource {
    #[default]
    Template,
    Provider,
}

/// Presentation-ready highlights for a finished match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameHighlights {
    pub moments: Vec<GameMoment>,
    pub narrative: String,
    pub summary: String,
    #[serde(default)]
    pub source: CommentarySource,
}

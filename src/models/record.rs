//! Stored form of a finished match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{GameHighlights, MatchResult, TeamId, TeamSide};

/// A persisted match, one line in the match store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Unique identifier
    pub id: String,

    pub team1_id: TeamId,
    pub team1_name: String,
    pub team2_id: TeamId,
    pub team2_name: String,
    pub team1_score: u32,
    pub team2_score: u32,
    pub winner: TeamSide,
    pub mvp_name: String,
    pub overtime_periods: usize,

    /// Quarters with their possessions, serialized as JSON
    pub play_by_play: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<GameHighlights>,

    /// When this was stored
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn from_result(result: &MatchResult) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            team1_id: result.team1.id.clone(),
            team1_name: result.team1.name.clone(),
            team2_id: result.team2.id.clone(),
            team2_name: result.team2.name.clone(),
            team1_score: result.team1_score,
            team2_score: result.team2_score,
            winner: result.winner,
            mvp_name: result.mvp.player_name.clone(),
            overtime_periods: result.overtime_periods(),
            play_by_play: serde_json::to_string(&result.quarters)?,
            highlights: result.highlights.clone(),
            created_at: Utc::now(),
        })
    }

    pub fn winner_name(&self) -> &str {
        match self.winner {
            TeamSide::Team1 => &self.team1_name,
            TeamSide::Team2 => &self.team2_name,
        }
    }
}

/// Compact listing view of a stored match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: String,
    pub team1_name: String,
    pub team2_name: String,
    pub team1_score: u32,
    pub team2_score: u32,
    pub winner: String,
    pub mvp_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&MatchRecord> for MatchSummary {
    fn from(record: &MatchRecord) -> Self {
        Self {
            id: record.id.clone(),
            team1_name: record.team1_name.clone(),
            team2_name: record.team2_name.clone(),
            team1_score: record.team1_score,
            team2_score: record.team2_score,
            winner: record.winner_name().to_string(),
            mvp_name: record.mvp_name.clone(),
            created_at: record.created_at,
        }
    }
}

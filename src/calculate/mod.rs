//! Statistics calculation helpers.
//!
//! Pure functions shared by the engine, the box score and the CLI:
//! - Shooting percentages
//! - MVP composite scores
//! - Head-to-head series aggregation

use serde::Serialize;

use crate::models::{MatchResult, PlayerGameStats, TeamSide};

/// made / attempted, or 0.0 with no attempts.
pub fn shooting_percentage(made: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        0.0
    } else {
        made as f64 / attempted as f64
    }
}

/// Full MVP composite including defensive stats.
pub fn mvp_score(stats: &PlayerGameStats) -> f64 {
    mvp_threshold(stats) + 2.0 * stats.steals as f64 + 2.0 * stats.blocks as f64
}

/// Offensive part of the composite, kept as the running MVP bar.
pub fn mvp_threshold(stats: &PlayerGameStats) -> f64 {
    stats.points as f64 + 1.2 * stats.rebounds as f64 + 1.5 * stats.assists as f64
}

/// Aggregate outcome of repeated matches between the same two rosters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesSummary {
    pub games: u32,
    pub team1_wins: u32,
    pub team2_wins: u32,
    pub overtime_games: u32,
    pub team1_points: u64,
    pub team2_points: u64,
}

impl SeriesSummary {
    pub fn record(&mut self, result: &MatchResult) {
        self.games += 1;
        match result.winner {
            TeamSide::Team1 => self.team1_wins += 1,
            TeamSide::Team2 => self.team2_wins += 1,
        }
        if result.overtime_periods() > 0 {
            self.overtime_games += 1;
        }
        self.team1_points += result.team1_score as u64;
        self.team2_points += result.team2_score as u64;
    }

    pub fn win_rate(&self, side: TeamSide) -> f64 {
        let wins = match side {
            TeamSide::Team1 => self.team1_wins,
            TeamSide::Team2 => self.team2_wins,
        };
        shooting_percentage(wins, self.games)
    }

    pub fn average_points(&self, side: TeamSide) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        let total = match side {
            TeamSide::Team1 => self.team1_points,
            TeamSide::Team2 => self.team2_points,
        };
        total as f64 / self.games as f64
    }
}

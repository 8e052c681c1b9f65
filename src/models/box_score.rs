//! Per-player ledgers and team aggregates.

use serde::{Deserialize, Serialize};

use super::{Player, PlayerId, Position, ShotType};
use crate::calculate::shooting_percentage;

/// Mutable in-game accumulator for one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStats {
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: Position,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub three_pointers_made: u32,
    pub three_pointers_attempted: u32,
    pub free_throws_made: u32,
    pub free_throws_attempted: u32,
}

impl PlayerGameStats {
    pub fn new(player: &Player) -> Self {
        Self {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            position: player.position,
            ..Self::default()
        }
    }

    /// Credit a successful shot. Three-pointers also count as field goals;
    /// a trip to the line is two attempts.
    pub fn record_make(&mut self, shot: ShotType, points: u32) {
        self.points += points;
        match shot {
            ShotType::FreeThrow => {
                self.free_throws_made += points;
                self.free_throws_attempted += 2;
            }
            ShotType::ThreePointer => {
                self.field_goals_made += 1;
                self.field_goals_attempted += 1;
                self.three_pointers_made += 1;
                self.three_pointers_attempted += 1;
            }
            ShotType::Layup | ShotType::MidRange => {
                self.field_goals_made += 1;
                self.field_goals_attempted += 1;
            }
        }
    }

    pub fn record_miss(&mut self, shot: ShotType) {
        match shot {
            ShotType::FreeThrow => self.free_throws_attempted += 2,
            ShotType::ThreePointer => {
                self.field_goals_attempted += 1;
                self.three_pointers_attempted += 1;
            }
            ShotType::Layup | ShotType::MidRange => self.field_goals_attempted += 1,
        }
    }

    /// attempted >= made in every category.
    pub fn is_consistent(&self) -> bool {
        self.field_goals_attempted >= self.field_goals_made
            && self.three_pointers_attempted >= self.three_pointers_made
            && self.free_throws_attempted >= self.free_throws_made
            && self.field_goals_attempted >= self.three_pointers_attempted
    }
}

/// Team totals derived from player ledgers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamGameStats {
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
    pub field_goal_percentage: f64,
    pub three_point_percentage: f64,
    pub free_throw_percentage: f64,
}

impl TeamGameStats {
    pub fn from_players<'a>(players: impl IntoIterator<Item = &'a PlayerGameStats>) -> Self {
        let mut totals = Self::default();
        let (mut fgm, mut fga, mut tpm, mut tpa, mut ftm, mut fta) = (0, 0, 0, 0, 0, 0);

        for p in players {
            totals.points += p.points;
            totals.rebounds += p.rebounds;
            totals.assists += p.assists;
            totals.steals += p.steals;
            totals.blocks += p.blocks;
            totals.turnovers += p.turnovers;
            fgm += p.field_goals_made;
            fga += p.field_goals_attempted;
            tpm += p.three_pointers_made;
            tpa += p.three_pointers_attempted;
            ftm += p.free_throws_made;
            fta += p.free_throws_attempted;
        }

        totals.field_goal_percentage = shooting_percentage(fgm, fga);
        totals.three_point_percentage = shooting_percentage(tpm, tpa);
        totals.free_throw_percentage = shooting_percentage(ftm, fta);
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> PlayerGameStats {
        PlayerGameStats::new(&Player::new("p1", "Guard", Position::PointGuard))
    }

    #[test]
    fn test_record_three_counts_as_field_goal() {
        let mut stats = ledger();
        stats.record_make(ShotType::ThreePointer, 3);
        stats.record_miss(ShotType::ThreePointer);

        assert_eq!(stats.points, 3);
        assert_eq!(stats.field_goals_made, 1);
        assert_eq!(stats.field_goals_attempted, 2);
        assert_eq!(stats.three_pointers_made, 1);
        assert_eq!(stats.three_pointers_attempted, 2);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_record_free_throw_trip() {
        let mut stats = ledger();
        stats.record_make(ShotType::FreeThrow, 1);
        stats.record_miss(ShotType::FreeThrow);

        assert_eq!(stats.points, 1);
        assert_eq!(stats.free_throws_made, 1);
        assert_eq!(stats.free_throws_attempted, 4);
        assert_eq!(stats.field_goals_attempted, 0);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_new_ledger_is_zeroed() {
        let stats = ledger();
        assert_eq!(stats.player_name, "Guard");
        assert_eq!(stats.points, 0);
        assert_eq!(stats.field_goals_attempted, 0);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_team_totals() {
        let mut a = ledger();
        a.record_make(ShotType::Layup, 2);
        a.record_miss(ShotType::MidRange);
        a.rebounds = 4;
        a.turnovers = 1;

        let mut b = ledger();
        b.record_make(ShotType::ThreePointer, 3);
        b.assists = 2;
        b.steals = 1;

        let team = TeamGameStats::from_players([&a, &b]);
        assert_eq!(team.points, 5);
        assert_eq!(team.rebounds, 4);
        assert_eq!(team.assists, 2);
        assert_eq!(team.steals, 1);
        assert_eq!(team.turnovers, 1);
        assert!((team.field_goal_percentage - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(team.three_point_percentage, 1.0);
        assert_eq!(team.free_throw_percentage, 0.0);
    }
}

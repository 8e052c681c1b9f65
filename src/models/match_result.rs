//! Final match output.

use serde::{Deserialize, Serialize};

use super::{GameHighlights, PlayerGameStats, PlayerId, Possession, QuarterStats, Team, TeamSide};

/// Most valuable player of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvpRecord {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: TeamSide,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub steals: u32,
    pub blocks: u32,
}

impl MvpRecord {
    pub fn from_ledger(stats: &PlayerGameStats, team: TeamSide) -> Self {
        Self {
            player_id: stats.player_id.clone(),
            player_name: stats.player_name.clone(),
            team,
            points: stats.points,
            rebounds: stats.rebounds,
            assists: stats.assists,
            steals: stats.steals,
            blocks: stats.blocks,
        }
    }

    /// "Name (28 PTS, 9 REB, 7 AST)"
    pub fn stat_line(&self) -> String {
        format!(
            "{} ({} PTS, {} REB, {} AST)",
            self.player_name, self.points, self.rebounds, self.assists
        )
    }
}

/// The complete, immutable outcome of one simulated match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub team1: Team,
    pub team2: Team,
    pub team1_score: u32,
    pub team2_score: u32,
    pub quarters: Vec<QuarterStats>,
    pub winner: TeamSide,
    pub mvp: MvpRecord,

    /// Final ledgers, in roster order
    pub team1_box_score: Vec<PlayerGameStats>,
    pub team2_box_score: Vec<PlayerGameStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<GameHighlights>,
}

impl MatchResult {
    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::Team1 => &self.team1,
            TeamSide::Team2 => &self.team2,
        }
    }

    pub fn score(&self, side: TeamSide) -> u32 {
        match side {
            TeamSide::Team1 => self.team1_score,
            TeamSide::Team2 => self.team2_score,
        }
    }

    pub fn box_score(&self, side: TeamSide) -> &[PlayerGameStats] {
        match side {
            TeamSide::Team1 => &self.team1_box_score,
            TeamSide::Team2 => &self.team2_box_score,
        }
    }

    pub fn winning_team(&self) -> &Team {
        self.team(self.winner)
    }

    pub fn losing_team(&self) -> &Team {
        self.team(self.winner.opponent())
    }

    /// Winner's score minus loser's score.
    pub fn margin(&self) -> u32 {
        self.team1_score.abs_diff(self.team2_score)
    }

    pub fn overtime_periods(&self) -> usize {
        self.quarters.iter().filter(|q| q.is_overtime()).count()
    }

    /// Every possession in game order.
    pub fn possessions(&self) -> impl Iterator<Item = &Possession> {
        self.quarters.iter().flat_map(|q| q.possessions.iter())
    }

    /// "Home 104 - 99 Away"
    pub fn scoreline(&self) -> String {
        format!(
            "{} {} - {} {}",
            self.team1.name, self.team1_score, self.team2_score, self.team2.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, Position, PossessionResult};

    fn quarter(number: u32, team1: u32, team2: u32) -> QuarterStats {
        let possession = |team: TeamSide, points: u32| Possession {
            team,
            quarter: number,
            clock: "6:00".to_string(),
            player: "P".to_string(),
            action: String::new(),
            points,
            result: PossessionResult::Made,
            shot_type: None,
            assisted_by: None,
            stolen_by: None,
            rebounded_by: None,
        };
        QuarterStats::from_possessions(
            number,
            vec![possession(TeamSide::Team1, team1), possession(TeamSide::Team2, team2)],
        )
    }

    fn result(quarters: Vec<QuarterStats>) -> MatchResult {
        let team1_score = quarters.iter().map(|q| q.team1_score).sum();
        let team2_score = quarters.iter().map(|q| q.team2_score).sum();
        let stats = PlayerGameStats::new(&Player::new("h1", "Hal", Position::Center));

        MatchResult {
            team1: Team::new("h", "Home", vec![]),
            team2: Team::new("a", "Away", vec![]),
            team1_score,
            team2_score,
            winner: if team1_score > team2_score {
                TeamSide::Team1
            } else {
                TeamSide::Team2
            },
            quarters,
            mvp: MvpRecord::from_ledger(&stats, TeamSide::Team1),
            team1_box_score: vec![stats],
            team2_box_score: vec![],
            highlights: None,
        }
    }

    #[test]
    fn test_accessors() {
        let r = result(vec![quarter(1, 3, 2), quarter(2, 2, 2), quarter(3, 0, 3), quarter(4, 2, 1)]);

        assert_eq!(r.winner, TeamSide::Team2);
        assert_eq!(r.winning_team().name, "Away");
        assert_eq!(r.losing_team().name, "Home");
        assert_eq!(r.score(TeamSide::Team1), 7);
        assert_eq!(r.score(TeamSide::Team2), 8);
        assert_eq!(r.margin(), 1);
        assert_eq!(r.overtime_periods(), 0);
        assert_eq!(r.possessions().count(), 8);
        assert_eq!(r.box_score(TeamSide::Team1).len(), 1);
        assert_eq!(r.scoreline(), "Home 7 - 8 Away");
    }

    #[test]
    fn test_overtime_count_and_margin() {
        let r = result(vec![
            quarter(1, 2, 2),
            quarter(2, 2, 2),
            quarter(3, 2, 2),
            quarter(4, 2, 2),
            quarter(5, 3, 3),
            quarter(6, 3, 0),
        ]);

        assert_eq!(r.overtime_periods(), 2);
        assert_eq!(r.winner, TeamSide::Team1);
        assert_eq!(r.margin(), 3);
    }

    #[test]
    fn test_mvp_stat_line() {
        let mut stats = PlayerGameStats::new(&Player::new("x", "Xia", Position::PointGuard));
        stats.points = 28;
        stats.rebounds = 9;
        stats.assists = 7;

        let mvp = MvpRecord::from_ledger(&stats, TeamSide::Team2);
        assert_eq!(mvp.team, TeamSide::Team2);
        assert_eq!(mvp.stat_line(), "Xia (28 PTS, 9 REB, 7 AST)");
    }
}

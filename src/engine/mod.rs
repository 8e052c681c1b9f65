//! Match simulation engine.
//!
//! A [`SimulationEngine`] owns two rosters, their ledgers and a random
//! source. It plays four regulation quarters, adds overtime periods until
//! the score is untied, picks an MVP and attaches highlights.

pub mod possession;
pub mod random;

use thiserror::Error;
use tracing::{info, warn};

use crate::calculate::{mvp_score, mvp_threshold};
use crate::commentary::CommentaryGenerator;
use crate::highlights::detect_moments;
use crate::models::{
    MatchResult, MvpRecord, PlayerGameStats, QuarterStats, Team, TeamGameStats, TeamSide,
};
use possession::{PossessionResolver, PossessionSlot, TeamLedger};
use random::{chance, RandomSource, StdRandom};

pub const QUARTER_MINUTES: u32 = 12;
pub const QUARTER_SECONDS: u32 = QUARTER_MINUTES * 60;
pub const REGULATION_QUARTERS: u32 = 4;
pub const POSSESSIONS_PER_QUARTER: usize = 25;
pub const POSSESSIONS_PER_OVERTIME: usize = 10;

/// Overtime periods after which a tie is treated as a broken random source.
const MAX_OVERTIME_PERIODS: u32 = 100;

/// Errors raised when constructing an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{side} ({name}) has an empty roster")]
    EmptyRoster { side: TeamSide, name: String },
}

pub struct SimulationEngine {
    team1: TeamLedger,
    team2: TeamLedger,
    rng: Box<dyn RandomSource>,
    commentary: CommentaryGenerator,
}

impl SimulationEngine {
    /// Create an engine with an entropy-seeded random source and template
    /// commentary.
    pub fn new(team1: Team, team2: Team) -> Result<Self, EngineError> {
        for (side, team) in [(TeamSide::Team1, &team1), (TeamSide::Team2, &team2)] {
            if team.players.is_empty() {
                return Err(EngineError::EmptyRoster {
                    side,
                    name: team.name.clone(),
                });
            }
        }

        Ok(Self {
            team1: TeamLedger::new(team1),
            team2: TeamLedger::new(team2),
            rng: Box::new(StdRandom::from_entropy()),
            commentary: CommentaryGenerator::default(),
        })
    }

    /// Builder method to replace the random source.
    pub fn with_random_source(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Builder method for a reproducible match.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_random_source(StdRandom::seeded(seed))
    }

    /// Builder method to inject the commentary generator.
    pub fn with_commentary(mut self, commentary: CommentaryGenerator) -> Self {
        self.commentary = commentary;
        self
    }

    /// Simulate a full match with template commentary.
    pub fn simulate_match(&mut self) -> MatchResult {
        let mut result = self.play();

        result.highlights = match detect_moments(&result) {
            Ok(moments) => Some(self.commentary.fallback_highlights(&result, moments)),
            Err(e) => {
                warn!("Highlight generation failed, returning result without highlights: {}", e);
                None
            }
        };

        result
    }

    /// Simulate a full match and ask the commentary provider for prose.
    /// The provider is best-effort; any failure falls back to templates.
    pub async fn simulate_match_with_commentary(&mut self) -> MatchResult {
        let mut result = self.play();

        result.highlights = match detect_moments(&result) {
            Ok(moments) => Some(self.commentary.generate_highlights(&result, moments).await),
            Err(e) => {
                warn!("Highlight generation failed, returning result without highlights: {}", e);
                None
            }
        };

        result
    }

    /// Team totals from the most recent simulation.
    pub fn team_stats(&self, side: TeamSide) -> TeamGameStats {
        TeamGameStats::from_players(self.ledger(side).players.iter())
    }

    /// Player ledgers from the most recent simulation, in roster order.
    pub fn player_stats(&self, side: TeamSide) -> &[PlayerGameStats] {
        &self.ledger(side).players
    }

    fn ledger(&self, side: TeamSide) -> &TeamLedger {
        match side {
            TeamSide::Team1 => &self.team1,
            TeamSide::Team2 => &self.team2,
        }
    }

    fn play(&mut self) -> MatchResult {
        self.team1.reset();
        self.team2.reset();

        let mut quarters = Vec::new();
        for quarter in 1..=REGULATION_QUARTERS {
            quarters.push(self.simulate_period(quarter, POSSESSIONS_PER_QUARTER));
        }

        let mut team1_score: u32 = quarters.iter().map(|q| q.team1_score).sum();
        let mut team2_score: u32 = quarters.iter().map(|q| q.team2_score).sum();

        let mut quarter = REGULATION_QUARTERS;
        while team1_score == team2_score {
            quarter += 1;
            assert!(
                quarter - REGULATION_QUARTERS <= MAX_OVERTIME_PERIODS,
                "tie survived {} overtime periods",
                MAX_OVERTIME_PERIODS
            );
            info!("Tied at {} after {} periods, playing overtime", team1_score, quarter - 1);

            let overtime = self.simulate_period(quarter, POSSESSIONS_PER_OVERTIME);
            team1_score += overtime.team1_score;
            team2_score += overtime.team2_score;
            quarters.push(overtime);
        }

        let winner = if team1_score > team2_score {
            TeamSide::Team1
        } else {
            TeamSide::Team2
        };
        let mvp = self.compute_mvp();

        info!(
            "Final: {} {} - {} {} (MVP: {})",
            self.team1.team.name,
            team1_score,
            team2_score,
            self.team2.team.name,
            mvp.stat_line()
        );

        MatchResult {
            team1: self.team1.team.clone(),
            team2: self.team2.team.clone(),
            team1_score,
            team2_score,
            quarters,
            winner,
            mvp,
            team1_box_score: self.team1.players.clone(),
            team2_box_score: self.team2.players.clone(),
            highlights: None,
        }
    }

    /// Alternating possessions, first offense decided by a coin flip.
    fn simulate_period(&mut self, quarter: u32, possessions: usize) -> QuarterStats {
        let first = if chance(self.rng.as_mut(), 0.5) {
            TeamSide::Team1
        } else {
            TeamSide::Team2
        };

        let mut events = Vec::with_capacity(possessions);
        let mut resolver = PossessionResolver::new(self.rng.as_mut());

        for index in 0..possessions {
            let offense = if index % 2 == 0 { first } else { first.opponent() };
            let slot = PossessionSlot {
                offense,
                quarter,
                index,
                possessions_in_period: possessions,
            };
            let event = match offense {
                TeamSide::Team1 => resolver.resolve(&mut self.team1, &mut self.team2, slot),
                TeamSide::Team2 => resolver.resolve(&mut self.team2, &mut self.team1, slot),
            };
            events.push(event);
        }

        let stats = QuarterStats::from_possessions(quarter, events);
        info!(
            "{} complete: {} {} - {} {}",
            stats.label(),
            self.team1.team.name,
            stats.team1_score,
            stats.team2_score,
            self.team2.team.name
        );
        stats
    }

    /// A player becomes MVP when their full composite (with steals and
    /// blocks) beats the running bar; the bar is then set to their
    /// points/rebounds/assists composite only.
    fn compute_mvp(&self) -> MvpRecord {
        let mut best: Option<(TeamSide, &PlayerGameStats)> = None;
        let mut bar = 0.0;

        let all = self
            .team1
            .players
            .iter()
            .map(|p| (TeamSide::Team1, p))
            .chain(self.team2.players.iter().map(|p| (TeamSide::Team2, p)));

        for (side, stats) in all {
            if mvp_score(stats) > bar {
                bar = mvp_threshold(stats);
                best = Some((side, stats));
            }
        }

        // Rosters are non-empty by construction
        let (side, stats) = best.unwrap_or((TeamSide::Team1, &self.team1.players[0]));
        MvpRecord::from_ledger(stats, side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, Position, PossessionResult};
    use random::ScriptedRandom;

    fn roster(prefix: &str, size: usize, ppg: f64) -> Team {
        let players = (0..size)
            .map(|i| {
                let position = Position::ALL[i % 5];
                Player::new(format!("{}-{}", prefix, i), format!("{} Player {}", prefix, i), position)
                    .with_averages(ppg, 5.0, 3.0)
            })
            .collect();
        Team::new(prefix, format!("{} Club", prefix), players)
    }

    fn strong_roster() -> Team {
        let players = (0..10)
            .map(|i| {
                Player::new(format!("s{}", i), format!("Star {}", i), Position::ALL[i % 5])
                    .with_averages(27.0, 8.0, 7.0)
                    .with_shooting(0.55, 0.42, 0.88)
            })
            .collect();
        Team::new("strong", "Strong", players)
    }

    fn weak_roster() -> Team {
        let players = (0..10)
            .map(|i| {
                Player::new(format!("w{}", i), format!("Scrub {}", i), Position::ALL[i % 5])
                    .with_averages(8.0, 3.0, 1.0)
                    .with_shooting(0.38, 0.28, 0.60)
            })
            .collect();
        Team::new("weak", "Weak", players)
    }

    fn check_invariants(result: &MatchResult) {
        assert_ne!(result.team1_score, result.team2_score);

        let q1: u32 = result.quarters.iter().map(|q| q.team1_score).sum();
        let q2: u32 = result.quarters.iter().map(|q| q.team2_score).sum();
        assert_eq!(result.team1_score, q1);
        assert_eq!(result.team2_score, q2);

        assert!(result.quarters.len() >= 4);
        for (i, quarter) in result.quarters.iter().enumerate() {
            assert_eq!(quarter.quarter, i as u32 + 1);
            let expected = if i < 4 {
                POSSESSIONS_PER_QUARTER
            } else {
                POSSESSIONS_PER_OVERTIME
            };
            assert_eq!(quarter.possessions.len(), expected);

            let t1: u32 = quarter
                .possessions
                .iter()
                .filter(|p| p.team == TeamSide::Team1)
                .map(|p| p.points)
                .sum();
            assert_eq!(quarter.team1_score, t1);
        }

        // every overtime was needed: scores were tied before each one
        let mut running = (0u32, 0u32);
        for quarter in &result.quarters {
            if quarter.is_overtime() {
                assert_eq!(running.0, running.1);
            }
            running.0 += quarter.team1_score;
            running.1 += quarter.team2_score;
        }

        let expected_winner = if result.team1_score > result.team2_score {
            TeamSide::Team1
        } else {
            TeamSide::Team2
        };
        assert_eq!(result.winner, expected_winner);

        for p in result.possessions() {
            if p.result == PossessionResult::Turnover {
                assert_eq!(p.points, 0);
            }
            assert!(p.points <= 3);
        }

        for stats in result.team1_box_score.iter().chain(result.team2_box_score.iter()) {
            assert!(stats.is_consistent(), "inconsistent ledger: {:?}", stats);
        }

        let box_points: u32 = result.team1_box_score.iter().map(|p| p.points).sum();
        assert_eq!(box_points, result.team1_score);
    }

    #[test]
    fn test_simulated_matches_hold_invariants() {
        for seed in 0..40 {
            let mut engine = SimulationEngine::new(roster("A", 10, 15.0), roster("B", 10, 15.0))
                .unwrap()
                .with_seed(seed);
            let result = engine.simulate_match();
            check_invariants(&result);
        }
    }

    #[test]
    fn test_unseeded_matches_hold_invariants() {
        for _ in 0..10 {
            let mut engine =
                SimulationEngine::new(roster("A", 7, 12.0), roster("B", 12, 12.0)).unwrap();
            check_invariants(&engine.simulate_match());
        }
    }

    #[test]
    fn test_minimal_five_man_rosters() {
        let mut engine = SimulationEngine::new(roster("A", 5, 10.0), roster("B", 5, 10.0)).unwrap();
        let result = engine.simulate_match();

        check_invariants(&result);
        assert_eq!(result.quarters.iter().filter(|q| q.quarter <= 4).count(), 4);
    }

    #[test]
    fn test_single_player_rosters() {
        let mut engine = SimulationEngine::new(roster("A", 1, 10.0), roster("B", 2, 10.0))
            .unwrap()
            .with_seed(5);
        check_invariants(&engine.simulate_match());
    }

    #[test]
    fn test_empty_roster_rejected() {
        let err = SimulationEngine::new(roster("A", 5, 10.0), Team::new("b", "Nobody", vec![]))
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::EmptyRoster { side: TeamSide::Team2, .. }));
        assert!(err.to_string().contains("Nobody"));
    }

    #[test]
    fn test_mvp_matches_ledger() {
        for seed in 100..120 {
            let mut engine = SimulationEngine::new(roster("A", 8, 14.0), roster("B", 8, 14.0))
                .unwrap()
                .with_seed(seed);
            let result = engine.simulate_match();

            let ledger = result
                .box_score(result.mvp.team)
                .iter()
                .find(|p| p.player_id == result.mvp.player_id)
                .expect("MVP must come from the reported side");
            assert_eq!(ledger.points, result.mvp.points);
            assert_eq!(ledger.rebounds, result.mvp.rebounds);
            assert_eq!(ledger.assists, result.mvp.assists);
        }
    }

    #[test]
    fn test_mvp_bar_ignores_defense_after_selection() {
        // Replays the selection rule on hand-built ledgers.
        let base = |name: &str| PlayerGameStats::new(&Player::new(name, name, Position::Center));

        let mut thief = base("thief");
        thief.points = 10;
        thief.steals = 5; // score 20, bar 10
        let mut scorer = base("scorer");
        scorer.points = 12; // score 12 > bar 10

        let mut engine = SimulationEngine::new(roster("A", 2, 10.0), roster("B", 1, 10.0)).unwrap();
        engine.team1.players = vec![thief, scorer];
        engine.team2.players = vec![base("idle")];

        let mvp = engine.compute_mvp();
        assert_eq!(mvp.player_name, "scorer");
        assert_eq!(mvp.team, TeamSide::Team1);
    }

    #[test]
    fn test_mvp_all_zero_falls_back_to_first_player() {
        let engine = SimulationEngine::new(roster("A", 3, 10.0), roster("B", 3, 10.0)).unwrap();
        let mvp = engine.compute_mvp();
        assert_eq!(mvp.player_name, "A Player 0");
        assert_eq!(mvp.points, 0);
    }

    #[test]
    fn test_strong_roster_wins_majority() {
        let mut strong_wins = 0;
        for _ in 0..50 {
            let mut engine = SimulationEngine::new(strong_roster(), weak_roster()).unwrap();
            if engine.simulate_match().winner == TeamSide::Team1 {
                strong_wins += 1;
            }
        }
        assert!(strong_wins > 35, "strong roster only won {} of 50", strong_wins);
    }

    #[test]
    fn test_team_stats_after_simulation() {
        let mut engine = SimulationEngine::new(roster("A", 10, 18.0), roster("B", 10, 11.0))
            .unwrap()
            .with_seed(77);
        let result = engine.simulate_match();

        for side in [TeamSide::Team1, TeamSide::Team2] {
            let stats = engine.team_stats(side);
            assert!((0.0..=1.0).contains(&stats.field_goal_percentage));
            assert!((0.0..=1.0).contains(&stats.three_point_percentage));
            assert!((0.0..=1.0).contains(&stats.free_throw_percentage));
            assert_eq!(stats.points, result.score(side));
            assert_eq!(engine.player_stats(side), result.box_score(side));
        }
    }

    #[test]
    fn test_engine_resets_between_runs() {
        let mut engine = SimulationEngine::new(roster("A", 6, 12.0), roster("B", 6, 12.0))
            .unwrap()
            .with_seed(3);
        engine.simulate_match();
        let second = engine.simulate_match();

        assert_eq!(engine.team_stats(TeamSide::Team1).points, second.team1_score);
        check_invariants(&second);
    }

    #[test]
    fn test_same_seed_same_match() {
        let play = |seed| {
            SimulationEngine::new(roster("A", 10, 15.0), roster("B", 10, 15.0))
                .unwrap()
                .with_seed(seed)
                .simulate_match()
        };
        let a = play(21);
        let b = play(21);

        assert_eq!(a.team1_score, b.team1_score);
        assert_eq!(a.team2_score, b.team2_score);
        assert_eq!(a.quarters, b.quarters);
    }

    #[test]
    fn test_template_highlights_attached() {
        let mut engine = SimulationEngine::new(roster("A", 10, 15.0), roster("B", 10, 15.0))
            .unwrap()
            .with_seed(8);
        let result = engine.simulate_match();

        let highlights = result.highlights.expect("template highlights always attach");
        assert!(!highlights.narrative.is_empty());
        assert!(!highlights.summary.is_empty());
        assert!(highlights.moments.len() <= 8);
    }

    #[test]
    fn test_scripted_source_decides_regulation() {
        // Team1 opens the first quarter with a made jumper, then every draw
        // is 0.99 and nobody scores again.
        let prefix = [
            0.1, // coin flip -> team1
            0.0, 0.0, 0.0, 0.0, 0.0, // lineup
            0.0,  // handler
            0.5,  // no turnover
            0.9,  // mid-range
            0.5,  // noise
            0.0,  // make
            0.99, // no assist
        ];
        let rng = ScriptedRandom::new(&prefix).with_fallback(0.99);
        let mut engine = SimulationEngine::new(roster("A", 5, 10.0), roster("B", 5, 10.0))
            .unwrap()
            .with_random_source(rng);
        let result = engine.simulate_match();

        assert_eq!(result.team1_score, 2);
        assert_eq!(result.team2_score, 0);
        assert_eq!(result.quarters.len(), 4);
        assert_eq!(result.winner, TeamSide::Team1);
    }

    // With one-player rosters and 0.99 draws every possession is a miss that
    // costs 8 draws: lineup, handler, turnover, shot type, noise, make,
    // rebound side, rebounder. Each period adds one coin flip.
    const DRAWS_PER_MISS: usize = 8;

    fn scoreless_periods(possessions: &[usize]) -> Vec<f64> {
        let draws: usize = possessions.iter().map(|n| 1 + n * DRAWS_PER_MISS).sum();
        vec![0.99; draws]
    }

    /// Coin flip to team1, then a made mid-range jumper with no assist.
    fn team1_opening_basket() -> [f64; 8] {
        [0.1, 0.0, 0.0, 0.99, 0.9, 0.5, 0.0, 0.99]
    }

    #[test]
    fn test_tied_regulation_goes_to_overtime() {
        let mut draws = scoreless_periods(&[POSSESSIONS_PER_QUARTER; 4]);
        draws.extend(team1_opening_basket());

        let rng = ScriptedRandom::new(&draws).with_fallback(0.99);
        let mut engine = SimulationEngine::new(roster("A", 1, 10.0), roster("B", 1, 10.0))
            .unwrap()
            .with_random_source(rng);
        let result = engine.simulate_match();

        assert_eq!(result.quarters.len(), 5);
        assert!(result.quarters[..4]
            .iter()
            .all(|q| q.team1_score == 0 && q.team2_score == 0));

        let overtime = &result.quarters[4];
        assert_eq!(overtime.quarter, 5);
        assert!(overtime.is_overtime());
        assert_eq!(overtime.possessions.len(), POSSESSIONS_PER_OVERTIME);
        assert_eq!(overtime.team1_score, 2);
        assert_eq!(overtime.team2_score, 0);
        assert_eq!(overtime.possessions[0].clock, "12:00");

        assert_eq!(result.team1_score, 2);
        assert_eq!(result.team2_score, 0);
        assert_eq!(result.winner, TeamSide::Team1);
        assert_eq!(result.overtime_periods(), 1);
        check_invariants(&result);
    }

    #[test]
    fn test_tied_overtime_plays_another_period() {
        let mut draws = scoreless_periods(&[
            POSSESSIONS_PER_QUARTER,
            POSSESSIONS_PER_QUARTER,
            POSSESSIONS_PER_QUARTER,
            POSSESSIONS_PER_QUARTER,
            POSSESSIONS_PER_OVERTIME,
        ]);
        draws.extend(team1_opening_basket());

        let rng = ScriptedRandom::new(&draws).with_fallback(0.99);
        let mut engine = SimulationEngine::new(roster("A", 1, 10.0), roster("B", 1, 10.0))
            .unwrap()
            .with_random_source(rng);
        let result = engine.simulate_match();

        assert_eq!(result.quarters.len(), 6);
        let first_overtime = &result.quarters[4];
        assert_eq!(first_overtime.possessions.len(), POSSESSIONS_PER_OVERTIME);
        assert_eq!(first_overtime.team1_score, first_overtime.team2_score);

        let second_overtime = &result.quarters[5];
        assert_eq!(second_overtime.quarter, 6);
        assert_eq!(second_overtime.possessions.len(), POSSESSIONS_PER_OVERTIME);
        assert_eq!(second_overtime.team1_score, 2);

        assert_eq!(result.winner, TeamSide::Team1);
        assert_eq!(result.overtime_periods(), 2);
        check_invariants(&result);
    }
}

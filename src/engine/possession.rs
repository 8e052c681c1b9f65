//! Possession resolution.
//!
//! One call to [`PossessionResolver::resolve`] plays one offensive trip:
//! lineup, ball handler, turnover check, shot selection, make/miss, assist
//! and rebound. Ledgers are mutated in place and a single [`Possession`]
//! event is returned.

use tracing::debug;

use super::random::{chance, pick_index, weighted_index, RandomSource};
use super::QUARTER_SECONDS;
use crate::models::{
    format_clock, Player, PlayerGameStats, Position, Possession, PossessionResult, ShotType, Team,
    TeamSide,
};

pub const LINEUP_SIZE: usize = 5;

const TURNOVER_RATE: f64 = 0.15;
const ASSIST_RATE: f64 = 0.40;
const DEFENSIVE_REBOUND_RATE: f64 = 0.70;
const SHOT_NOISE: f64 = 0.05;
const MIN_SUCCESS_RATE: f64 = 0.10;
const MAX_SUCCESS_RATE: f64 = 0.95;

/// A roster together with its in-game ledgers, index-aligned with `team.players`.
#[derive(Debug, Clone)]
pub struct TeamLedger {
    pub team: Team,
    pub players: Vec<PlayerGameStats>,
}

impl TeamLedger {
    pub fn new(team: Team) -> Self {
        let players = team.players.iter().map(PlayerGameStats::new).collect();
        Self { team, players }
    }

    /// Zero every ledger.
    pub fn reset(&mut self) {
        self.players = self.team.players.iter().map(PlayerGameStats::new).collect();
    }

    fn name_of(&self, index: usize) -> &str {
        &self.team.players[index].name
    }
}

/// Where a possession sits in the game.
#[derive(Debug, Clone, Copy)]
pub struct PossessionSlot {
    pub offense: TeamSide,
    pub quarter: u32,
    /// 0-based ordinal within the period
    pub index: usize,
    pub possessions_in_period: usize,
}

impl PossessionSlot {
    /// Game clock for this ordinal, counting down from 12:00.
    pub fn clock(&self) -> String {
        let per_possession = QUARTER_SECONDS as f64 / self.possessions_in_period.max(1) as f64;
        let remaining = (QUARTER_SECONDS as f64 - self.index as f64 * per_possession).max(0.0);
        format_clock(remaining.floor() as u32)
    }
}

pub struct PossessionResolver<'r, R: RandomSource + ?Sized> {
    rng: &'r mut R,
}

impl<'r, R: RandomSource + ?Sized> PossessionResolver<'r, R> {
    pub fn new(rng: &'r mut R) -> Self {
        Self { rng }
    }

    /// Play one possession for `offense` against `defense`.
    pub fn resolve(
        &mut self,
        offense: &mut TeamLedger,
        defense: &mut TeamLedger,
        slot: PossessionSlot,
    ) -> Possession {
        let clock = slot.clock();
        let lineup = self.select_lineup(&offense.team);
        let handler = self.select_ball_handler(&offense.team, &lineup);
        let handler_name = offense.name_of(handler).to_string();

        let mut possession = Possession {
            team: slot.offense,
            quarter: slot.quarter,
            clock,
            player: handler_name.clone(),
            action: String::new(),
            points: 0,
            result: PossessionResult::Missed,
            shot_type: None,
            assisted_by: None,
            stolen_by: None,
            rebounded_by: None,
        };

        if chance(self.rng, TURNOVER_RATE) {
            offense.players[handler].turnovers += 1;

            let stealer = pick_index(self.rng, defense.team.players.len());
            if let Some(stealer) = stealer {
                defense.players[stealer].steals += 1;
                let stealer_name = defense.name_of(stealer).to_string();
                possession.action = format!("Turnover by {} - stolen by {}", handler_name, stealer_name);
                possession.stolen_by = Some(stealer_name);
            } else {
                possession.action = format!("Turnover by {}", handler_name);
            }
            possession.result = PossessionResult::Turnover;

            debug!(quarter = slot.quarter, clock = %possession.clock, "{}", possession.action);
            return possession;
        }

        let shooter = &offense.team.players[handler];
        let shot = self.determine_shot_type(shooter);
        let rate = self.adjusted_success_rate(shooter, shot);
        possession.shot_type = Some(shot);

        if chance(self.rng, rate) {
            let points = match shot {
                ShotType::FreeThrow if chance(self.rng, rate) => 2,
                ShotType::FreeThrow => 1,
                other => other.point_value(),
            };
            offense.players[handler].record_make(shot, points);
            possession.points = points;

            if chance(self.rng, ASSIST_RATE) {
                let teammates: Vec<usize> = lineup.iter().copied().filter(|&i| i != handler).collect();
                if let Some(pick) = pick_index(self.rng, teammates.len()) {
                    let assister = teammates[pick];
                    offense.players[assister].assists += 1;
                    possession.assisted_by = Some(offense.name_of(assister).to_string());
                }
            }

            possession.result = match shot {
                ShotType::FreeThrow => PossessionResult::Foul,
                _ => PossessionResult::Made,
            };
            possession.action = match shot {
                ShotType::FreeThrow => format!("{} makes {} of 2 free throws", handler_name, points),
                ShotType::ThreePointer => format!("{} drains a three-pointer", handler_name),
                ShotType::Layup => format!("{} finishes the layup", handler_name),
                ShotType::MidRange => format!("{} hits a mid-range jumper", handler_name),
            };
            if let Some(assister) = &possession.assisted_by {
                possession.action.push_str(&format!(" (assist: {})", assister));
            }
        } else {
            offense.players[handler].record_miss(shot);

            possession.result = match shot {
                ShotType::FreeThrow => PossessionResult::Foul,
                _ => PossessionResult::Missed,
            };
            possession.action = match shot {
                ShotType::FreeThrow => format!("{} misses both free throws", handler_name),
                other => format!("{} misses the {}", handler_name, other.label()),
            };

            let defense_rebounds = chance(self.rng, DEFENSIVE_REBOUND_RATE);
            let rebound = if defense_rebounds {
                self.select_rebounder(defense, offense)
            } else {
                self.select_rebounder(offense, defense)
            };
            if let Some(name) = rebound {
                possession.action.push_str(&format!(" (rebound: {})", name));
                possession.rebounded_by = Some(name);
            }
        }

        debug_assert!(offense.players[handler].is_consistent());
        debug!(
            quarter = slot.quarter,
            clock = %possession.clock,
            points = possession.points,
            "{}",
            possession.action
        );
        possession
    }

    /// One player per position where the roster has one, then random fill.
    pub fn select_lineup(&mut self, team: &Team) -> Vec<usize> {
        let mut lineup = Vec::with_capacity(LINEUP_SIZE);

        for position in Position::ALL {
            let candidates: Vec<usize> = team
                .players
                .iter()
                .enumerate()
                .filter(|(_, p)| p.position == position)
                .map(|(i, _)| i)
                .collect();
            if let Some(pick) = pick_index(self.rng, candidates.len()) {
                lineup.push(candidates[pick]);
            }
        }

        let mut remaining: Vec<usize> = (0..team.players.len())
            .filter(|i| !lineup.contains(i))
            .collect();
        while lineup.len() < LINEUP_SIZE {
            match pick_index(self.rng, remaining.len()) {
                Some(pick) => lineup.push(remaining.remove(pick)),
                None => break,
            }
        }

        lineup
    }

    /// Weighted toward scorers and playmakers, guards boosted.
    pub fn select_ball_handler(&mut self, team: &Team, lineup: &[usize]) -> usize {
        let weights: Vec<f64> = lineup
            .iter()
            .map(|&i| {
                let p = &team.players[i];
                let base = p.points_per_game + 2.0 * p.assists_per_game;
                match p.position {
                    Position::PointGuard => base * 1.5,
                    Position::ShootingGuard => base * 1.2,
                    _ => base,
                }
            })
            .collect();

        weighted_index(self.rng, &weights)
            .map(|pick| lineup[pick])
            .unwrap_or(0)
    }

    /// Thresholds are absolute cut points on a single draw, checked in order.
    pub fn determine_shot_type(&mut self, shooter: &Player) -> ShotType {
        let roll = self.rng.next_f64();

        let three_cut = if shooter.three_point_percentage > 0.35 {
            0.35
        } else {
            0.20
        };
        let layup_cut = if shooter.position.is_big() { 0.50 } else { 0.30 };

        if roll < 0.05 {
            ShotType::FreeThrow
        } else if roll < three_cut {
            ShotType::ThreePointer
        } else if roll < layup_cut {
            ShotType::Layup
        } else {
            ShotType::MidRange
        }
    }

    /// Base rate plus uniform noise, clamped.
    pub fn adjusted_success_rate(&mut self, shooter: &Player, shot: ShotType) -> f64 {
        let noise = (self.rng.next_f64() * 2.0 - 1.0) * SHOT_NOISE;
        (base_success_rate(shooter, shot) + noise).clamp(MIN_SUCCESS_RATE, MAX_SUCCESS_RATE)
    }

    /// Weighted by rebounding average, bigs boosted. An empty roster hands
    /// the board to a random player of the other team.
    fn select_rebounder(&mut self, team: &mut TeamLedger, other: &mut TeamLedger) -> Option<String> {
        if team.team.players.is_empty() {
            let pick = pick_index(self.rng, other.team.players.len())?;
            other.players[pick].rebounds += 1;
            return Some(other.name_of(pick).to_string());
        }

        let weights: Vec<f64> = team
            .team
            .players
            .iter()
            .map(|p| match p.position {
                Position::Center => p.rebounds_per_game * 1.5,
                Position::PowerForward => p.rebounds_per_game * 1.3,
                _ => p.rebounds_per_game,
            })
            .collect();

        let pick = weighted_index(self.rng, &weights)?;
        team.players[pick].rebounds += 1;
        Some(team.name_of(pick).to_string())
    }
}

/// Season rate for a shot type. Zero or invalid rates use league defaults.
pub fn base_success_rate(shooter: &Player, shot: ShotType) -> f64 {
    let or_default = |value: f64, default: f64| {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            default
        }
    };

    match shot {
        ShotType::ThreePointer => or_default(shooter.three_point_percentage, 0.33),
        ShotType::Layup => {
            if shooter.field_goal_percentage.is_finite() && shooter.field_goal_percentage > 0.0 {
                (shooter.field_goal_percentage + 0.15).min(0.75)
            } else {
                0.6
            }
        }
        ShotType::MidRange => or_default(shooter.field_goal_percentage, 0.45),
        ShotType::FreeThrow => or_default(shooter.free_throw_percentage, 0.75),
    }
}

//! Key-moment detection.
//!
//! Scans a finished [`MatchResult`] for:
//! - Scoring runs within a quarter
//! - Made three-pointers
//! - Steal-then-score momentum swings
//! - Individual scoring milestones
//! - Comebacks from double-digit deficits
//! - Clutch scores in the last 30 seconds of the fourth quarter
//!
//! Moments come back ordered forward in game time.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::models::{GameMoment, Importance, MatchResult, MomentType, Possession, QuarterStats, TeamSide};

pub const RUN_THRESHOLD: u32 = 8;
pub const BIG_RUN_THRESHOLD: u32 = 12;
pub const COMEBACK_DEFICIT: u32 = 10;

const RUN_LOOKBACK: usize = 5;
const MAX_RUN_SCORERS: usize = 5;
const CLUTCH_QUARTER: u32 = 4;
const CLUTCH_SHOT_SECONDS: u32 = 30;
const MILESTONES: [(u32, Importance); 3] = [
    (20, Importance::Low),
    (30, Importance::Medium),
    (40, Importance::High),
];

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("match has no quarters to scan")]
    NoQuarters,
}

/// Detect every key moment in a finished match.
pub fn detect_moments(result: &MatchResult) -> Result<Vec<GameMoment>, HighlightError> {
    if result.quarters.is_empty() {
        return Err(HighlightError::NoQuarters);
    }

    let mut moments = Vec::new();
    let mut milestones = MilestoneTracker::default();

    for quarter in &result.quarters {
        scan_quarter(result, quarter, &mut milestones, &mut moments);
    }

    moments.extend(detect_comeback(result));
    moments.extend(detect_clutch(result));

    moments.sort_by_key(|m| m.chronological_key());
    debug!("Detected {} moments", moments.len());
    Ok(moments)
}

/// Unanswered points by whichever team scored last.
#[derive(Debug, Default)]
struct RunTracker {
    side: Option<TeamSide>,
    points: u32,
}

impl RunTracker {
    fn add(&mut self, side: TeamSide, points: u32) -> u32 {
        if self.side == Some(side) {
            self.points += points;
        } else {
            self.side = Some(side);
            self.points = points;
        }
        self.points
    }

    fn reset(&mut self) {
        self.side = None;
        self.points = 0;
    }
}

/// Running point totals per player across the whole game.
#[derive(Debug, Default)]
struct MilestoneTracker {
    points: HashMap<(TeamSide, String), u32>,
}

impl MilestoneTracker {
    /// Record a score, returning the highest milestone newly crossed.
    fn add(&mut self, possession: &Possession) -> Option<(u32, Importance)> {
        let total = self
            .points
            .entry((possession.team, possession.player.clone()))
            .or_insert(0);
        let before = *total;
        *total += possession.points;
        let after = *total;

        MILESTONES
            .iter()
            .rev()
            .find(|(threshold, _)| before < *threshold && after >= *threshold)
            .copied()
    }
}

fn scan_quarter(
    result: &MatchResult,
    quarter: &QuarterStats,
    milestones: &mut MilestoneTracker,
    moments: &mut Vec<GameMoment>,
) {
    let mut run = RunTracker::default();
    let possessions = &quarter.possessions;

    for (i, possession) in possessions.iter().enumerate() {
        let team_name = &result.team(possession.team).name;

        if possession.is_score() {
            let run_points = run.add(possession.team, possession.points);
            if run_points >= RUN_THRESHOLD {
                moments.push(GameMoment {
                    quarter: possession.quarter,
                    clock: possession.clock.clone(),
                    description: format!("{} goes on a {}-0 run", team_name, run_points),
                    importance: if run_points >= BIG_RUN_THRESHOLD {
                        Importance::High
                    } else {
                        Importance::Medium
                    },
                    moment_type: MomentType::Run,
                    team: Some(possession.team),
                    players: run_scorers(&possessions[..=i], possession.team),
                });
                run.reset();
            }

            if let Some((threshold, importance)) = milestones.add(possession) {
                moments.push(GameMoment {
                    quarter: possession.quarter,
                    clock: possession.clock.clone(),
                    description: format!("{} reaches {} points", possession.player, threshold),
                    importance,
                    moment_type: MomentType::Milestone,
                    team: Some(possession.team),
                    players: vec![possession.player.clone()],
                });
            }
        }

        if possession.is_made_three() {
            moments.push(GameMoment {
                quarter: possession.quarter,
                clock: possession.clock.clone(),
                description: format!("{} drains a three-pointer for {}", possession.player, team_name),
                importance: Importance::Medium,
                moment_type: MomentType::HighlightPlay,
                team: Some(possession.team),
                players: vec![possession.player.clone()],
            });
        }

        if let (Some(stealer), Some(next)) = (&possession.stolen_by, possessions.get(i + 1)) {
            if next.is_score() && next.team != possession.team {
                moments.push(GameMoment {
                    quarter: next.quarter,
                    clock: next.clock.clone(),
                    description: format!(
                        "{} picks off {} and {} scores at the other end",
                        stealer, possession.player, next.player
                    ),
                    importance: Importance::Medium,
                    moment_type: MomentType::MomentumSwing,
                    team: Some(next.team),
                    players: vec![stealer.clone(), next.player.clone()],
                });
            }
        }
    }
}

/// Distinct scorers for `side` among the trailing possessions.
fn run_scorers(possessions: &[Possession], side: TeamSide) -> Vec<String> {
    let start = possessions.len().saturating_sub(RUN_LOOKBACK);
    let mut scorers: Vec<String> = Vec::new();

    for possession in &possessions[start..] {
        if possession.team == side
            && possession.is_score()
            && !scorers.contains(&possession.player)
            && scorers.len() < MAX_RUN_SCORERS
        {
            scorers.push(possession.player.clone());
        }
    }

    scorers
}

/// Largest lead after any quarter, blown by the team holding it.
fn detect_comeback(result: &MatchResult) -> Option<GameMoment> {
    let mut team1_total: i64 = 0;
    let mut team2_total: i64 = 0;
    let mut largest_lead: u32 = 0;
    let mut leader: Option<TeamSide> = None;

    for quarter in &result.quarters {
        team1_total += quarter.team1_score as i64;
        team2_total += quarter.team2_score as i64;

        let lead = (team1_total - team2_total).unsigned_abs() as u32;
        if lead > largest_lead {
            largest_lead = lead;
            leader = Some(if team1_total > team2_total {
                TeamSide::Team1
            } else {
                TeamSide::Team2
            });
        }
    }

    let leader = leader?;
    if largest_lead < COMEBACK_DEFICIT || leader == result.winner {
        return None;
    }

    Some(GameMoment {
        quarter: CLUTCH_QUARTER,
        clock: "0:00".to_string(),
        description: format!(
            "{} erases a {}-point deficit to beat {}",
            result.winning_team().name,
            largest_lead,
            result.losing_team().name
        ),
        importance: Importance::High,
        moment_type: MomentType::Comeback,
        team: Some(result.winner),
        players: Vec::new(),
    })
}

/// Fourth-quarter scores inside the final 30 seconds.
fn detect_clutch(result: &MatchResult) -> Vec<GameMoment> {
    result
        .quarters
        .iter()
        .filter(|q| q.quarter == CLUTCH_QUARTER)
        .flat_map(|q| q.possessions.iter())
        .filter(|p| p.is_score() && p.seconds_remaining() <= CLUTCH_SHOT_SECONDS)
        .map(|p| GameMoment {
            quarter: p.quarter,
            clock: p.clock.clone(),
            description: format!(
                "{} comes up clutch with {} points at {} of the fourth",
                p.player, p.points, p.clock
            ),
            importance: Importance::High,
            moment_type: MomentType::ClutchShot,
            team: Some(p.team),
            players: vec![p.player.clone()],
        })
        .collect()
}

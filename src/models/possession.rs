//! Play-by-play events and quarter summaries.

use serde::{Deserialize, Serialize};

/// Which of the two teams in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Team1,
    Team2,
}

impl TeamSide {
    pub fn opponent(&self) -> TeamSide {
        match self {
            TeamSide::Team1 => TeamSide::Team2,
            TeamSide::Team2 => TeamSide::Team1,
        }
    }
}

impl std::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamSide::Team1 => write!(f, "team1"),
            TeamSide::Team2 => write!(f, "team2"),
        }
    }
}

impl std::str::FromStr for TeamSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "team1" | "1" => Ok(TeamSide::Team1),
            "team2" | "2" => Ok(TeamSide::Team2),
            other => Err(format!("unknown team side: {}", other)),
        }
    }
}

/// Kind of shot attempted on a possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    /// A two-shot trip to the line
    FreeThrow,
    ThreePointer,
    Layup,
    MidRange,
}

impl ShotType {
    /// Points for a made shot (per free throw for a trip to the line).
    pub fn point_value(&self) -> u32 {
        match self {
            ShotType::FreeThrow => 1,
            ShotType::ThreePointer => 3,
            ShotType::Layup | ShotType::MidRange => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShotType::FreeThrow => "free throws",
            ShotType::ThreePointer => "three-pointer",
            ShotType::Layup => "layup",
            ShotType::MidRange => "mid-range jumper",
        }
    }
}

/// Outcome tag of a possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PossessionResult {
    Made,
    Missed,
    Turnover,
    /// Shooting foul; the possession ends at the free-throw line
    Foul,
}

impl std::fmt::Display for PossessionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PossessionResult::Made => write!(f, "made"),
            PossessionResult::Missed => write!(f, "missed"),
            PossessionResult::Turnover => write!(f, "turnover"),
            PossessionResult::Foul => write!(f, "foul"),
        }
    }
}

/// One resolved offensive trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Possession {
    pub team: TeamSide,
    pub quarter: u32,

    /// Time left in the quarter, `M:SS`
    pub clock: String,

    /// Ball handler / shooter
    pub player: String,

    pub action: String,
    pub points: u32,
    pub result: PossessionResult,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_type: Option<ShotType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assisted_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stolen_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebounded_by: Option<String>,
}

impl Possession {
    pub fn is_score(&self) -> bool {
        self.points > 0
    }

    pub fn is_made_three(&self) -> bool {
        self.result == PossessionResult::Made && self.shot_type == Some(ShotType::ThreePointer)
    }

    pub fn seconds_remaining(&self) -> u32 {
        parse_clock(&self.clock).unwrap_or(0)
    }
}

/// Scores and events for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterStats {
    /// 1–4 regulation, 5+ overtime
    pub quarter: u32,
    pub team1_score: u32,
    pub team2_score: u32,
    pub possessions: Vec<Possession>,
}

impl QuarterStats {
    /// Build a quarter summary, summing scores from its events.
    pub fn from_possessions(quarter: u32, possessions: Vec<Possession>) -> Self {
        let score_for = |side: TeamSide| {
            possessions
                .iter()
                .filter(|p| p.team == side)
                .map(|p| p.points)
                .sum()
        };

        Self {
            quarter,
            team1_score: score_for(TeamSide::Team1),
            team2_score: score_for(TeamSide::Team2),
            possessions,
        }
    }

    pub fn is_overtime(&self) -> bool {
        self.quarter > 4
    }

    pub fn score(&self, side: TeamSide) -> u32 {
        match side {
            TeamSide::Team1 => self.team1_score,
            TeamSide::Team2 => self.team2_score,
        }
    }

    /// Display label: "Q3", "OT", "2OT".
    pub fn label(&self) -> String {
        match self.quarter {
            q if q <= 4 => format!("Q{}", q),
            5 => "OT".to_string(),
            q => format!("{}OT", q - 4),
        }
    }
}

/// Format seconds as `M:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Parse an `M:SS` clock into seconds.
pub fn parse_clock(clock: &str) -> Option<u32> {
    let (minutes, seconds) = clock.trim().split_once(':')?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(minutes * 60 + seconds)
}

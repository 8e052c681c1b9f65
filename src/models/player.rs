//! Roster inputs: players, positions and teams.

use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use super::{PlayerId, TeamId};

/// Court position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Position {
    #[serde(rename = "PG")]
    PointGuard,
    #[serde(rename = "SG")]
    ShootingGuard,
    #[default]
    #[serde(rename = "SF")]
    SmallForward,
    #[serde(rename = "PF")]
    PowerForward,
    #[serde(rename = "C")]
    Center,
}

impl Position {
    /// Positions in the order a lineup is filled.
    pub const ALL: [Position; 5] = [
        Position::PointGuard,
        Position::ShootingGuard,
        Position::SmallForward,
        Position::PowerForward,
        Position::Center,
    ];

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }

    /// Frontcourt bigs get more layups and rebounds.
    pub fn is_big(&self) -> bool {
        matches!(self, Position::PowerForward | Position::Center)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "pg" | "point guard" => Ok(Position::PointGuard),
            "sg" | "shooting guard" => Ok(Position::ShootingGuard),
            "sf" | "small forward" => Ok(Position::SmallForward),
            "pf" | "power forward" => Ok(Position::PowerForward),
            "c" | "center" | "centre" => Ok(Position::Center),
            other => Err(format!("unknown position: {}", other)),
        }
    }
}

impl TryFrom<String> for Position {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn default_points() -> f64 {
    10.0
}

fn default_rebounds() -> f64 {
    5.0
}

fn default_assists() -> f64 {
    3.0
}

fn default_steals() -> f64 {
    1.0
}

fn default_blocks() -> f64 {
    0.5
}

fn default_field_goal_pct() -> f64 {
    0.45
}

fn default_three_point_pct() -> f64 {
    0.35
}

fn default_free_throw_pct() -> f64 {
    0.75
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Per-stat `deserialize_with` fns mapping `null` to the stat's default.
macro_rules! nullable_stat {
    ($($name:ident => $default:ident),* $(,)?) => {
        $(
            fn $name<'de, D>(deserializer: D) -> Result<f64, D::Error>
            where
                D: Deserializer<'de>,
            {
                Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_else($default))
            }
        )*
    };
}

nullable_stat! {
    points_or_default => default_points,
    rebounds_or_default => default_rebounds,
    assists_or_default => default_assists,
    steals_or_default => default_steals,
    blocks_or_default => default_blocks,
    field_goal_pct_or_default => default_field_goal_pct,
    three_point_pct_or_default => default_three_point_pct,
    free_throw_pct_or_default => default_free_throw_pct,
}

/// A player's identity and season averages.
///
/// Every rate has a default so partially populated roster entries still
/// simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: PlayerId,

    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub position: Position,

    #[serde(default = "default_points", deserialize_with = "points_or_default")]
    pub points_per_game: f64,

    #[serde(default = "default_rebounds", deserialize_with = "rebounds_or_default")]
    pub rebounds_per_game: f64,

    #[serde(default = "default_assists", deserialize_with = "assists_or_default")]
    pub assists_per_game: f64,

    #[serde(default = "default_steals", deserialize_with = "steals_or_default")]
    pub steals_per_game: f64,

    #[serde(default = "default_blocks", deserialize_with = "blocks_or_default")]
    pub blocks_per_game: f64,

    /// Field-goal percentage in [0, 1]
    #[serde(
        default = "default_field_goal_pct",
        deserialize_with = "field_goal_pct_or_default"
    )]
    pub field_goal_percentage: f64,

    /// Three-point percentage in [0, 1]
    #[serde(
        default = "default_three_point_pct",
        deserialize_with = "three_point_pct_or_default"
    )]
    pub three_point_percentage: f64,

    /// Free-throw percentage in [0, 1]
    #[serde(
        default = "default_free_throw_pct",
        deserialize_with = "free_throw_pct_or_default"
    )]
    pub free_throw_percentage: f64,
}

impl Player {
    /// Create a player with league-average defaults for every rate.
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            points_per_game: default_points(),
            rebounds_per_game: default_rebounds(),
            assists_per_game: default_assists(),
            steals_per_game: default_steals(),
            blocks_per_game: default_blocks(),
            field_goal_percentage: default_field_goal_pct(),
            three_point_percentage: default_three_point_pct(),
            free_throw_percentage: default_free_throw_pct(),
        }
    }

    /// Builder method to set the per-game counting stats.
    pub fn with_averages(mut self, points: f64, rebounds: f64, assists: f64) -> Self {
        self.points_per_game = points;
        self.rebounds_per_game = rebounds;
        self.assists_per_game = assists;
        self
    }

    /// Builder method to set the shooting splits.
    pub fn with_shooting(mut self, field_goal: f64, three_point: f64, free_throw: f64) -> Self {
        self.field_goal_percentage = field_goal;
        self.three_point_percentage = three_point;
        self.free_throw_percentage = free_throw;
        self
    }
}

/// A named roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: TeamId,

    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<Player>,
}

impl Team {
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>, players: Vec<Player>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            players,
        }
    }

    /// Fill in missing team and player IDs from their names.
    pub fn with_generated_ids(mut self) -> Self {
        if self.id.is_empty() {
            self.id = TeamId::generate(&[&self.name]);
        }
        for player in &mut self.players {
            if player.id.is_empty() {
                player.id = PlayerId::generate(&[self.id.as_str(), &player.name]);
            }
        }
        self
    }
}

//! Roster files.

use std::path::Path;

use tracing::{debug, warn};

use super::StorageError;
use crate::models::Team;

/// Load a team from a JSON roster file, filling in missing IDs.
pub fn load_team(path: &Path) -> Result<Team, StorageError> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.display().to_string()));
    }

    let contents = std::fs::read_to_string(path)?;
    let team: Team = serde_json::from_str(&contents)?;
    let team = team.with_generated_ids();

    if team.players.is_empty() {
        warn!("Roster {} has no players", path.display());
    }
    debug!("Loaded {} ({} players) from {}", team.name, team.players.len(), path.display());

    Ok(team)
}

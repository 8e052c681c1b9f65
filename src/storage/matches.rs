//! Match store: one [`MatchRecord`] per line.

use std::sync::Mutex;

use tracing::info;

use super::jsonl::{JsonlReader, JsonlWriter};
use super::{StorageConfig, StorageError};
use crate::models::{MatchRecord, MatchResult};

/// Handle to the JSONL match log. Appends are serialized.
pub struct MatchStore {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl MatchStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Persist a finished match and return the stored record.
    pub fn save(&self, result: &MatchResult) -> Result<MatchRecord, StorageError> {
        let record = MatchRecord::from_result(result)?;

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        JsonlWriter::new(self.config.matches_path()).append(&record)?;

        info!(
            "Saved match {} ({} {}-{} {})",
            record.id, record.team1_name, record.team1_score, record.team2_score, record.team2_name
        );
        Ok(record)
    }

    /// All stored matches, newest first.
    pub fn list(&self) -> Result<Vec<MatchRecord>, StorageError> {
        let mut records = self.reader().read_all()?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub fn get(&self, id: &str) -> Result<MatchRecord, StorageError> {
        self.reader()
            .find(|r| r.id == id)?
            .ok_or_else(|| StorageError::NotFound(format!("match {}", id)))
    }

    fn reader(&self) -> JsonlReader<MatchRecord> {
        JsonlReader::new(self.config.matches_path())
    }
}

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::types::LogAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: LogAction,
    pub checkpoint_id: Option<String>,
    pub details: String,
}

/// Why a side-car state file could not be used.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no enforcement state file")]
    Missing,

    #[error("enforcement state file is empty")]
    Empty,

    #[error("malformed enforcement state: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// EngineState
// ---------------------------------------------------------------------------

/// Everything the engine persists for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub current_checkpoint_id: Option<String>,
    #[serde(default)]
    pub skipped_checkpoints: Vec<String>,
    #[serde(default)]
    pub enforcement_log: Vec<LogEntry>,
    pub checkpoints: Vec<Checkpoint>,
    pub last_updated: DateTime<Utc>,
}

impl EngineState {
    pub fn new(checkpoints: Vec<Checkpoint>) -> Self {
        Self {
            current_checkpoint_id: None,
            skipped_checkpoints: Vec::new(),
            enforcement_log: Vec::new(),
            checkpoints,
            last_updated: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(path: &Path) -> std::result::Result<Self, LoadError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(LoadError::Missing),
            Err(e) => return Err(LoadError::Io(e)),
        };
        if data.trim().is_empty() {
            return Err(LoadError::Empty);
        }
        let state: EngineState = serde_json::from_str(&data)?;
        Ok(state)
    }

    /// Trim the log to the newest `log_retention` entries, stamp
    /// `last_updated` and overwrite `path` as a whole.
    pub fn save(&mut self, path: &Path, log_retention: usize) -> Result<()> {
        if self.enforcement_log.len() > log_retention {
            self.enforcement_log
                .drain(..self.enforcement_log.len() - log_retention);
        }
        self.last_updated = Utc::now();
        let data = serde_json::to_string_pretty(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn record(&mut self, action: LogAction, checkpoint_id: Option<&str>, details: impl Into<String>) {
        self.enforcement_log.push(LogEntry {
            timestamp: Utc::now(),
            action,
            checkpoint_id: checkpoint_id.map(str::to_string),
            details: details.into(),
        });
    }

    /// Insert into the skipped set unless already present.
    pub fn defer(&mut self, id: &str) {
        if !self.skipped_checkpoints.iter().any(|s| s == id) {
            self.skipped_checkpoints.push(id.to_string());
        }
    }

    pub fn undefer(&mut self, id: &str) {
        self.skipped_checkpoints.retain(|s| s != id);
    }

    pub fn is_deferred(&self, id: &str) -> bool {
        self.skipped_checkpoints.iter().any(|s| s == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VerificationKind;
    use tempfile::TempDir;

    fn sample() -> EngineState {
        let mut first = Checkpoint::new("CP_000", "[PASS 1] brief", VerificationKind::Manual, None);
        first.mark_verified("pre-existing checkbox");
        let mut second = Checkpoint::new(
            "CP_001",
            "[PASS 1] build",
            VerificationKind::Command,
            Some("cargo build".to_string()),
        );
        second.dependencies.push("CP_000".to_string());
        second.attempt_count = 2;
        second.last_error = Some("exit code 101".to_string());
        let mut state = EngineState::new(vec![first, second]);
        state.current_checkpoint_id = Some("CP_001".to_string());
        state.record(LogAction::Generate, None, "2 checkpoints");
        state
    }

    #[test]
    fn json_uses_documented_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        for key in [
            "current_checkpoint_id",
            "skipped_checkpoints",
            "enforcement_log",
            "checkpoints",
            "last_updated",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        let entry = &json["enforcement_log"][0];
        for key in ["timestamp", "action", "checkpoint_id", "details"] {
            assert!(entry.get(key).is_some(), "missing log key {key}");
        }
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ENFORCEMENT_STATE.json");
        let mut state = sample();
        state.save(&path, 100).unwrap();

        let loaded = EngineState::load(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn save_keeps_newest_log_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let mut state = sample();
        for i in 0..150 {
            state.record(LogAction::Start, Some("CP_001"), format!("entry {i}"));
        }
        state.save(&path, 100).unwrap();

        let loaded = EngineState::load(&path).unwrap();
        assert_eq!(loaded.enforcement_log.len(), 100);
        assert_eq!(loaded.enforcement_log.last().unwrap().details, "entry 149");
        assert_eq!(loaded.enforcement_log[0].details, "entry 50");
    }

    #[test]
    fn missing_and_empty_are_distinguished() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let err = EngineState::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Missing));

        std::fs::write(&path, "  \n").unwrap();
        let err = EngineState::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }

    #[test]
    fn garbage_is_corrupt_not_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{\"checkpoints\": [").unwrap();
        let err = EngineState::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Corrupt(_)));
    }

    #[test]
    fn defer_is_idempotent() {
        let mut state = sample();
        state.defer("CP_001");
        state.defer("CP_001");
        assert_eq!(state.skipped_checkpoints, vec!["CP_001".to_string()]);
        assert!(state.is_deferred("CP_001"));
        state.undefer("CP_001");
        assert!(state.skipped_checkpoints.is_empty());
    }
}

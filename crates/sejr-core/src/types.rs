use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// CheckpointState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointState {
    Locked,
    Available,
    InProgress,
    PendingManualProof,
    Verified,
    Blocked,
    SkippedTemporary,
}

impl CheckpointState {
    pub fn all() -> &'static [CheckpointState] {
        &[
            CheckpointState::Locked,
            CheckpointState::Available,
            CheckpointState::InProgress,
            CheckpointState::PendingManualProof,
            CheckpointState::Verified,
            CheckpointState::Blocked,
            CheckpointState::SkippedTemporary,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointState::Locked => "locked",
            CheckpointState::Available => "available",
            CheckpointState::InProgress => "in_progress",
            CheckpointState::PendingManualProof => "pending_manual_proof",
            CheckpointState::Verified => "verified",
            CheckpointState::Blocked => "blocked",
            CheckpointState::SkippedTemporary => "skipped_temporary",
        }
    }

    /// States from which a checkpoint may be deferred with `skip`.
    pub fn is_skippable(self) -> bool {
        matches!(self, CheckpointState::Available | CheckpointState::InProgress)
    }
}

impl fmt::Display for CheckpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// VerificationKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    Command,
    FileExists,
    Manual,
}

impl VerificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationKind::Command => "command",
            VerificationKind::FileExists => "file_exists",
            VerificationKind::Manual => "manual",
        }
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LogAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Generate,
    Start,
    Verify,
    VerifyFailed,
    Skip,
    Archive,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_snake_case() {
        for state in CheckpointState::all() {
            let json = serde_json::to_string(state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }

    #[test]
    fn only_available_and_in_progress_are_skippable() {
        let skippable: Vec<_> = CheckpointState::all()
            .iter()
            .filter(|s| s.is_skippable())
            .collect();
        assert_eq!(
            skippable,
            vec![&CheckpointState::Available, &CheckpointState::InProgress]
        );
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&VerificationKind::FileExists).unwrap(),
            "\"file_exists\""
        );
        assert_eq!(VerificationKind::Command.to_string(), "command");
    }
}

use crate::types::{CheckpointState, VerificationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One gated unit of work derived from a checklist item.
///
/// `id`, `verification_kind` and `verification_target` are fixed at
/// generation time and only exposed through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    id: String,
    pub name: String,
    verification_kind: VerificationKind,
    #[serde(default)]
    verification_target: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub state: CheckpointState,
    #[serde(default)]
    pub proof: Option<String>,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub source_line: Option<usize>,
}

impl Checkpoint {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: VerificationKind,
        target: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            verification_kind: kind,
            verification_target: target,
            dependencies: Vec::new(),
            state: CheckpointState::Locked,
            proof: None,
            verified_at: None,
            attempt_count: 0,
            last_error: None,
            source_line: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn verification_kind(&self) -> VerificationKind {
        self.verification_kind
    }

    pub fn verification_target(&self) -> Option<&str> {
        self.verification_target.as_deref()
    }

    pub fn is_verified(&self) -> bool {
        self.state == CheckpointState::Verified
    }

    pub fn mark_verified(&mut self, proof: impl Into<String>) {
        self.state = CheckpointState::Verified;
        self.verified_at = Some(Utc::now());
        self.proof = Some(proof.into());
        self.last_error = None;
    }

    pub fn dependencies_met(&self, verified: &HashSet<&str>) -> bool {
        self.dependencies
            .iter()
            .all(|dep| verified.contains(dep.as_str()))
    }

    /// Dependencies that are not yet verified, in declaration order.
    pub fn unmet_dependencies<'a>(&'a self, verified: &HashSet<&str>) -> Vec<&'a str> {
        self.dependencies
            .iter()
            .filter(|dep| !verified.contains(dep.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Sequential checkpoint id: `CP_000`, `CP_001`, ...
pub fn checkpoint_id(index: usize) -> String {
    format!("CP_{index:03}")
}

// ---------------------------------------------------------------------------
// Slice helpers
// ---------------------------------------------------------------------------

pub fn verified_ids(checkpoints: &[Checkpoint]) -> HashSet<&str> {
    checkpoints
        .iter()
        .filter(|c| c.is_verified())
        .map(|c| c.id())
        .collect()
}

pub fn find<'a>(checkpoints: &'a [Checkpoint], id: &str) -> Option<&'a Checkpoint> {
    checkpoints.iter().find(|c| c.id == id)
}

pub fn find_mut<'a>(checkpoints: &'a mut [Checkpoint], id: &str) -> Option<&'a mut Checkpoint> {
    checkpoints.iter_mut().find(|c| c.id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The enforcement engine: one project's checkpoint chain plus the rules
//! for starting, verifying and skipping checkpoints.
//!
//! Every mutating operation ends by writing the whole state to the
//! project's side-car file. Expected failures (unknown id, unmet
//! dependency, failed verification) come back as an unsuccessful
//! [`ActionResult`]; `Err` is reserved for I/O and serialization problems.

use crate::checkpoint::{self, verified_ids, Checkpoint};
use crate::checklist;
use crate::config::EngineConfig;
use crate::error::{Result, SejrError};
use crate::paths;
use crate::scheduler::{Scheduler, Selection};
use crate::state::{EngineState, LoadError};
use crate::types::{CheckpointState, LogAction, VerificationKind};
use crate::verify::{self, VerificationOutcome, VerifyContext};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// How many outstanding checkpoints `can_archive` names before summarizing.
const ARCHIVE_LIST_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentCheckpoint {
    pub id: String,
    pub name: String,
    pub state: CheckpointState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub total: usize,
    pub verified: usize,
    pub remaining: usize,
    pub skipped: usize,
    pub progress_percent: u32,
    /// `None` once nothing is left to work on.
    pub current: Option<CurrentCheckpoint>,
    pub can_complete: bool,
    pub blocking_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveCheck {
    pub allowed: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub id: String,
    pub name: String,
    pub state: CheckpointState,
    pub verification: VerificationKind,
    /// 1-based line of the checklist item this checkpoint came from.
    pub line: Option<usize>,
    pub is_current: bool,
    pub is_skipped: bool,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Engine {
    project_dir: PathBuf,
    config: EngineConfig,
    state: EngineState,
}

impl Engine {
    /// Load the project's side-car state, or generate it from the checklist
    /// when no state file exists (or it is empty).
    ///
    /// A state file that exists but cannot be parsed is reported as
    /// [`SejrError::CorruptState`]; use [`Engine::regenerate`] to discard it.
    pub fn open(project_dir: impl Into<PathBuf>, config: &EngineConfig) -> Result<Self> {
        let project_dir = project_dir.into();
        let state_path = paths::state_path(&project_dir, config);

        match EngineState::load(&state_path) {
            Ok(state) => {
                tracing::debug!(
                    path = %state_path.display(),
                    checkpoints = state.checkpoints.len(),
                    "loaded enforcement state"
                );
                Ok(Self {
                    project_dir,
                    config: config.clone(),
                    state,
                })
            }
            Err(LoadError::Missing | LoadError::Empty) => Self::regenerate(project_dir, config),
            Err(LoadError::Corrupt(e)) => {
                tracing::warn!(path = %state_path.display(), error = %e, "corrupt enforcement state");
                Err(SejrError::CorruptState {
                    path: state_path,
                    reason: e.to_string(),
                })
            }
            Err(LoadError::Io(e)) => Err(e.into()),
        }
    }

    /// Generate a fresh checkpoint chain from the checklist and overwrite
    /// any existing state file.
    pub fn regenerate(project_dir: impl Into<PathBuf>, config: &EngineConfig) -> Result<Self> {
        let project_dir = project_dir.into();
        let checklist_path = paths::checklist_path(&project_dir, config);
        if !checklist_path.exists() {
            return Err(SejrError::ChecklistNotFound(checklist_path));
        }
        let document = std::fs::read_to_string(&checklist_path)?;
        let checkpoints = checklist::generate(&document, config);
        let count = checkpoints.len();

        let mut engine = Self {
            project_dir,
            config: config.clone(),
            state: EngineState::new(checkpoints),
        };
        engine.advance();
        engine.state.record(
            LogAction::Generate,
            None,
            format!("generated {count} checkpoints from {}", config.checklist_file),
        );
        engine.persist()?;
        tracing::info!(
            project = %engine.project_dir.display(),
            count,
            "generated checkpoints from checklist"
        );
        Ok(engine)
    }

    /// Wrap an existing state without touching disk until the next mutation.
    pub fn from_state(
        project_dir: impl Into<PathBuf>,
        config: &EngineConfig,
        state: EngineState,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            config: config.clone(),
            state,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.state.checkpoints
    }

    pub fn checkpoint(&self, id: &str) -> Option<&Checkpoint> {
        checkpoint::find(&self.state.checkpoints, id)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub fn start(&mut self, id: &str) -> Result<ActionResult> {
        let Some(cp) = self.checkpoint(id) else {
            return Ok(ActionResult::fail(not_found(id)));
        };
        if cp.is_verified() {
            return Ok(ActionResult::fail(format!(
                "{id} is already verified; verified checkpoints cannot be restarted"
            )));
        }
        let verified = verified_ids(&self.state.checkpoints);
        let unmet = cp.unmet_dependencies(&verified);
        if !unmet.is_empty() {
            return Ok(ActionResult::fail(format!(
                "{id} is locked: verify {} first",
                unmet.join(", ")
            )));
        }
        if !self.state.skipped_checkpoints.is_empty() && !self.state.is_deferred(id) {
            return Ok(ActionResult::fail(format!(
                "skipped checkpoints must be resolved before {id}: {}",
                self.state.skipped_checkpoints.join(", ")
            )));
        }

        // Only one checkpoint may be in progress at a time.
        let skipped = &self.state.skipped_checkpoints;
        for other in self.state.checkpoints.iter_mut() {
            if other.state == CheckpointState::InProgress && other.id() != id {
                other.state = if skipped.iter().any(|s| s == other.id()) {
                    CheckpointState::SkippedTemporary
                } else {
                    CheckpointState::Available
                };
            }
        }

        let Some(cp) = checkpoint::find_mut(&mut self.state.checkpoints, id) else {
            return Ok(ActionResult::fail(not_found(id)));
        };
        cp.state = CheckpointState::InProgress;
        let name = cp.name.clone();
        self.state.current_checkpoint_id = Some(id.to_string());
        self.state.record(LogAction::Start, Some(id), name.clone());
        self.persist()?;

        tracing::info!(checkpoint = id, "checkpoint started");
        Ok(ActionResult::ok(format!("Started {id}: {name}")))
    }

    /// Attempt to satisfy `id`. Every attempt that reaches the verifier
    /// counts, whatever its outcome.
    pub fn verify(&mut self, id: &str, proof: Option<&str>) -> Result<ActionResult> {
        let Some(cp) = self.checkpoint(id) else {
            return Ok(ActionResult::fail(not_found(id)));
        };
        if cp.is_verified() {
            return Ok(ActionResult::ok(format!("{id} is already verified")));
        }
        let verified = verified_ids(&self.state.checkpoints);
        let unmet = cp.unmet_dependencies(&verified);
        if !unmet.is_empty() {
            return Ok(ActionResult::fail(format!(
                "{id} is locked: verify {} first",
                unmet.join(", ")
            )));
        }
        let kind = cp.verification_kind();
        let target = cp.verification_target().map(str::to_string);

        let ctx = VerifyContext {
            cwd: &self.project_dir,
            timeout: self.config.command_timeout(),
        };
        let Some(cp) = checkpoint::find_mut(&mut self.state.checkpoints, id) else {
            return Ok(ActionResult::fail(not_found(id)));
        };
        cp.attempt_count += 1;
        cp.last_error = None;
        let attempts = cp.attempt_count;

        let outcome = verify::run_verification(kind, target.as_deref(), proof, &ctx);
        let result = match outcome {
            VerificationOutcome::Passed { proof } => {
                cp.mark_verified(proof.clone());
                self.state.undefer(id);
                self.advance();
                self.state.record(LogAction::Verify, Some(id), proof);
                tracing::info!(checkpoint = id, attempts, "checkpoint verified");
                ActionResult::ok(format!("{id} verified (attempt {attempts})"))
            }
            VerificationOutcome::Failed { detail } => {
                cp.state = CheckpointState::Blocked;
                cp.last_error = Some(detail.clone());
                self.state
                    .record(LogAction::VerifyFailed, Some(id), detail.clone());
                tracing::warn!(checkpoint = id, attempts, %detail, "verification failed");
                ActionResult::fail(format!(
                    "{id} is blocked: {detail}. Fix the cause and run verify again."
                ))
            }
            VerificationOutcome::NeedsProof => {
                cp.state = CheckpointState::PendingManualProof;
                self.state.record(
                    LogAction::VerifyFailed,
                    Some(id),
                    "awaiting manual proof",
                );
                ActionResult::fail(format!(
                    "{id} is PendingManualProof: this checkpoint is verified manually, \
                     supply evidence of completion as proof"
                ))
            }
        };
        self.persist()?;
        Ok(result)
    }

    /// Defer `id`. The obligation stays: skipped checkpoints are scheduled
    /// ahead of everything else until they are verified.
    pub fn skip(&mut self, id: &str, reason: &str) -> Result<ActionResult> {
        let Some(cp) = checkpoint::find_mut(&mut self.state.checkpoints, id) else {
            return Ok(ActionResult::fail(not_found(id)));
        };
        let reason = reason.trim();
        if reason.is_empty() {
            return Ok(ActionResult::fail(format!(
                "a reason is required to skip {id}"
            )));
        }
        if !cp.state.is_skippable() {
            return Ok(ActionResult::fail(format!(
                "{id} is {} and cannot be skipped; only available or in-progress \
                 checkpoints can be deferred",
                cp.state
            )));
        }

        cp.state = CheckpointState::SkippedTemporary;
        self.state.defer(id);
        self.advance();
        self.state.record(LogAction::Skip, Some(id), reason);
        self.persist()?;

        tracing::info!(checkpoint = id, reason, "checkpoint skipped");
        Ok(ActionResult::ok(format!(
            "{id} skipped ({reason}). It must still be verified before the project can be archived."
        )))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn position(&self) -> Position {
        let total = self.state.checkpoints.len();
        let verified = self
            .state
            .checkpoints
            .iter()
            .filter(|c| c.is_verified())
            .count();
        let skipped = self.state.skipped_checkpoints.len();
        let progress_percent = if total == 0 {
            0
        } else {
            ((verified as f64 / total as f64) * 100.0).round_ties_even() as u32
        };
        let current = self
            .state
            .current_checkpoint_id
            .as_deref()
            .and_then(|id| self.checkpoint(id))
            .map(|cp| CurrentCheckpoint {
                id: cp.id().to_string(),
                name: cp.name.clone(),
                state: cp.state,
            });
        let blocking_reason = (skipped > 0).then(|| {
            format!(
                "{skipped} skipped checkpoint(s) must be completed first: {}",
                self.state.skipped_checkpoints.join(", ")
            )
        });

        Position {
            total,
            verified,
            remaining: total - verified,
            skipped,
            progress_percent,
            current,
            can_complete: verified == total && skipped == 0,
            blocking_reason,
        }
    }

    pub fn can_archive(&self) -> ArchiveCheck {
        let checkpoints = &self.state.checkpoints;
        if checkpoints.is_empty() {
            return ArchiveCheck {
                allowed: false,
                message: format!(
                    "Cannot archive: {} has no checklist items",
                    self.config.checklist_file
                ),
            };
        }

        if !self.state.skipped_checkpoints.is_empty() {
            let lines: Vec<String> = self
                .state
                .skipped_checkpoints
                .iter()
                .map(|id| match self.checkpoint(id) {
                    Some(cp) => format!("  - {id} {}", cp.name),
                    None => format!("  - {id}"),
                })
                .collect();
            return ArchiveCheck {
                allowed: false,
                message: format!(
                    "Cannot archive: {} skipped checkpoint(s) must be completed first:\n{}",
                    lines.len(),
                    lines.join("\n")
                ),
            };
        }

        let open: Vec<&Checkpoint> = checkpoints.iter().filter(|c| !c.is_verified()).collect();
        if !open.is_empty() {
            let mut lines: Vec<String> = open
                .iter()
                .take(ARCHIVE_LIST_LIMIT)
                .map(|cp| format!("  - {} {}", cp.id(), cp.name))
                .collect();
            if open.len() > ARCHIVE_LIST_LIMIT {
                lines.push(format!("  ... and {} more", open.len() - ARCHIVE_LIST_LIMIT));
            }
            return ArchiveCheck {
                allowed: false,
                message: format!(
                    "Cannot archive: {} checkpoint(s) not verified:\n{}",
                    open.len(),
                    lines.join("\n")
                ),
            };
        }

        ArchiveCheck {
            allowed: true,
            message: format!(
                "All {} checkpoints verified. Ready to archive.",
                checkpoints.len()
            ),
        }
    }

    pub fn timeline(&self) -> Vec<TimelineEntry> {
        let current = self.state.current_checkpoint_id.as_deref();
        self.state
            .checkpoints
            .iter()
            .map(|cp| TimelineEntry {
                id: cp.id().to_string(),
                name: cp.name.clone(),
                state: cp.state,
                verification: cp.verification_kind(),
                line: cp.source_line,
                is_current: current == Some(cp.id()),
                is_skipped: self.state.is_deferred(cp.id()),
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Record that the project is leaving the active directory.
    pub fn record_archive(&mut self, destination: &Path) -> Result<()> {
        self.state.record(
            LogAction::Archive,
            None,
            format!("archived to {}", destination.display()),
        );
        self.persist()
    }

    /// Pick the next current checkpoint. Skipped work outranks forward
    /// progress; a main-lane pick that is still `Locked` becomes `Available`.
    fn advance(&mut self) {
        let schedule =
            Scheduler::new(&self.state.checkpoints, &self.state.skipped_checkpoints).next();
        if schedule.deferred_resolved {
            self.state.skipped_checkpoints.clear();
        }

        match schedule.selection {
            Selection::Deferred(id) => {
                tracing::debug!(checkpoint = %id, "advance: deferred lane");
                self.state.current_checkpoint_id = Some(id);
            }
            Selection::Main(id) => {
                if let Some(cp) = checkpoint::find_mut(&mut self.state.checkpoints, &id) {
                    if cp.state == CheckpointState::Locked {
                        cp.state = CheckpointState::Available;
                    }
                }
                tracing::debug!(checkpoint = %id, "advance: main lane");
                self.state.current_checkpoint_id = Some(id);
            }
            Selection::Done => {
                tracing::debug!("advance: all checkpoints verified");
                self.state.current_checkpoint_id = None;
            }
        }
    }

    fn persist(&mut self) -> Result<()> {
        let path = paths::state_path(&self.project_dir, &self.config);
        self.state.save(&path, self.config.log_retention)
    }
}

fn not_found(id: &str) -> String {
    format!("checkpoint {id} does not exist")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

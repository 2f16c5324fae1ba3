//! Selection of the next current checkpoint.
//!
//! Two lanes: the deferred lane holds skipped checkpoint ids in skip order,
//! the main lane is every checkpoint in generation order. The deferred lane
//! always outranks the main lane.

use crate::checkpoint::{self, verified_ids, Checkpoint};
use crate::types::CheckpointState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// An unverified skipped checkpoint must be resolved first.
    Deferred(String),
    /// Forward progress on the main lane.
    Main(String),
    /// Nothing left to schedule.
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub selection: Selection,
    /// True when the deferred lane was non-empty but every entry in it is
    /// now verified; the caller should clear its skipped set.
    pub deferred_resolved: bool,
}

pub struct Scheduler<'a> {
    checkpoints: &'a [Checkpoint],
    deferred: &'a [String],
}

impl<'a> Scheduler<'a> {
    pub fn new(checkpoints: &'a [Checkpoint], deferred: &'a [String]) -> Self {
        Self {
            checkpoints,
            deferred,
        }
    }

    pub fn next(&self) -> Schedule {
        let pending = self.deferred.iter().find(|id| {
            checkpoint::find(self.checkpoints, id)
                .map(|cp| !cp.is_verified())
                .unwrap_or(false)
        });
        if let Some(id) = pending {
            return Schedule {
                selection: Selection::Deferred(id.clone()),
                deferred_resolved: false,
            };
        }

        let selection = self.next_main();
        Schedule {
            selection,
            deferred_resolved: !self.deferred.is_empty(),
        }
    }

    fn next_main(&self) -> Selection {
        let verified = verified_ids(self.checkpoints);
        self.checkpoints
            .iter()
            .find(|cp| {
                !matches!(
                    cp.state,
                    CheckpointState::Verified | CheckpointState::SkippedTemporary
                ) && cp.dependencies_met(&verified)
            })
            .map(|cp| Selection::Main(cp.id().to_string()))
            .unwrap_or(Selection::Done)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

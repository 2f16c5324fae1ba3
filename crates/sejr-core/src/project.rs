use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Result, SejrError};
use crate::paths;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

const CHECKLIST_TEMPLATE: &str = "\
# Sejrliste: {name}

## PASS 1: Plan
- [ ] Describe the goal in one sentence
- [ ] List what done looks like

## PASS 2: Build
- [ ] Do the work
- [ ] Commit to git

## PASS 3: Review
- [ ] Review the result against the goal
- [ ] Write down what to do differently next time
";

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// An active project directory: one checklist plus its enforcement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub name: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReceipt {
    pub name: String,
    pub destination: PathBuf,
    pub message: String,
}

impl Project {
    /// Every directory under the active root that holds a checklist,
    /// sorted by name.
    pub fn list_active(root: &Path, cfg: &Config) -> Result<Vec<Self>> {
        let active = paths::active_dir(root, cfg);
        if !active.exists() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for entry in std::fs::read_dir(&active)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let dir = entry.path();
            if !paths::checklist_path(&dir, &cfg.engine).exists() {
                tracing::debug!(dir = %dir.display(), "skipping directory without checklist");
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if paths::validate_project_name(&name).is_err() {
                tracing::warn!(dir = %dir.display(), "skipping project with invalid name");
                continue;
            }
            projects.push(Project { name, dir });
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    pub fn find(root: &Path, cfg: &Config, name: &str) -> Result<Self> {
        paths::validate_project_name(name)?;
        let dir = paths::project_dir(root, cfg, name);
        if !paths::checklist_path(&dir, &cfg.engine).exists() {
            return Err(SejrError::ProjectNotFound(name.to_string()));
        }
        Ok(Project {
            name: name.to_string(),
            dir,
        })
    }

    /// Create a new project directory with a three-pass checklist template.
    pub fn create(root: &Path, cfg: &Config, name: &str) -> Result<Self> {
        paths::validate_project_name(name)?;
        let dir = paths::project_dir(root, cfg, name);
        if dir.exists() {
            return Err(SejrError::ProjectExists(name.to_string()));
        }
        let checklist = CHECKLIST_TEMPLATE.replace("{name}", name);
        crate::io::write_if_missing(&paths::checklist_path(&dir, &cfg.engine), checklist.as_bytes())?;
        tracing::info!(project = name, "created project");
        Ok(Project {
            name: name.to_string(),
            dir,
        })
    }

    pub fn engine(&self, cfg: &Config) -> Result<Engine> {
        Engine::open(&self.dir, &cfg.engine)
    }

    /// Move a fully verified project out of the active directory.
    ///
    /// Refused with [`SejrError::ArchiveRefused`] unless every checkpoint is
    /// verified and nothing is left skipped.
    pub fn archive(&self, root: &Path, cfg: &Config) -> Result<ArchiveReceipt> {
        let engine = self.engine(cfg)?;
        let check = engine.can_archive();
        if !check.allowed {
            return Err(SejrError::ArchiveRefused {
                project: self.name.clone(),
                reason: check.message,
            });
        }

        let archive_dir = paths::archive_dir(root, cfg);
        std::fs::create_dir_all(&archive_dir)?;
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let destination = archive_dir.join(format!("{}_{stamp}", self.name));
        if destination.exists() {
            return Err(SejrError::ArchiveDestinationExists(destination));
        }

        // Only a project that actually moved gets an archive log entry.
        std::fs::rename(&self.dir, &destination)?;
        let mut archived = Engine::from_state(&destination, &cfg.engine, engine.state().clone());
        archived.record_archive(&destination)?;
        tracing::info!(project = %self.name, destination = %destination.display(), "archived project");

        Ok(ArchiveReceipt {
            name: self.name.clone(),
            destination,
            message: check.message,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::config::{Config, EngineConfig};
use crate::error::{Result, SejrError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Default names (overridable through sejr.yaml)
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "sejr.yaml";
pub const ACTIVE_DIR: &str = "10_ACTIVE";
pub const ARCHIVE_DIR: &str = "90_ARCHIVE";
pub const CHECKLIST_FILE: &str = "SEJR_LISTE.md";
pub const STATE_FILE: &str = "ENFORCEMENT_STATE.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn active_dir(root: &Path, cfg: &Config) -> PathBuf {
    root.join(&cfg.projects_dir)
}

pub fn archive_dir(root: &Path, cfg: &Config) -> PathBuf {
    root.join(&cfg.archive_dir)
}

pub fn project_dir(root: &Path, cfg: &Config, name: &str) -> PathBuf {
    active_dir(root, cfg).join(name)
}

pub fn checklist_path(project_dir: &Path, cfg: &EngineConfig) -> PathBuf {
    project_dir.join(&cfg.checklist_file)
}

pub fn state_path(project_dir: &Path, cfg: &EngineConfig) -> PathBuf {
    project_dir.join(&cfg.state_file)
}

// ---------------------------------------------------------------------------
// Project name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*[A-Za-z0-9]$|^[A-Za-z0-9]$").unwrap()
    })
}

pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(SejrError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["website-relaunch", "a", "SEJR_2026", "x1"] {
            validate_project_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "-leading", "trailing_", "has spaces", "../escape", "a/b"] {
            assert!(validate_project_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/sejr");
        let cfg = Config::default();
        assert_eq!(config_path(root), PathBuf::from("/tmp/sejr/sejr.yaml"));
        assert_eq!(
            project_dir(root, &cfg, "demo"),
            PathBuf::from("/tmp/sejr/10_ACTIVE/demo")
        );
        assert_eq!(archive_dir(root, &cfg), PathBuf::from("/tmp/sejr/90_ARCHIVE"));
        let project = project_dir(root, &cfg, "demo");
        assert_eq!(
            state_path(&project, &cfg.engine),
            PathBuf::from("/tmp/sejr/10_ACTIVE/demo/ENFORCEMENT_STATE.json")
        );
        assert_eq!(
            checklist_path(&project, &cfg.engine),
            PathBuf::from("/tmp/sejr/10_ACTIVE/demo/SEJR_LISTE.md")
        );
    }
}

use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Per-project engine settings. Passed into `Engine::open` explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_checklist_file")]
    pub checklist_file: String,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// `0` disables the timeout.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    /// Command used for checklist items that mention git but carry no
    /// explicit `Verify:` command.
    #[serde(default = "default_git_command")]
    pub default_git_command: String,
    #[serde(default = "default_log_retention")]
    pub log_retention: usize,
    #[serde(default = "default_name_width")]
    pub name_width: usize,
}

fn default_checklist_file() -> String {
    paths::CHECKLIST_FILE.to_string()
}

fn default_state_file() -> String {
    paths::STATE_FILE.to_string()
}

fn default_command_timeout() -> u64 {
    30
}

fn default_git_command() -> String {
    "git status --short".to_string()
}

fn default_log_retention() -> usize {
    100
}

fn default_name_width() -> usize {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checklist_file: default_checklist_file(),
            state_file: default_state_file(),
            command_timeout_seconds: default_command_timeout(),
            default_git_command: default_git_command(),
            log_retention: default_log_retention(),
            name_width: default_name_width(),
        }
    }
}

impl EngineConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        if self.command_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.command_timeout_seconds))
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_projects_dir")]
    pub projects_dir: String,
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_version() -> u32 {
    1
}

fn default_projects_dir() -> String {
    paths::ACTIVE_DIR.to_string()
}

fn default_archive_dir() -> String {
    paths::ARCHIVE_DIR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            projects_dir: default_projects_dir(),
            archive_dir: default_archive_dir(),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load `sejr.yaml` from `root`, falling back to defaults when the file
    /// does not exist. A present but malformed file is an error.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let engine = &self.engine;

        for (key, value) in [
            ("engine.checklist_file", &engine.checklist_file),
            ("engine.state_file", &engine.state_file),
            ("projects_dir", &self.projects_dir),
            ("archive_dir", &self.archive_dir),
        ] {
            if value.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{key} must not be empty"),
                });
            }
        }

        if engine.checklist_file == engine.state_file {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "engine.state_file '{}' would overwrite the checklist",
                    engine.state_file
                ),
            });
        }

        if engine.log_retention == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "engine.log_retention must be at least 1".to_string(),
            });
        }

        if engine.command_timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "engine.command_timeout_seconds=0 disables the verification timeout"
                    .to_string(),
            });
        } else if engine.command_timeout_seconds > 600 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "engine.command_timeout_seconds={} (>600 is unusual)",
                    engine.command_timeout_seconds
                ),
            });
        }

        if engine.default_git_command.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "engine.default_git_command is empty; git items will always fail"
                    .to_string(),
            });
        }

        if self.projects_dir == self.archive_dir {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "projects_dir and archive_dir are both '{}'",
                    self.projects_dir
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

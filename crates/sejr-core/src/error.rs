use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SejrError {
    #[error("checklist not found: {}", .0.display())]
    ChecklistNotFound(PathBuf),

    #[error("corrupt enforcement state in {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("invalid project name '{0}': use letters, digits, '-' or '_'")]
    InvalidProjectName(String),

    #[error("archive destination already exists: {}", .0.display())]
    ArchiveDestinationExists(PathBuf),

    #[error("archive refused for '{project}': {reason}")]
    ArchiveRefused { project: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SejrError>;

pub mod checklist;
pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod paths;
pub mod project;
pub mod scheduler;
pub mod state;
pub mod types;
pub mod verify;

pub use engine::{ActionResult, ArchiveCheck, Engine, Position, TimelineEntry};
pub use error::{Result, SejrError};

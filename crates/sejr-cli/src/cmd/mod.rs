pub mod archive;
pub mod checkpoint;
pub mod config;
pub mod project;
pub mod scan;

use anyhow::Context;
use sejr_core::{config::Config, project::Project, Engine};
use std::path::Path;

pub(crate) fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load_or_default(root).context("failed to load sejr.yaml")
}

pub(crate) fn open_engine(root: &Path, name: &str) -> anyhow::Result<(Config, Project, Engine)> {
    let config = load_config(root)?;
    let project =
        Project::find(root, &config, name).with_context(|| format!("project '{name}' not found"))?;
    let engine = project
        .engine(&config)
        .with_context(|| format!("failed to open enforcement state for '{name}'"))?;
    Ok((config, project, engine))
}

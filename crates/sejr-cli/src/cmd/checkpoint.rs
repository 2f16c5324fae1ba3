use super::open_engine;
use crate::output::{print_json, report, state_icon};
use anyhow::Context;
use sejr_core::{Engine, Position, TimelineEntry};
use std::path::Path;

pub fn status(root: &Path, project: &str, json: bool) -> anyhow::Result<()> {
    let (_, _, engine) = open_engine(root, project)?;
    let position = engine.position();

    if json {
        print_json(&serde_json::json!({ "project": project, "position": position }))?;
        return Ok(());
    }

    print_position(project, &position);
    Ok(())
}

pub fn timeline(root: &Path, project: &str, json: bool) -> anyhow::Result<()> {
    let (_, _, engine) = open_engine(root, project)?;
    let entries = engine.timeline();

    if json {
        print_json(&serde_json::json!({ "project": project, "timeline": entries }))?;
        return Ok(());
    }

    print_timeline(&entries);
    Ok(())
}

pub fn start(root: &Path, project: &str, id: &str, json: bool) -> anyhow::Result<()> {
    let (_, _, mut engine) = open_engine(root, project)?;
    let result = engine.start(id).context("failed to save enforcement state")?;
    report(&result, json)
}

pub fn verify(
    root: &Path,
    project: &str,
    id: &str,
    proof: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let (_, _, mut engine) = open_engine(root, project)?;
    let result = engine
        .verify(id, proof)
        .context("failed to save enforcement state")?;
    report(&result, json)?;
    if !json {
        print_next(&engine);
    }
    Ok(())
}

pub fn skip(root: &Path, project: &str, id: &str, reason: &str, json: bool) -> anyhow::Result<()> {
    let (_, _, mut engine) = open_engine(root, project)?;
    let result = engine
        .skip(id, reason)
        .context("failed to save enforcement state")?;
    report(&result, json)
}

pub fn reset(root: &Path, project: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let found = sejr_core::project::Project::find(root, &config, project)
        .with_context(|| format!("project '{project}' not found"))?;
    let engine = Engine::regenerate(&found.dir, &config.engine)
        .with_context(|| format!("failed to regenerate checkpoints for '{project}'"))?;

    if json {
        print_json(&serde_json::json!({
            "project": project,
            "checkpoints": engine.checkpoints().len(),
            "position": engine.position(),
        }))?;
    } else {
        println!(
            "Regenerated {} checkpoints for '{project}' from {}",
            engine.checkpoints().len(),
            config.engine.checklist_file
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub(crate) fn print_position(project: &str, position: &Position) {
    println!(
        "{project}: {}/{} verified ({}%), {} remaining",
        position.verified, position.total, position.progress_percent, position.remaining
    );
    match &position.current {
        Some(current) => println!(
            "Current:  {} {} {} [{}]",
            state_icon(current.state),
            current.id,
            current.name,
            current.state
        ),
        None => println!("Current:  ALL DONE"),
    }
    if let Some(reason) = &position.blocking_reason {
        println!("Blocked:  {reason}");
    }
    if position.can_complete {
        println!("Ready to complete.");
    }
}

pub(crate) fn print_timeline(entries: &[TimelineEntry]) {
    for entry in entries {
        let marker = if entry.is_current { "👉" } else { "  " };
        let skipped = if entry.is_skipped { "  (skipped, must return)" } else { "" };
        let origin = match entry.line {
            Some(line) => format!("{}, line {line}", entry.verification),
            None => entry.verification.to_string(),
        };
        println!(
            "{marker} {} {}  {}  [{origin}]{skipped}",
            state_icon(entry.state),
            entry.id,
            entry.name
        );
    }
}

fn print_next(engine: &Engine) {
    match engine.position().current {
        Some(next) => println!("Next: {} {}", next.id, next.name),
        None => println!("Next: ALL DONE"),
    }
}

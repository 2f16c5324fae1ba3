use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use sejr_core::project::Project;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Create a project with a three-pass checklist template
    New { name: String },
    /// List active projects with their progress
    List,
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::New { name } => new(root, &name, json),
        ProjectSubcommand::List => list(root, json),
    }
}

fn new(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let project = Project::create(root, &config, name)
        .with_context(|| format!("failed to create project '{name}'"))?;
    let engine = project
        .engine(&config)
        .context("failed to generate checkpoints")?;

    if json {
        print_json(&serde_json::json!({
            "project": project.name,
            "dir": project.dir,
            "checkpoints": engine.checkpoints().len(),
        }))?;
    } else {
        println!(
            "Created '{}' with {} checkpoints at {}",
            project.name,
            engine.checkpoints().len(),
            project.dir.display()
        );
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let projects = Project::list_active(root, &config).context("failed to list projects")?;

    if json {
        let items: Vec<serde_json::Value> = projects
            .iter()
            .map(|p| match p.engine(&config) {
                Ok(engine) => serde_json::json!({
                    "project": p.name,
                    "position": engine.position(),
                }),
                Err(e) => serde_json::json!({ "project": p.name, "error": e.to_string() }),
            })
            .collect();
        return print_json(&items);
    }

    if projects.is_empty() {
        println!("No active projects.");
        return Ok(());
    }

    let rows = projects
        .iter()
        .map(|p| match p.engine(&config) {
            Ok(engine) => {
                let pos = engine.position();
                vec![
                    p.name.clone(),
                    format!("{}/{} ({}%)", pos.verified, pos.total, pos.progress_percent),
                    pos.current
                        .map(|c| c.id)
                        .unwrap_or_else(|| "ALL DONE".to_string()),
                    pos.skipped.to_string(),
                ]
            }
            Err(e) => vec![p.name.clone(), format!("error: {e}"), String::new(), String::new()],
        })
        .collect();
    print_table(&["PROJECT", "PROGRESS", "CURRENT", "SKIPPED"], rows);
    Ok(())
}

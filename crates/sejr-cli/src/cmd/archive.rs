use super::open_engine;
use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, project: &str, check_only: bool, json: bool) -> anyhow::Result<()> {
    let (config, found, engine) = open_engine(root, project)?;
    let check = engine.can_archive();

    if check_only || !check.allowed {
        if json {
            print_json(&serde_json::json!({ "project": project, "archive": check }))?;
        } else if check.allowed {
            println!("{}", check.message);
        }
        if !check.allowed {
            anyhow::bail!("{}", check.message);
        }
        return Ok(());
    }

    let receipt = found
        .archive(root, &config)
        .with_context(|| format!("failed to archive '{project}'"))?;

    if json {
        print_json(&receipt)?;
    } else {
        println!("{}", receipt.message);
        println!("Archived '{project}' to {}", receipt.destination.display());
    }
    Ok(())
}

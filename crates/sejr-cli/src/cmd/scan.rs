use super::checkpoint::print_timeline;
use crate::output::print_json;
use sejr_core::project::Project;
use std::path::Path;

/// Walk every active project and report its timeline and whether it could
/// be archived. A project that fails to open is reported and skipped.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let projects = Project::list_active(root, &config)?;

    let mut reports = Vec::new();
    for project in &projects {
        match project.engine(&config) {
            Ok(engine) => {
                let check = engine.can_archive();
                if json {
                    reports.push(serde_json::json!({
                        "project": project.name,
                        "position": engine.position(),
                        "timeline": engine.timeline(),
                        "archive": check,
                    }));
                } else {
                    println!("== {} ==", project.name);
                    print_timeline(&engine.timeline());
                    let verdict = if check.allowed { "yes" } else { "no" };
                    println!("Archivable: {verdict}");
                    println!("{}", check.message);
                    println!();
                }
            }
            Err(e) => {
                tracing::warn!(project = %project.name, error = %e, "skipping project");
                if json {
                    reports.push(serde_json::json!({
                        "project": project.name,
                        "error": e.to_string(),
                    }));
                } else {
                    println!("== {} ==", project.name);
                    println!("error: {e}");
                    println!();
                }
            }
        }
    }

    if json {
        print_json(&reports)?;
    } else if projects.is_empty() {
        println!("No active projects.");
    }
    Ok(())
}

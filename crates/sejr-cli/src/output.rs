use sejr_core::types::CheckpointState;
use sejr_core::ActionResult;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print left-aligned columns sized to the widest cell (counted in chars,
/// so checkpoint names with non-ASCII text line up).
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    println!("{}", render_row(headers.iter().copied(), &widths));
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", rule.join("  "));
    for row in &rows {
        println!("{}", render_row(row.iter().map(String::as_str), &widths));
    }
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| {
            let pad = w.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Print an engine result. An unsuccessful result becomes the command's
/// error so the process exits non-zero.
pub fn report(result: &ActionResult, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(result)?;
    } else if result.success {
        println!("{}", result.message);
    }
    if !result.success {
        anyhow::bail!("{}", result.message);
    }
    Ok(())
}

pub fn state_icon(state: CheckpointState) -> &'static str {
    match state {
        CheckpointState::Verified => "✅",
        CheckpointState::InProgress => "🔄",
        CheckpointState::Available => "⬜",
        CheckpointState::Locked => "🔒",
        CheckpointState::PendingManualProof => "📝",
        CheckpointState::Blocked => "❌",
        CheckpointState::SkippedTemporary => "⏭️",
    }
}

//! Checkpoint generation from a markdown checklist.
//!
//! Items are lines of the form `- [ ] text` / `- [x] text`. Every line is
//! also sniffed for a section marker (`PASS 2`, `PHASE 1`, `FASE 3`) which is
//! prefixed onto the display name of the checkpoints that follow it.

use crate::checkpoint::{checkpoint_id, Checkpoint};
use crate::config::EngineConfig;
use crate::types::{CheckpointState, VerificationKind};
use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;

pub const PREEXISTING_PROOF: &str = "pre-existing checkbox";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    /// 1-based line number in the source document.
    pub line: usize,
    pub done: bool,
    pub text: String,
    pub section: Option<String>,
}

static ITEM_RE: OnceLock<Regex> = OnceLock::new();
static SECTION_RE: OnceLock<Regex> = OnceLock::new();
static VERIFY_RE: OnceLock<Regex> = OnceLock::new();
static EXISTS_RE: OnceLock<Regex> = OnceLock::new();

fn item_re() -> &'static Regex {
    ITEM_RE.get_or_init(|| Regex::new(r"^\s*- \[( |x|X)\] (.+)$").unwrap())
}

fn section_re() -> &'static Regex {
    SECTION_RE.get_or_init(|| Regex::new(r"\b(PASS|PHASE|FASE) \d+\b").unwrap())
}

fn verify_re() -> &'static Regex {
    VERIFY_RE.get_or_init(|| Regex::new(r"Verify:\s*`([^`]+)`").unwrap())
}

fn exists_re() -> &'static Regex {
    EXISTS_RE.get_or_init(|| Regex::new(r"Exists:\s*`([^`]+)`").unwrap())
}

/// Extract checklist items in document order, each tagged with the section
/// label in effect on its line.
pub fn parse_items(document: &str) -> Vec<ChecklistItem> {
    let mut section: Option<String> = None;
    let mut items = Vec::new();

    for (idx, line) in document.lines().enumerate() {
        if let Some(m) = section_re().find(line) {
            section = Some(m.as_str().to_string());
        }
        let Some(caps) = item_re().captures(line) else {
            continue;
        };
        items.push(ChecklistItem {
            line: idx + 1,
            done: &caps[1] != " ",
            text: caps[2].trim().to_string(),
            section: section.clone(),
        });
    }
    items
}

/// Decide how a checklist item is verified.
pub fn classify(text: &str, cfg: &EngineConfig) -> (VerificationKind, Option<String>) {
    if let Some(caps) = verify_re().captures(text) {
        return (VerificationKind::Command, Some(caps[1].trim().to_string()));
    }
    if let Some(caps) = exists_re().captures(text) {
        return (VerificationKind::FileExists, Some(caps[1].trim().to_string()));
    }
    if text.to_lowercase().contains("git") {
        return (
            VerificationKind::Command,
            Some(cfg.default_git_command.clone()),
        );
    }
    (VerificationKind::Manual, None)
}

pub fn display_name(item: &ChecklistItem, width: usize) -> String {
    let text = truncate(&item.text, width);
    match &item.section {
        Some(section) => format!("[{section}] {text}"),
        None => text,
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Build the linear checkpoint chain for `document`.
///
/// Checked items are seeded as `Verified`; everything else starts `Locked`.
/// The caller runs the advance step to pick the first current checkpoint.
pub fn generate(document: &str, cfg: &EngineConfig) -> Vec<Checkpoint> {
    let items = parse_items(document);
    let mut checkpoints: Vec<Checkpoint> = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let (kind, target) = classify(&item.text, cfg);
        let mut cp = Checkpoint::new(
            checkpoint_id(index),
            display_name(item, cfg.name_width),
            kind,
            target,
        );
        cp.source_line = Some(item.line);
        if let Some(prev) = checkpoints.last() {
            cp.dependencies.push(prev.id().to_string());
        }
        if item.done {
            cp.state = CheckpointState::Verified;
            cp.verified_at = Some(Utc::now());
            cp.proof = Some(PREEXISTING_PROOF.to_string());
        }
        checkpoints.push(cp);
    }

    tracing::debug!(count = checkpoints.len(), "generated checkpoints");
    checkpoints
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

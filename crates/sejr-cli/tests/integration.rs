#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sejr(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sejr").unwrap();
    cmd.current_dir(dir.path()).env("SEJR_ROOT", dir.path());
    cmd
}

fn write_checklist(dir: &TempDir, project: &str, checklist: &str) {
    let project_dir = dir.path().join("10_ACTIVE").join(project);
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(project_dir.join("SEJR_LISTE.md"), checklist).unwrap();
}

fn state_json(dir: &TempDir, project: &str) -> serde_json::Value {
    let path = dir
        .path()
        .join("10_ACTIVE")
        .join(project)
        .join("ENFORCEMENT_STATE.json");
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

const COMMANDS: &str = "\
## PASS 1
- [ ] Say hello Verify: `echo hello`
- [ ] Write notes Verify: `test -f notes.txt`
- [ ] Ask for review
";

// ---------------------------------------------------------------------------
// sejr project
// ---------------------------------------------------------------------------

#[test]
fn project_new_creates_checklist_and_state() {
    let dir = TempDir::new().unwrap();
    sejr(&dir)
        .args(["project", "new", "launch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 checkpoints"));

    let project_dir = dir.path().join("10_ACTIVE/launch");
    assert!(project_dir.join("SEJR_LISTE.md").exists());
    assert!(project_dir.join("ENFORCEMENT_STATE.json").exists());
}

#[test]
fn project_new_rejects_duplicate_and_bad_names() {
    let dir = TempDir::new().unwrap();
    sejr(&dir).args(["project", "new", "launch"]).assert().success();
    sejr(&dir)
        .args(["project", "new", "launch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    sejr(&dir)
        .args(["project", "new", "../escape"])
        .assert()
        .failure();
}

#[test]
fn project_list_shows_progress() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", "- [x] done\n- [ ] open\n");
    sejr(&dir)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("1/2 (50%)"));
}

#[test]
fn project_list_empty() {
    let dir = TempDir::new().unwrap();
    sejr(&dir)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active projects."));
}

// ---------------------------------------------------------------------------
// sejr status / timeline
// ---------------------------------------------------------------------------

#[test]
fn status_json_reports_position() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    let output = sejr(&dir)
        .args(["--json", "status", "alpha"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["position"]["total"], 3);
    assert_eq!(value["position"]["verified"], 0);
    assert_eq!(value["position"]["current"]["id"], "CP_000");
    assert_eq!(value["position"]["can_complete"], false);
}

#[test]
fn status_unknown_project_fails() {
    let dir = TempDir::new().unwrap();
    sejr(&dir)
        .args(["status", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn timeline_lists_every_checkpoint() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    sejr(&dir)
        .args(["timeline", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CP_000"))
        .stdout(predicate::str::contains("CP_002"))
        .stdout(predicate::str::contains("[PASS 1] Ask for review"))
        .stdout(predicate::str::contains("[command, line 2]"))
        .stdout(predicate::str::contains("[manual, line 4]"));
}

// ---------------------------------------------------------------------------
// sejr start / verify / skip
// ---------------------------------------------------------------------------

#[test]
fn verify_command_checkpoint_advances() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    sejr(&dir)
        .args(["verify", "alpha", "CP_000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CP_000 verified"))
        .stdout(predicate::str::contains("Next: CP_001"));

    let state = state_json(&dir, "alpha");
    assert_eq!(state["checkpoints"][0]["state"], "verified");
    assert_eq!(state["checkpoints"][0]["proof"], "hello");
    assert_eq!(state["current_checkpoint_id"], "CP_001");
}

#[test]
fn verify_failure_blocks_and_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    sejr(&dir).args(["verify", "alpha", "CP_000"]).assert().success();
    sejr(&dir)
        .args(["verify", "alpha", "CP_001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CP_001 is blocked"));

    let state = state_json(&dir, "alpha");
    assert_eq!(state["checkpoints"][1]["state"], "blocked");
    assert_eq!(state["checkpoints"][1]["attempt_count"], 1);

    std::fs::write(dir.path().join("10_ACTIVE/alpha/notes.txt"), "notes").unwrap();
    sejr(&dir).args(["verify", "alpha", "CP_001"]).assert().success();
    assert_eq!(state_json(&dir, "alpha")["checkpoints"][1]["attempt_count"], 2);
}

#[test]
fn verify_locked_checkpoint_is_refused() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    sejr(&dir)
        .args(["verify", "alpha", "CP_002", "--proof", "reviewed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));
}

#[test]
fn manual_checkpoint_needs_proof() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", "- [ ] Ask for review\n");
    sejr(&dir)
        .args(["verify", "alpha", "CP_000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PendingManualProof"));
    sejr(&dir)
        .args(["verify", "alpha", "CP_000", "--proof", "approved by Kim"])
        .assert()
        .success();
    assert_eq!(
        state_json(&dir, "alpha")["checkpoints"][0]["proof"],
        "approved by Kim"
    );
}

#[test]
fn start_unknown_checkpoint_fails() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    sejr(&dir)
        .args(["start", "alpha", "CP_999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CP_999"));
}

#[test]
fn skip_requires_reason() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    sejr(&dir).args(["skip", "alpha", "CP_000"]).assert().failure();
}

#[test]
fn skipped_checkpoint_blocks_archive_until_verified() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", "- [ ] Say hello Verify: `echo hello`\n");
    sejr(&dir)
        .args(["skip", "alpha", "CP_000", "waiting", "on", "access"])
        .assert()
        .success()
        .stdout(predicate::str::contains("waiting on access"));

    sejr(&dir)
        .args(["archive", "alpha", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("skipped checkpoint(s) must be completed first"));

    sejr(&dir).args(["verify", "alpha", "CP_000"]).assert().success();
    let state = state_json(&dir, "alpha");
    assert_eq!(state["skipped_checkpoints"].as_array().unwrap().len(), 0);

    sejr(&dir)
        .args(["archive", "alpha", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready to archive"));
}

// ---------------------------------------------------------------------------
// sejr archive
// ---------------------------------------------------------------------------

#[test]
fn archive_refused_with_open_work() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    sejr(&dir)
        .args(["archive", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("3 checkpoint(s) not verified"));
    assert!(dir.path().join("10_ACTIVE/alpha").exists());
}

#[test]
fn archive_moves_finished_project() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", "- [x] one\n- [x] two\n");
    sejr(&dir)
        .args(["archive", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All 2 checkpoints verified"));

    assert!(!dir.path().join("10_ACTIVE/alpha").exists());
    let archived: Vec<_> = std::fs::read_dir(dir.path().join("90_ARCHIVE"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(archived.len(), 1);
    assert!(archived[0].starts_with("alpha_"));
}

#[test]
fn archive_refuses_empty_checklist() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "empty", "# Nothing here\n");
    sejr(&dir)
        .args(["archive", "empty", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no checklist items"));
}

// ---------------------------------------------------------------------------
// sejr reset / scan
// ---------------------------------------------------------------------------

#[test]
fn corrupt_state_is_reported_and_reset_recovers() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    std::fs::write(
        dir.path().join("10_ACTIVE/alpha/ENFORCEMENT_STATE.json"),
        "{ not json",
    )
    .unwrap();

    sejr(&dir)
        .args(["status", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));

    sejr(&dir)
        .args(["reset", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Regenerated 3 checkpoints"));
    sejr(&dir).args(["status", "alpha"]).assert().success();
}

#[test]
fn scan_reports_every_project() {
    let dir = TempDir::new().unwrap();
    write_checklist(&dir, "alpha", COMMANDS);
    write_checklist(&dir, "beta", "- [x] done\n");
    std::fs::write(
        dir.path().join("10_ACTIVE/alpha/ENFORCEMENT_STATE.json"),
        "{ not json",
    )
    .unwrap();

    sejr(&dir)
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("== alpha =="))
        .stdout(predicate::str::contains("== beta =="))
        .stdout(predicate::str::contains("Archivable: yes"));
}

// ---------------------------------------------------------------------------
// sejr config
// ---------------------------------------------------------------------------

#[test]
fn config_init_then_validate() {
    let dir = TempDir::new().unwrap();
    sejr(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join("sejr.yaml").exists());
    assert!(dir.path().join("10_ACTIVE").is_dir());

    sejr(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_flags_state_overwriting_checklist() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("sejr.yaml"),
        "engine:\n  checklist_file: LIST.md\n  state_file: LIST.md\n",
    )
    .unwrap();
    sejr(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}

#[test]
fn config_changes_checklist_file_name() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("sejr.yaml"), "engine:\n  checklist_file: TODO.md\n").unwrap();
    let project_dir = dir.path().join("10_ACTIVE/custom");
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(project_dir.join("TODO.md"), "- [ ] only item\n").unwrap();

    sejr(&dir)
        .args(["timeline", "custom"])
        .assert()
        .success()
        .stdout(predicate::str::contains("only item"));
}

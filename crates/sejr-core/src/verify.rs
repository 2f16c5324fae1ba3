//! The three ways a checkpoint can be satisfied: a shell command exiting 0,
//! a file existing on disk, or a manually supplied proof string.

use crate::types::VerificationKind;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

const MAX_OUTPUT: usize = 10 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Passed { proof: String },
    Failed { detail: String },
    /// Manual checkpoint attempted without evidence.
    NeedsProof,
}

/// Where and how long verification may run.
#[derive(Debug, Clone, Copy)]
pub struct VerifyContext<'a> {
    pub cwd: &'a Path,
    pub timeout: Option<Duration>,
}

/// Dispatch on `kind`. `target` is the command or path; `proof` is only
/// consulted for manual checkpoints.
pub fn run_verification(
    kind: VerificationKind,
    target: Option<&str>,
    proof: Option<&str>,
    ctx: &VerifyContext<'_>,
) -> VerificationOutcome {
    match kind {
        VerificationKind::Command => run_command(target.unwrap_or_default(), ctx),
        VerificationKind::FileExists => check_file(target.unwrap_or_default(), ctx.cwd),
        VerificationKind::Manual => check_manual(proof),
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

pub fn run_command(command: &str, ctx: &VerifyContext<'_>) -> VerificationOutcome {
    if command.trim().is_empty() {
        return VerificationOutcome::Failed {
            detail: "verification command is empty".to_string(),
        };
    }

    match execute_shell(command, ctx.cwd, ctx.timeout) {
        ShellResult::Exited { status, stdout, .. } if status.success() => {
            let proof = cap_output(stdout.trim());
            VerificationOutcome::Passed {
                proof: if proof.is_empty() {
                    "command succeeded (exit 0)".to_string()
                } else {
                    proof
                },
            }
        }
        ShellResult::Exited { status, stdout, stderr } => {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let output = combine(&stdout, &stderr);
            let detail = if output.is_empty() {
                format!("exit code {code}")
            } else {
                format!("exit code {code}: {output}")
            };
            VerificationOutcome::Failed { detail }
        }
        ShellResult::TimedOut(timeout) => VerificationOutcome::Failed {
            detail: format!("timed out after {}s", timeout.as_secs()),
        },
        ShellResult::SpawnFailed(e) => VerificationOutcome::Failed {
            detail: format!("failed to spawn: {e}"),
        },
    }
}

enum ShellResult {
    Exited {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    TimedOut(Duration),
    SpawnFailed(String),
}

/// Run `sh -c command` in `cwd`, waiting at most `timeout`.
///
/// stdout/stderr are drained on dedicated threads so a chatty command cannot
/// fill the pipe buffer and stall; the wait happens on a third thread so the
/// caller can give up with `recv_timeout`.
fn execute_shell(command: &str, cwd: &Path, timeout: Option<Duration>) -> ShellResult {
    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => return ShellResult::SpawnFailed(e.to_string()),
    };

    let child_pid = child.id();
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || read_all(stdout_handle));
    let stderr_thread = std::thread::spawn(move || read_all(stderr_handle));

    let wait_result = match timeout {
        None => child.wait(),
        Some(limit) => {
            let (tx, rx) = std::sync::mpsc::channel();
            std::thread::spawn(move || {
                let _ = tx.send(child.wait());
            });
            match rx.recv_timeout(limit) {
                Ok(result) => result,
                Err(_) => {
                    kill_process(child_pid);
                    tracing::warn!(command, secs = limit.as_secs(), "verification command timed out");
                    return ShellResult::TimedOut(limit);
                }
            }
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    match wait_result {
        Ok(status) => ShellResult::Exited {
            status,
            stdout,
            stderr,
        },
        Err(e) => ShellResult::SpawnFailed(format!("wait failed: {e}")),
    }
}

fn read_all<R: Read>(handle: Option<R>) -> String {
    let mut buf = String::new();
    if let Some(mut r) = handle {
        let _ = r.read_to_string(&mut buf);
    }
    buf
}

fn combine(stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    let stderr = stderr.trim();
    let output = match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{stdout}\n{stderr}"),
    };
    cap_output(&output)
}

/// Keep the last 10KB; failures usually explain themselves at the end.
fn cap_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT {
        return output.to_string();
    }
    let mut start = output.len() - MAX_OUTPUT;
    while !output.is_char_boundary(start) {
        start += 1;
    }
    output[start..].to_string()
}

/// Terminate a process by PID using SIGKILL. Best-effort.
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

// ---------------------------------------------------------------------------
// File existence
// ---------------------------------------------------------------------------

/// Relative paths are resolved against the project directory.
pub fn check_file(target: &str, cwd: &Path) -> VerificationOutcome {
    if target.trim().is_empty() {
        return VerificationOutcome::Failed {
            detail: "no file path to check".to_string(),
        };
    }
    let path = cwd.join(target);
    if path.exists() {
        VerificationOutcome::Passed {
            proof: format!("file exists: {target}"),
        }
    } else {
        VerificationOutcome::Failed {
            detail: format!("file not found: {}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Manual
// ---------------------------------------------------------------------------

pub fn check_manual(proof: Option<&str>) -> VerificationOutcome {
    match proof.map(str::trim) {
        Some(p) if !p.is_empty() => VerificationOutcome::Passed {
            proof: p.to_string(),
        },
        _ => VerificationOutcome::NeedsProof,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

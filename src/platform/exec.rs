//! Bounded external command execution.
//!
//! Every privileged host action shells out through here. A command
//! gets a fixed deadline; on expiry the child is killed and the call
//! surfaces `ActionTimeout`, so the single dispatch loop can never be
//! blocked indefinitely.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::AgentError;
use crate::Result;

/// Poll interval while waiting for a child to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run a command to completion within `timeout`.
///
/// Returns the captured output whatever the exit code; callers that
/// need success use [`run_ok`]. A missing program reports
/// `ActionFailed` rather than a raw I/O error.
pub fn run_with_timeout(program: &str, args: &[&str], timeout: Duration) -> Result<ExecOutput> {
    debug!(program, ?args, "running external command");
    let start = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AgentError::ActionFailed(format!("{} not found", program))
            }
            _ => AgentError::Io(e),
        })?;

    // Drain pipes on threads so a chatty child cannot deadlock
    // against a full pipe buffer while we poll for exit.
    let stdout_handle = child.stdout.take().map(spawn_reader);
    let stderr_handle = child.stderr.take().map(spawn_reader);

    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    debug!(program, "command killed after deadline");
                    return Err(AgentError::ActionTimeout);
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let stdout = join_reader(stdout_handle);
    let stderr = join_reader(stderr_handle);

    Ok(ExecOutput {
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

/// Like [`run_with_timeout`] but a non-zero exit is an `ActionFailed`
/// carrying a trimmed stderr excerpt.
pub fn run_ok(program: &str, args: &[&str], timeout: Duration) -> Result<ExecOutput> {
    let output = run_with_timeout(program, args, timeout)?;
    if output.success() {
        Ok(output)
    } else {
        let detail = output.stderr.trim();
        let detail = if detail.is_empty() {
            format!("{} exited with {:?}", program, output.exit_code)
        } else {
            detail.chars().take(200).collect()
        };
        Err(AgentError::ActionFailed(detail))
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

//! Running-application snapshot and ordered termination.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::exec::run_with_timeout;
use crate::error::AgentError;
use crate::session::RunningApp;
use crate::Result;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);
const GRACEFUL_WAIT: Duration = Duration::from_secs(5);

/// Processes whose termination needs an explicit confirmation pass.
pub const CRITICAL_PROCESSES: &[&str] = &[
    "explorer.exe",
    "winlogon.exe",
    "csrss.exe",
    "wininit.exe",
    "services.exe",
    "lsass.exe",
    "svchost.exe",
    "dwm.exe",
    "systemd",
    "init",
];

/// Window titles that are desktop chrome, not operator-closable apps.
const IGNORED_TITLES: &[&str] = &["Program Manager", "Desktop Window Manager", "Default IME"];

/// Whether a process name is on the critical denylist.
pub fn is_critical(process_name: &str) -> bool {
    let lower = process_name.to_ascii_lowercase();
    CRITICAL_PROCESSES.iter().any(|p| *p == lower)
}

/// Which termination method succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationMethod {
    ForceSignal,
    GracefulTerminate,
    Kill,
    AlreadyExited,
}

impl fmt::Display for TerminationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationMethod::ForceSignal => "force signal",
            TerminationMethod::GracefulTerminate => "graceful terminate",
            TerminationMethod::Kill => "kill",
            TerminationMethod::AlreadyExited => "process already terminated",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of currently visible top-level windows, deduplicated by
/// (title, process name). Ordering is the enumeration order and stays
/// stable for the lifetime of the app-choice step.
pub fn running_apps() -> Result<Vec<RunningApp>> {
    let raw = enumerate_windows()?;
    let mut seen = std::collections::HashSet::new();
    let mut apps = Vec::new();
    for app in raw {
        if app.window_title.trim().is_empty()
            || IGNORED_TITLES.contains(&app.window_title.as_str())
        {
            continue;
        }
        if seen.insert((app.window_title.clone(), app.process_name.clone())) {
            apps.push(app);
        }
    }
    Ok(apps)
}

/// Try an ordered sequence of termination methods; the first that
/// reports success wins. Exhausting all of them is an `ActionFailed`.
pub fn terminate(app: &RunningApp) -> Result<TerminationMethod> {
    info!(pid = app.pid, process = %app.process_name, "terminating application");

    if !is_alive(app.pid) {
        return Ok(TerminationMethod::AlreadyExited);
    }

    if force_signal(app.pid) && wait_for_exit(app.pid, Duration::from_secs(2)) {
        return Ok(TerminationMethod::ForceSignal);
    }

    if graceful_terminate(app.pid) && wait_for_exit(app.pid, GRACEFUL_WAIT) {
        return Ok(TerminationMethod::GracefulTerminate);
    }

    if kill_hard(app.pid) && wait_for_exit(app.pid, Duration::from_secs(2)) {
        return Ok(TerminationMethod::Kill);
    }

    warn!(pid = app.pid, "all termination methods failed");
    Err(AgentError::ActionFailed(
        "could not close application".into(),
    ))
}

fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !is_alive(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    !is_alive(pid)
}

#[cfg(windows)]
fn enumerate_windows() -> Result<Vec<RunningApp>> {
    // tasklist /v emits one CSV row per process; the window title is
    // the last column and is "N/A" for windowless processes.
    let output = run_with_timeout("tasklist", &["/v", "/fo", "csv", "/nh"], SNAPSHOT_TIMEOUT)?;
    let mut apps = Vec::new();
    for line in output.stdout.lines() {
        let fields = parse_csv_line(line);
        if fields.len() < 9 {
            continue;
        }
        let title = fields[8].trim();
        if title.is_empty() || title == "N/A" {
            continue;
        }
        let Ok(pid) = fields[1].parse::<u32>() else {
            continue;
        };
        apps.push(RunningApp {
            pid,
            window_title: title.to_string(),
            process_name: fields[0].clone(),
        });
    }
    Ok(apps)
}

#[cfg(windows)]
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(windows)]
fn is_alive(pid: u32) -> bool {
    let filter = format!("PID eq {}", pid);
    run_with_timeout("tasklist", &["/FI", &filter, "/nh"], SNAPSHOT_TIMEOUT)
        .map(|o| o.stdout.contains(&pid.to_string()))
        .unwrap_or(false)
}

#[cfg(windows)]
fn force_signal(pid: u32) -> bool {
    let pid_s = pid.to_string();
    run_with_timeout("taskkill", &["/PID", &pid_s, "/F"], SNAPSHOT_TIMEOUT)
        .map(|o| o.success())
        .unwrap_or(false)
}

#[cfg(windows)]
fn graceful_terminate(pid: u32) -> bool {
    let pid_s = pid.to_string();
    run_with_timeout("taskkill", &["/PID", &pid_s], SNAPSHOT_TIMEOUT)
        .map(|o| o.success())
        .unwrap_or(false)
}

#[cfg(windows)]
fn kill_hard(pid: u32) -> bool {
    let pid_s = pid.to_string();
    run_with_timeout("taskkill", &["/PID", &pid_s, "/F", "/T"], SNAPSHOT_TIMEOUT)
        .map(|o| o.success())
        .unwrap_or(false)
}

#[cfg(unix)]
fn enumerate_windows() -> Result<Vec<RunningApp>> {
    // wmctrl lists X11 top-level windows as: id desktop pid host title...
    let output = run_with_timeout("wmctrl", &["-lp"], SNAPSHOT_TIMEOUT)?;
    let mut apps = Vec::new();
    for line in output.stdout.lines() {
        let mut cols = line.split_whitespace();
        let _id = cols.next();
        let _desktop = cols.next();
        let Some(pid) = cols.next().and_then(|p| p.parse::<u32>().ok()) else {
            continue;
        };
        let _host = cols.next();
        let title = cols.collect::<Vec<_>>().join(" ");
        if title.is_empty() {
            continue;
        }
        let process_name = std::fs::read_to_string(format!("/proc/{}/comm", pid))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".into());
        apps.push(RunningApp {
            pid,
            window_title: title,
            process_name,
        });
    }
    Ok(apps)
}

#[cfg(unix)]
fn is_alive(pid: u32) -> bool {
    if unsafe { libc::kill(pid as libc::pid_t, 0) } != 0 {
        return false;
    }
    // Signal 0 still succeeds against a zombie; a process waiting to
    // be reaped is dead for our purposes.
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => proc_state(&stat) != Some('Z'),
        Err(_) => false,
    }
}

/// The state letter from a `/proc/<pid>/stat` line. The comm field may
/// itself contain spaces or parens, so the state follows the last `)`.
#[cfg(unix)]
fn proc_state(stat: &str) -> Option<char> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().next()?.chars().next()
}

#[cfg(unix)]
fn force_signal(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, libc::SIGKILL) == 0 }
}

#[cfg(unix)]
fn graceful_terminate(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) == 0 }
}

#[cfg(unix)]
fn kill_hard(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, libc::SIGKILL) == 0 }
}

//! Plain-text rendering of listings, search results and prompts.
//!
//! Output is plain text; markup escaping and message chunking belong
//! to the transport.

use crate::format::{format_mtime, format_size};
use crate::fs::{
    DirEntry, EntryKind, ListOutcome, SearchMatchKind, SearchOutcome, DOWNLOAD_LIMIT,
};
use crate::session::RunningApp;

pub const GREETING: &str = "Remote control agent online.\nUse /login to authenticate, /help for the command list.";

pub const REJECTED: &str = "Access denied: this agent only answers its configured operator.";

pub const LOGIN_REQUIRED: &str = "You must log in first. Use /login.";

pub const PASSWORD_PROMPT: &str = "Enter the password:";

pub const WRONG_PASSWORD: &str = "Wrong password! Try again, or /cancel to stop:";

pub const LOGIN_LOCKED: &str = "Too many failed attempts. Use /login to start over.";

pub const LOGIN_OK: &str = "Login successful! Use /help to see what I can do.";

pub const CANCELLED: &str = "Operation cancelled.";

pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";

pub fn help_text() -> String {
    [
        "Available commands:",
        "",
        "Access",
        "  /login - authenticate with the password",
        "  /cancel - abort the current multi-step command",
        "  /stopbot - stop the agent process",
        "",
        "Power",
        "  /shutdown - shut the machine down",
        "  /restart - restart the machine",
        "  /sleep - put the machine to sleep",
        "  /lock - lock the screen",
        "  /cancel_shutdown - abort a scheduled shutdown",
        "",
        "System",
        "  /status - system identity",
        "  /sysinfo - CPU, memory and disk usage",
        "  /battery - battery level",
        "  /processes - top active processes",
        "",
        "Screen & apps",
        "  /screenshot - capture the screen",
        "  /closeapp - close a running application",
        "",
        "Files",
        "  /ls - list the current directory",
        "  /cd - change directory (or pick a drive)",
        "  /download - fetch a file (max 50 MB)",
        "  /mkdir - create a directory",
        "  /delete - delete a file or directory",
        "  /search - search file names recursively",
        "  (send me a file to upload it to the current directory)",
        "",
        "Camera",
        "  /webcam - take a webcam photo",
        "  /webcamvideo - record a 10-second clip",
        "  /detectdevices - list capture devices",
    ]
    .join("\n")
}

/// Render a listing: the volume table from the symbolic root, a
/// directory table otherwise.
pub fn listing(outcome: &ListOutcome) -> String {
    match outcome {
        ListOutcome::Volumes(volumes) => {
            let mut out = String::from("Available drives:\n");
            for v in volumes {
                match &v.capacity {
                    Some(c) => out.push_str(&format!(
                        "  {}  {} free of {}\n",
                        v.name,
                        format_size(c.free),
                        format_size(c.total)
                    )),
                    None => out.push_str(&format!("  {}  (not accessible)\n", v.name)),
                }
            }
            out.push_str("\nUse /cd to enter a drive.");
            out
        }
        ListOutcome::Directory { path, entries } => {
            let mut out = format!("Current directory: {}\n", path.display());
            let item_count = entries
                .iter()
                .filter(|e| e.kind != EntryKind::Parent)
                .count();
            out.push_str(&format!("Items: {}\n\n", item_count));
            for entry in entries {
                out.push_str(&entry_line(entry));
                out.push('\n');
            }
            out.pop();
            out
        }
    }
}

fn entry_line(entry: &DirEntry) -> String {
    match &entry.kind {
        EntryKind::Parent => "..  (parent directory)".to_string(),
        EntryKind::Directory => format!("{}/", entry.name),
        EntryKind::File { size, modified } => match modified {
            Some(t) => format!("{}  ({}, {})", entry.name, format_size(*size), format_mtime(*t)),
            None => format!("{}  ({})", entry.name, format_size(*size)),
        },
        EntryKind::Inaccessible => format!("{}  (access denied)", entry.name),
    }
}

/// Render a search result set, with the truncation notice when the
/// traversal stopped at the cap.
pub fn search_results(outcome: &SearchOutcome) -> String {
    if outcome.matches.is_empty() {
        return format!("No matches for '{}'.", outcome.pattern);
    }
    let mut out = format!(
        "Found {} match(es) for '{}':\n",
        outcome.total_found(),
        outcome.pattern
    );
    for m in &outcome.matches {
        match &m.kind {
            SearchMatchKind::Directory => {
                out.push_str(&format!("  {}/\n", m.relative_path.display()))
            }
            SearchMatchKind::File { size: Some(size) } => out.push_str(&format!(
                "  {}  ({})\n",
                m.relative_path.display(),
                format_size(*size)
            )),
            SearchMatchKind::File { size: None } => {
                out.push_str(&format!("  {}\n", m.relative_path.display()))
            }
        }
    }
    if outcome.truncated {
        out.push_str("\nSearch stopped: too many matches, showing the first 1000.");
    } else {
        out.pop();
    }
    out
}

/// Render the numbered window snapshot for the close-application flow.
pub fn app_choices(apps: &[RunningApp]) -> String {
    let mut out = String::from("Running applications:\n");
    for (i, app) in apps.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} ({}, pid {})\n",
            i + 1,
            app.window_title,
            app.process_name,
            app.pid
        ));
    }
    out.push_str("\nReply with a number to close that application, or /cancel.");
    out
}

pub fn critical_warning(app: &RunningApp) -> String {
    format!(
        "'{}' is a critical system process. Closing it may destabilize the machine.\nReply y to close it anyway, or n to abort.",
        app.process_name
    )
}

pub fn too_large_notice() -> String {
    format!(
        "File too large! The download limit is {}.",
        format_size(DOWNLOAD_LIMIT)
    )
}

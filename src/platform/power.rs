//! Power control actions.

use std::time::Duration;

use tracing::info;

use super::exec::run_ok;
use crate::Result;

const POWER_TIMEOUT: Duration = Duration::from_secs(10);

/// Single-shot power commands. No confirmation step: the operator has
/// already authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Restart,
    Sleep,
    Lock,
    CancelShutdown,
}

impl PowerAction {
    pub fn describe(&self) -> &'static str {
        match self {
            PowerAction::Shutdown => "shutdown",
            PowerAction::Restart => "restart",
            PowerAction::Sleep => "sleep",
            PowerAction::Lock => "lock",
            PowerAction::CancelShutdown => "cancel shutdown",
        }
    }
}

/// Execute a power action through the host OS.
pub fn perform(action: PowerAction) -> Result<()> {
    info!(action = action.describe(), "power action");
    let (program, args) = command_for(action);
    run_ok(program, args, POWER_TIMEOUT)?;
    Ok(())
}

#[cfg(windows)]
fn command_for(action: PowerAction) -> (&'static str, &'static [&'static str]) {
    match action {
        PowerAction::Shutdown => ("shutdown", &["/s", "/t", "0"]),
        PowerAction::Restart => ("shutdown", &["/r", "/t", "0"]),
        PowerAction::Sleep => (
            "powershell.exe",
            &[
                "-Command",
                "Add-Type -AssemblyName System.Windows.Forms; [System.Windows.Forms.Application]::SetSuspendState('Suspend', $false, $false)",
            ],
        ),
        PowerAction::Lock => ("rundll32.exe", &["user32.dll,LockWorkStation"]),
        PowerAction::CancelShutdown => ("shutdown", &["/a"]),
    }
}

#[cfg(unix)]
fn command_for(action: PowerAction) -> (&'static str, &'static [&'static str]) {
    match action {
        PowerAction::Shutdown => ("systemctl", &["poweroff"]),
        PowerAction::Restart => ("systemctl", &["reboot"]),
        PowerAction::Sleep => ("systemctl", &["suspend"]),
        PowerAction::Lock => ("loginctl", &["lock-session"]),
        PowerAction::CancelShutdown => ("shutdown", &["-c"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(PowerAction::Shutdown.describe(), "shutdown");
        assert_eq!(PowerAction::CancelShutdown.describe(), "cancel shutdown");
    }

    #[test]
    fn test_command_table_covers_all_actions() {
        for action in [
            PowerAction::Shutdown,
            PowerAction::Restart,
            PowerAction::Sleep,
            PowerAction::Lock,
            PowerAction::CancelShutdown,
        ] {
            let (program, _args) = command_for(action);
            assert!(!program.is_empty());
        }
    }
}

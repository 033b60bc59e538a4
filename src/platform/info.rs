//! Read-only system diagnostics, rendered as plain text.
//!
//! Each report is assembled from opaque host probes; a failed probe
//! degrades its section to "unavailable" instead of failing the whole
//! report.

use std::time::Duration;

use super::exec::run_with_timeout;
use crate::format::format_size;
use crate::Result;

const INFO_TIMEOUT: Duration = Duration::from_secs(10);

/// Basic system identity: OS, host name, version, architecture.
pub fn system_status() -> Result<String> {
    let mut out = String::from("System Information\n");
    out.push_str(&format!("OS: {}\n", std::env::consts::OS));
    out.push_str(&format!("Computer Name: {}\n", hostname()));
    out.push_str(&format!("OS Version: {}\n", os_version()));
    out.push_str(&format!("Architecture: {}", std::env::consts::ARCH));
    Ok(out)
}

fn hostname() -> String {
    for var in ["COMPUTERNAME", "HOSTNAME"] {
        if let Ok(name) = std::env::var(var) {
            if !name.is_empty() {
                return name;
            }
        }
    }
    run_with_timeout("hostname", &[], INFO_TIMEOUT)
        .map(|o| o.stdout.trim().to_string())
        .unwrap_or_else(|_| "unknown".into())
}

#[cfg(unix)]
fn os_version() -> String {
    run_with_timeout("uname", &["-sr"], INFO_TIMEOUT)
        .map(|o| o.stdout.trim().to_string())
        .unwrap_or_else(|_| "unavailable".into())
}

#[cfg(windows)]
fn os_version() -> String {
    run_with_timeout("cmd", &["/c", "ver"], INFO_TIMEOUT)
        .map(|o| o.stdout.trim().to_string())
        .unwrap_or_else(|_| "unavailable".into())
}

/// CPU load, memory, and disk usage report.
pub fn system_resources() -> Result<String> {
    let mut out = String::from("System Resources\n");
    out.push_str(&format!("CPU: {}\n", cpu_summary()));
    out.push_str(&format!("Memory: {}\n", memory_summary()));
    out.push_str(&format!("Disk: {}", disk_summary()));
    Ok(out)
}

#[cfg(unix)]
fn cpu_summary() -> String {
    std::fs::read_to_string("/proc/loadavg")
        .ok()
        .and_then(|s| s.split_whitespace().next().map(|l| format!("load {}", l)))
        .unwrap_or_else(|| "unavailable".into())
}

#[cfg(windows)]
fn cpu_summary() -> String {
    run_with_timeout("wmic", &["cpu", "get", "loadpercentage", "/value"], INFO_TIMEOUT)
        .ok()
        .and_then(|o| {
            o.stdout
                .lines()
                .find_map(|l| l.trim().strip_prefix("LoadPercentage=").map(String::from))
        })
        .map(|p| format!("{}% load", p))
        .unwrap_or_else(|| "unavailable".into())
}

#[cfg(unix)]
fn memory_summary() -> String {
    let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") else {
        return "unavailable".into();
    };
    let field = |key: &str| -> Option<u64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(key))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kib| kib * 1024)
    };
    match (field("MemTotal:"), field("MemAvailable:")) {
        (Some(total), Some(available)) => format!(
            "{} used / {} total",
            format_size(total.saturating_sub(available)),
            format_size(total)
        ),
        _ => "unavailable".into(),
    }
}

#[cfg(windows)]
fn memory_summary() -> String {
    run_with_timeout(
        "wmic",
        &["OS", "get", "FreePhysicalMemory,TotalVisibleMemorySize", "/value"],
        INFO_TIMEOUT,
    )
    .ok()
    .and_then(|o| {
        let field = |key: &str| -> Option<u64> {
            o.stdout
                .lines()
                .find_map(|l| l.trim().strip_prefix(key))
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|kib| kib * 1024)
        };
        let free = field("FreePhysicalMemory=")?;
        let total = field("TotalVisibleMemorySize=")?;
        Some(format!(
            "{} used / {} total",
            format_size(total.saturating_sub(free)),
            format_size(total)
        ))
    })
    .unwrap_or_else(|| "unavailable".into())
}

#[cfg(unix)]
fn disk_summary() -> String {
    run_with_timeout("df", &["-kP", "/"], INFO_TIMEOUT)
        .ok()
        .and_then(|o| {
            let line = o.stdout.lines().nth(1)?;
            let mut cols = line.split_whitespace();
            let total: u64 = cols.nth(1)?.parse().ok()?;
            let used: u64 = cols.next()?.parse().ok()?;
            Some(format!(
                "{} used / {} total",
                format_size(used * 1024),
                format_size(total * 1024)
            ))
        })
        .unwrap_or_else(|| "unavailable".into())
}

#[cfg(windows)]
fn disk_summary() -> String {
    run_with_timeout(
        "wmic",
        &["logicaldisk", "get", "FreeSpace,Size", "/value"],
        INFO_TIMEOUT,
    )
    .ok()
    .and_then(|o| {
        let mut free = 0u64;
        let mut total = 0u64;
        for line in o.stdout.lines() {
            let line = line.trim();
            if let Some(v) = line.strip_prefix("FreeSpace=") {
                free += v.parse::<u64>().unwrap_or(0);
            } else if let Some(v) = line.strip_prefix("Size=") {
                total += v.parse::<u64>().unwrap_or(0);
            }
        }
        if total == 0 {
            return None;
        }
        Some(format!(
            "{} used / {} total",
            format_size(total.saturating_sub(free)),
            format_size(total)
        ))
    })
    .unwrap_or_else(|| "unavailable".into())
}

/// Battery level and charging state. Machines without a battery get a
/// plain notice, not an error.
pub fn battery() -> Result<String> {
    match battery_reading() {
        Some((percent, state)) => Ok(format!(
            "Battery Status\nLevel: {}%\nStatus: {}",
            percent, state
        )),
        None => Ok("No battery detected (desktop PC?)".into()),
    }
}

#[cfg(unix)]
fn battery_reading() -> Option<(u32, String)> {
    let entries = std::fs::read_dir("/sys/class/power_supply").ok()?;
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with("BAT") {
            continue;
        }
        let base = entry.path();
        let percent = std::fs::read_to_string(base.join("capacity"))
            .ok()?
            .trim()
            .parse::<u32>()
            .ok()?;
        let state = std::fs::read_to_string(base.join("status"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "Unknown".into());
        return Some((percent, state));
    }
    None
}

#[cfg(windows)]
fn battery_reading() -> Option<(u32, String)> {
    let output = run_with_timeout(
        "wmic",
        &["path", "Win32_Battery", "get", "EstimatedChargeRemaining,BatteryStatus", "/value"],
        INFO_TIMEOUT,
    )
    .ok()?;
    let field = |key: &str| -> Option<String> {
        output
            .stdout
            .lines()
            .find_map(|l| l.trim().strip_prefix(key).map(String::from))
    };
    let percent = field("EstimatedChargeRemaining=")?.parse().ok()?;
    let state = match field("BatteryStatus=")?.as_str() {
        "2" => "Plugged In".to_string(),
        "1" => "On Battery".to_string(),
        other => format!("Status code {}", other),
    };
    Some((percent, state))
}

/// Top active processes by CPU usage.
pub fn top_processes() -> Result<String> {
    let body = process_table()?;
    Ok(format!("Top Active Processes\n{}", body))
}

#[cfg(unix)]
fn process_table() -> Result<String> {
    let output = run_with_timeout(
        "ps",
        &["-eo", "pid,comm,%cpu,%mem", "--sort=-%cpu"],
        INFO_TIMEOUT,
    )?;
    Ok(output
        .stdout
        .lines()
        .skip(1)
        .take(10)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(windows)]
fn process_table() -> Result<String> {
    let output = run_with_timeout("tasklist", &["/fo", "csv", "/nh"], INFO_TIMEOUT)?;
    Ok(output
        .stdout
        .lines()
        .take(10)
        .map(|l| l.replace('"', ""))
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_status_mentions_os() {
        let status = system_status().unwrap();
        assert!(status.contains("OS:"));
        assert!(status.contains(std::env::consts::ARCH));
    }

    #[test]
    fn test_system_resources_has_sections() {
        let report = system_resources().unwrap();
        assert!(report.contains("CPU:"));
        assert!(report.contains("Memory:"));
        assert!(report.contains("Disk:"));
    }

    #[test]
    fn test_battery_never_errors() {
        // With or without a battery, the report is a plain message.
        let report = battery().unwrap();
        assert!(report.contains("Battery") || report.contains("No battery"));
    }
}

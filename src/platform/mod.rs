//! Privileged host actions behind a trait seam.
//!
//! Every OS-facing action the protocol can trigger (power, capture,
//! diagnostics, process termination) is an opaque, deadline-bounded
//! call. The [`HostActions`] trait is the seam the dispatcher depends
//! on, so protocol tests run against a fake host.

pub mod capture;
mod exec;
mod info;
mod power;
mod process;

pub use capture::{CapturedMedia, RecordedVideo, VideoTier};
pub use exec::{run_ok, run_with_timeout, ExecOutput};
pub use power::PowerAction;
pub use process::{is_critical, TerminationMethod, CRITICAL_PROCESSES};

use crate::session::RunningApp;
use crate::Result;

/// The privileged operations the command protocol can invoke.
///
/// All methods are blocking calls bounded by fixed timeouts; a timeout
/// surfaces as `ActionTimeout`, never a hang.
pub trait HostActions {
    /// Execute a power action (shutdown, restart, sleep, lock, cancel).
    fn power(&self, action: PowerAction) -> Result<()>;

    /// Basic system identity report.
    fn system_status(&self) -> Result<String>;

    /// CPU, memory and disk usage report.
    fn system_resources(&self) -> Result<String>;

    /// Battery level report.
    fn battery(&self) -> Result<String>;

    /// Top active processes report.
    fn top_processes(&self) -> Result<String>;

    /// Snapshot of visible top-level windows.
    fn running_apps(&self) -> Result<Vec<RunningApp>>;

    /// Ordered-method termination of a snapshot entry.
    fn terminate_app(&self, app: &RunningApp) -> Result<TerminationMethod>;

    /// Screen capture to a temp file.
    fn screenshot(&self) -> Result<CapturedMedia>;

    /// Single webcam frame to a temp file.
    fn webcam_photo(&self) -> Result<CapturedMedia>;

    /// 10-second webcam clip with three-tier fallback.
    fn webcam_video(&self) -> Result<RecordedVideo>;

    /// Capture device enumeration.
    fn detect_devices(&self) -> Result<String>;
}

/// Production host backed by the local operating system.
#[derive(Debug, Clone)]
pub struct SystemHost {
    video_device: String,
    audio_device: String,
}

impl SystemHost {
    pub fn new(video_device: impl Into<String>, audio_device: impl Into<String>) -> Self {
        Self {
            video_device: video_device.into(),
            audio_device: audio_device.into(),
        }
    }
}

impl HostActions for SystemHost {
    fn power(&self, action: PowerAction) -> Result<()> {
        power::perform(action)
    }

    fn system_status(&self) -> Result<String> {
        info::system_status()
    }

    fn system_resources(&self) -> Result<String> {
        info::system_resources()
    }

    fn battery(&self) -> Result<String> {
        info::battery()
    }

    fn top_processes(&self) -> Result<String> {
        info::top_processes()
    }

    fn running_apps(&self) -> Result<Vec<RunningApp>> {
        process::running_apps()
    }

    fn terminate_app(&self, app: &RunningApp) -> Result<TerminationMethod> {
        process::terminate(app)
    }

    fn screenshot(&self) -> Result<CapturedMedia> {
        capture::screenshot()
    }

    fn webcam_photo(&self) -> Result<CapturedMedia> {
        capture::webcam_photo(&self.video_device)
    }

    fn webcam_video(&self) -> Result<RecordedVideo> {
        capture::webcam_video(&self.video_device, &self.audio_device)
    }

    fn detect_devices(&self) -> Result<String> {
        capture::detect_devices()
    }
}

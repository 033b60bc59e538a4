//! Command-name recognition.

/// The agent's command surface.
///
/// Recognition is exact and case-sensitive; anything else is left to
/// the presentation layer's default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // Meta
    Start,
    Help,
    StopBot,
    Login,
    Cancel,
    // Power
    Shutdown,
    Restart,
    Sleep,
    Lock,
    CancelShutdown,
    // Info
    Status,
    SysInfo,
    Battery,
    Processes,
    // Monitoring
    Screenshot,
    CloseApp,
    // File manager
    Ls,
    Cd,
    Download,
    Mkdir,
    Delete,
    Search,
    // Camera
    Webcam,
    WebcamVideo,
    DetectDevices,
}

impl Command {
    /// Parse a message as a command name. Exact, case-sensitive match.
    pub fn parse(text: &str) -> Option<Command> {
        let cmd = match text {
            "/start" => Command::Start,
            "/help" => Command::Help,
            "/stopbot" => Command::StopBot,
            "/login" => Command::Login,
            "/cancel" => Command::Cancel,
            "/shutdown" => Command::Shutdown,
            "/restart" => Command::Restart,
            "/sleep" => Command::Sleep,
            "/lock" => Command::Lock,
            "/cancel_shutdown" => Command::CancelShutdown,
            "/status" => Command::Status,
            "/sysinfo" => Command::SysInfo,
            "/battery" => Command::Battery,
            "/processes" => Command::Processes,
            "/screenshot" => Command::Screenshot,
            "/closeapp" => Command::CloseApp,
            "/ls" => Command::Ls,
            "/cd" => Command::Cd,
            "/download" => Command::Download,
            "/mkdir" => Command::Mkdir,
            "/delete" => Command::Delete,
            "/search" => Command::Search,
            "/webcam" => Command::Webcam,
            "/webcamvideo" => Command::WebcamVideo,
            "/detectdevices" => Command::DetectDevices,
            _ => return None,
        };
        Some(cmd)
    }

    /// Whether the command requires prior authentication. The
    /// principal check always applies regardless.
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Command::Start | Command::Help | Command::Login | Command::Cancel
        )
    }
}

//! In-flight multi-step command state.

/// Snapshot entry for the close-application flow: one visible
/// top-level window. Valid only for the lifetime of the app-choice
/// step that produced it; the snapshot is discarded when the step
/// resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningApp {
    pub pid: u32,
    pub window_title: String,
    pub process_name: String,
}

/// The one multi-turn command a session may have outstanding.
///
/// Entering a new multi-turn command replaces any previous pending
/// command; the protocol makes that replacement explicit in its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCommand {
    /// Login flow; counts consecutive failures for the retry bound.
    AwaitingPassword { attempts: u32 },
    /// `/cd` awaiting the target path fragment.
    AwaitingNewLocation,
    /// `/download` awaiting the file name.
    AwaitingDownloadName,
    /// `/mkdir` awaiting the directory name.
    AwaitingNewDirectoryName,
    /// `/delete` awaiting the item name.
    AwaitingDeleteName,
    /// `/search` awaiting the pattern.
    AwaitingSearchPattern,
    /// `/closeapp` awaiting a 1-based index into the window snapshot.
    /// `confirm` holds the chosen index when a critical process needs
    /// an explicit second pass.
    AwaitingAppChoice {
        apps: Vec<RunningApp>,
        confirm: Option<usize>,
    },
}

impl PendingCommand {
    /// Short name used in cancellation notices.
    pub fn describe(&self) -> &'static str {
        match self {
            PendingCommand::AwaitingPassword { .. } => "login",
            PendingCommand::AwaitingNewLocation => "change directory",
            PendingCommand::AwaitingDownloadName => "download",
            PendingCommand::AwaitingNewDirectoryName => "create directory",
            PendingCommand::AwaitingDeleteName => "delete",
            PendingCommand::AwaitingSearchPattern => "search",
            PendingCommand::AwaitingAppChoice { .. } => "close application",
        }
    }
}

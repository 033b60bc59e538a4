//! The command protocol: one inbound message in, replies out.
//!
//! The dispatcher owns the sessions, the path resolver and the host
//! action seam. Messages are handled one at a time; every protected
//! entry point re-checks the authorization gate, and the reply to a
//! failed capability action always returns the session to the idle
//! step.

use tracing::{debug, info, warn};

use super::command::Command;
use super::outbound::{DispatchResult, Inbound, Outbound, Payload};
use super::render;
use crate::auth::{self, Access};
use crate::error::AgentError;
use crate::format::format_size;
use crate::fs::{ops, Deleted, Location, PathResolver, VolumeProvider};
use crate::platform::{is_critical, HostActions, PowerAction, TerminationMethod};
use crate::session::{ChatId, PendingCommand, RunningApp, Session, SessionStore};
use crate::Result;

/// Consecutive wrong passwords allowed before the login flow aborts.
const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Protocol state machine over a host-action seam and a volume
/// provider. Generic so tests drive it with a fake host and fixture
/// volumes.
pub struct Dispatcher<H: HostActions, V: VolumeProvider> {
    principal: ChatId,
    password: String,
    host: H,
    resolver: PathResolver<V>,
    sessions: SessionStore,
}

impl<H: HostActions, V: VolumeProvider> Dispatcher<H, V> {
    pub fn new(principal: ChatId, password: impl Into<String>, host: H, volumes: V) -> Self {
        Self {
            principal,
            password: password.into(),
            host,
            resolver: PathResolver::new(volumes),
            sessions: SessionStore::new(),
        }
    }

    /// Session lookup, mainly for assertions in tests.
    pub fn session(&self, id: ChatId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Handle one inbound event and produce the replies for it.
    pub fn dispatch(&mut self, inbound: Inbound) -> DispatchResult {
        let caller = inbound.caller;
        debug!(%caller, "inbound message");

        // Work on a scratch copy so handlers can borrow the dispatcher
        // immutably; commit the session back afterwards.
        let mut session = self.sessions.get_or_create(caller).clone();
        let result = self.handle(caller, inbound.payload, &mut session);
        *self.sessions.get_or_create(caller) = session;
        result
    }

    fn handle(&self, caller: ChatId, payload: Payload, session: &mut Session) -> DispatchResult {
        if !auth::is_principal(self.principal, caller) {
            warn!(%caller, "message from unknown chat rejected");
            return self.error_reply(AgentError::NotAuthorized);
        }

        match payload {
            Payload::Document { file_name, data } => {
                self.handle_upload(session, &file_name, &data)
            }
            Payload::Text(text) => {
                let trimmed = text.trim();
                if let Some(cmd) = Command::parse(trimmed) {
                    return self.handle_command(caller, session, cmd);
                }
                if session.pending.is_some() {
                    return self.handle_pending(session, trimmed);
                }
                if trimmed.starts_with('/') {
                    return DispatchResult::reply("Unknown command. Use /help.");
                }
                DispatchResult::silent()
            }
        }
    }

    fn handle_command(
        &self,
        caller: ChatId,
        session: &mut Session,
        cmd: Command,
    ) -> DispatchResult {
        // /cancel works in every state, including a stuck login prompt.
        if cmd == Command::Cancel {
            return match session.clear_pending() {
                Some(_) => DispatchResult::reply(render::CANCELLED),
                None => DispatchResult::reply(render::NOTHING_TO_CANCEL),
            };
        }

        if cmd.requires_auth() {
            if let Access::Denied(_) = auth::authorize(self.principal, caller, session) {
                warn!(%caller, ?cmd, "command before login");
                return DispatchResult::reply(render::LOGIN_REQUIRED);
            }
        }

        // A fresh command replaces any in-flight multi-turn command;
        // the replacement is announced, never silent. Restarting the
        // login prompt itself is not worth a notice.
        let notice = match session.clear_pending() {
            Some(PendingCommand::AwaitingPassword { .. }) if cmd == Command::Login => None,
            Some(prev) => Some(format!("Cancelled the pending {} step.", prev.describe())),
            None => None,
        };

        let mut result = match cmd {
            Command::Start => DispatchResult::reply(render::GREETING),
            Command::Help => DispatchResult::reply(render::help_text()),
            Command::StopBot => {
                info!("stop requested by operator");
                DispatchResult::shutdown("Stopping the agent. Bye.")
            }
            Command::Login => {
                session.pending = Some(PendingCommand::AwaitingPassword { attempts: 0 });
                DispatchResult::reply(render::PASSWORD_PROMPT)
            }
            Command::Cancel => unreachable!("handled above"),

            Command::Shutdown => self.power(PowerAction::Shutdown),
            Command::Restart => self.power(PowerAction::Restart),
            Command::Sleep => self.power(PowerAction::Sleep),
            Command::Lock => self.power(PowerAction::Lock),
            Command::CancelShutdown => self.power(PowerAction::CancelShutdown),

            Command::Status => self.text_action(self.host.system_status()),
            Command::SysInfo => self.text_action(self.host.system_resources()),
            Command::Battery => self.text_action(self.host.battery()),
            Command::Processes => self.text_action(self.host.top_processes()),

            Command::Screenshot => match self.host.screenshot() {
                Ok(media) => DispatchResult::replies(vec![Outbound::Photo {
                    path: media.path,
                    caption: "Screenshot".into(),
                }]),
                Err(e) => self.error_reply(e),
            },
            Command::Webcam => match self.host.webcam_photo() {
                Ok(media) => DispatchResult::replies(vec![Outbound::Photo {
                    path: media.path,
                    caption: "Webcam photo".into(),
                }]),
                Err(e) => self.error_reply(e),
            },
            Command::WebcamVideo => match self.host.webcam_video() {
                Ok(video) => DispatchResult::replies(vec![Outbound::Video {
                    path: video.media.path,
                    caption: format!("Webcam clip ({})", video.tier),
                }]),
                Err(e) => self.error_reply(e),
            },
            Command::DetectDevices => self.text_action(self.host.detect_devices()),

            Command::CloseApp => match self.host.running_apps() {
                Ok(apps) if apps.is_empty() => {
                    DispatchResult::reply("No running applications found.")
                }
                Ok(apps) => {
                    let text = render::app_choices(&apps);
                    session.pending = Some(PendingCommand::AwaitingAppChoice {
                        apps,
                        confirm: None,
                    });
                    DispatchResult::reply(text)
                }
                Err(e) => self.error_reply(e),
            },

            Command::Ls => match self.listing_for(&session.location) {
                Ok(text) => DispatchResult::reply(text),
                Err(e) => self.error_reply(e),
            },
            Command::Cd => {
                session.pending = Some(PendingCommand::AwaitingNewLocation);
                self.prompt_with_listing(
                    session,
                    "Type the target: a drive name (C:), a folder, a path, .., or / for the drive list.",
                )
            }
            Command::Download => match self.require_volume(session) {
                Some(denied) => denied,
                None => {
                    session.pending = Some(PendingCommand::AwaitingDownloadName);
                    self.prompt_with_listing(session, "Type the name of the file to download:")
                }
            },
            Command::Mkdir => match self.require_volume(session) {
                Some(denied) => denied,
                None => {
                    session.pending = Some(PendingCommand::AwaitingNewDirectoryName);
                    DispatchResult::reply("Type the name of the directory to create:")
                }
            },
            Command::Delete => match self.require_volume(session) {
                Some(denied) => denied,
                None => {
                    session.pending = Some(PendingCommand::AwaitingDeleteName);
                    self.prompt_with_listing(
                        session,
                        "Type the name of the file or directory to delete. Directories are deleted with everything in them.",
                    )
                }
            },
            Command::Search => match self.require_volume(session) {
                Some(denied) => denied,
                None => {
                    session.pending = Some(PendingCommand::AwaitingSearchPattern);
                    DispatchResult::reply("Type the name (or part of it) to search for:")
                }
            },
        };

        if let Some(notice) = notice {
            result.replies.insert(0, Outbound::Text(notice));
        }
        result
    }

    fn handle_pending(&self, session: &mut Session, text: &str) -> DispatchResult {
        // The bare word works as well as the command.
        if text.eq_ignore_ascii_case("cancel") {
            session.clear_pending();
            return DispatchResult::reply(render::CANCELLED);
        }

        let Some(pending) = session.clear_pending() else {
            return DispatchResult::silent();
        };

        match pending {
            PendingCommand::AwaitingPassword { attempts } => {
                if text == self.password {
                    session.authenticated = true;
                    info!("operator authenticated");
                    DispatchResult::reply(render::LOGIN_OK)
                } else {
                    // A mismatch revokes any existing authentication; a
                    // re-login is all-or-nothing.
                    session.authenticated = false;
                    let attempts = attempts + 1;
                    warn!(attempts, "failed login attempt");
                    if attempts >= MAX_LOGIN_ATTEMPTS {
                        DispatchResult::reply(render::LOGIN_LOCKED)
                    } else {
                        session.pending =
                            Some(PendingCommand::AwaitingPassword { attempts });
                        self.error_reply(AgentError::AuthenticationFailed)
                    }
                }
            }

            PendingCommand::AwaitingNewLocation => {
                match self.resolver.resolve(&session.location, text) {
                    Ok(location) => {
                        session.location = location;
                        match self.listing_for(&session.location) {
                            Ok(listing) => DispatchResult::reply(listing),
                            Err(e) => self.error_reply(e),
                        }
                    }
                    Err(e) => self.error_reply(e),
                }
            }

            PendingCommand::AwaitingDownloadName => {
                match ops::prepare_download(&session.location, text) {
                    Ok(file) => {
                        info!(name = %file.name, size = file.size, "sending file");
                        let caption = format!("{} ({})", file.name, format_size(file.size));
                        DispatchResult::replies(vec![Outbound::Document {
                            path: file.path,
                            file_name: file.name,
                            caption,
                        }])
                    }
                    Err(e) => self.error_reply(e),
                }
            }

            PendingCommand::AwaitingNewDirectoryName => {
                match ops::create_dir(&session.location, text) {
                    Ok(_) => self
                        .with_refreshed_listing(session, format!("Directory created: {}", text)),
                    Err(e) => self.error_reply(e),
                }
            }

            PendingCommand::AwaitingDeleteName => match ops::delete(&session.location, text) {
                Ok(Deleted::File) => {
                    self.with_refreshed_listing(session, format!("File deleted: {}", text))
                }
                Ok(Deleted::Directory) => {
                    self.with_refreshed_listing(session, format!("Directory deleted: {}", text))
                }
                Err(e) => self.error_reply(e),
            },

            PendingCommand::AwaitingSearchPattern => match ops::search(&session.location, text) {
                Ok(outcome) => DispatchResult::reply(render::search_results(&outcome)),
                Err(e) => self.error_reply(e),
            },

            PendingCommand::AwaitingAppChoice { apps, confirm } => {
                self.handle_app_choice(session, text, apps, confirm)
            }
        }
    }

    fn handle_app_choice(
        &self,
        session: &mut Session,
        text: &str,
        apps: Vec<RunningApp>,
        confirm: Option<usize>,
    ) -> DispatchResult {
        if let Some(idx) = confirm {
            return match text.to_ascii_lowercase().as_str() {
                "y" | "yes" => self.terminate_reply(&apps[idx]),
                "n" | "no" => DispatchResult::reply(render::CANCELLED),
                _ => {
                    session.pending = Some(PendingCommand::AwaitingAppChoice {
                        apps,
                        confirm: Some(idx),
                    });
                    DispatchResult::reply("Reply y or n, or /cancel.")
                }
            };
        }

        match text.parse::<usize>() {
            Ok(n) if n >= 1 && n <= apps.len() => {
                let idx = n - 1;
                if is_critical(&apps[idx].process_name) {
                    let warning = render::critical_warning(&apps[idx]);
                    session.pending = Some(PendingCommand::AwaitingAppChoice {
                        apps,
                        confirm: Some(idx),
                    });
                    DispatchResult::reply(warning)
                } else {
                    self.terminate_reply(&apps[idx])
                }
            }
            _ => {
                let hint = format!(
                    "Invalid choice. Reply with a number between 1 and {}, or /cancel.",
                    apps.len()
                );
                session.pending = Some(PendingCommand::AwaitingAppChoice {
                    apps,
                    confirm: None,
                });
                DispatchResult::reply(hint)
            }
        }
    }

    fn handle_upload(
        &self,
        session: &mut Session,
        file_name: &str,
        data: &[u8],
    ) -> DispatchResult {
        if !session.authenticated {
            return DispatchResult::reply(render::LOGIN_REQUIRED);
        }
        if let Some(prev) = session.clear_pending() {
            let notice = format!("Cancelled the pending {} step.", prev.describe());
            let mut result = self.store_upload_reply(session, file_name, data);
            result.replies.insert(0, Outbound::Text(notice));
            return result;
        }
        self.store_upload_reply(session, file_name, data)
    }

    fn store_upload_reply(
        &self,
        session: &mut Session,
        file_name: &str,
        data: &[u8],
    ) -> DispatchResult {
        if let Some(denied) = self.require_volume(session) {
            return denied;
        }
        match ops::store_upload(&session.location, file_name, data) {
            Ok(_) => {
                info!(name = file_name, bytes = data.len(), "file received");
                self.with_refreshed_listing(
                    session,
                    format!("File uploaded: {} ({})", file_name, format_size(data.len() as u64)),
                )
            }
            Err(e) => self.error_reply(e),
        }
    }

    fn power(&self, action: PowerAction) -> DispatchResult {
        match self.host.power(action) {
            Ok(()) => DispatchResult::reply(format!("Power action started: {}.", action.describe())),
            Err(e) => self.error_reply(e),
        }
    }

    fn terminate_reply(&self, app: &RunningApp) -> DispatchResult {
        match self.host.terminate_app(app) {
            Ok(TerminationMethod::AlreadyExited) => {
                DispatchResult::reply(format!("'{}' had already exited.", app.window_title))
            }
            Ok(method) => {
                info!(pid = app.pid, %method, "application closed");
                DispatchResult::reply(format!("Closed '{}' ({}).", app.window_title, method))
            }
            Err(e) => self.error_reply(e),
        }
    }

    fn text_action(&self, result: Result<String>) -> DispatchResult {
        match result {
            Ok(text) => DispatchResult::reply(text),
            Err(e) => self.error_reply(e),
        }
    }

    /// Listing text for a location, with the parent entry suppressed at
    /// a volume root.
    fn listing_for(&self, location: &Location) -> Result<String> {
        let at_volume_root = match location {
            Location::Root => false,
            Location::Dir(path) => self.resolver.is_volume_root(path),
        };
        let outcome = ops::list(location, self.resolver.provider(), at_volume_root)?;
        Ok(render::listing(&outcome))
    }

    /// Current listing followed by a prompt line, so the operator picks
    /// from what is actually there.
    fn prompt_with_listing(&self, session: &Session, prompt: &str) -> DispatchResult {
        let mut replies = Vec::new();
        if let Ok(listing) = self.listing_for(&session.location) {
            replies.push(Outbound::Text(listing));
        }
        replies.push(Outbound::Text(prompt.to_string()));
        DispatchResult::replies(replies)
    }

    /// Success headline plus a fresh listing, after a mutating action.
    fn with_refreshed_listing(&self, session: &Session, headline: String) -> DispatchResult {
        let mut replies = vec![Outbound::Text(headline)];
        if let Ok(listing) = self.listing_for(&session.location) {
            replies.push(Outbound::Text(listing));
        }
        DispatchResult::replies(replies)
    }

    /// Early rejection for location-relative commands issued from the
    /// symbolic root.
    fn require_volume(&self, session: &Session) -> Option<DispatchResult> {
        if session.location.is_root() {
            Some(DispatchResult::reply(
                "No drive selected. Use /cd to pick one.",
            ))
        } else {
            None
        }
    }

    fn error_reply(&self, err: AgentError) -> DispatchResult {
        let text = match &err {
            AgentError::NotAuthorized => render::REJECTED.to_string(),
            AgentError::AuthenticationFailed => render::WRONG_PASSWORD.to_string(),
            AgentError::VolumeUnavailable(name) => format!("Drive {} is not available.", name),
            AgentError::NoVolumeSelected => {
                "No drive selected. Use /cd to pick one.".to_string()
            }
            AgentError::NotFound(_) => "That path or item does not exist.".to_string(),
            AgentError::AccessDenied => "Access denied by the operating system.".to_string(),
            AgentError::TooLarge { .. } => render::too_large_notice(),
            AgentError::ActionTimeout => "The action timed out.".to_string(),
            AgentError::ActionFailed(_) | AgentError::Io(_) => {
                "The action failed. Check the agent log for details.".to_string()
            }
        };
        warn!(error = %err, "action failed");
        DispatchResult::reply(text)
    }
}

#[cfg(test)]
mod tests {
    use super::super::outbound::Control;
    use super::*;
    use crate::fs::{Volume, VolumeCapacity};
    use crate::platform::{CapturedMedia, RecordedVideo, VideoTier};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const OPERATOR: ChatId = ChatId(100);
    const STRANGER: ChatId = ChatId(200);
    const PASSWORD: &str = "hunter2";

    struct FakeVolumes {
        root: PathBuf,
    }

    impl VolumeProvider for FakeVolumes {
        fn volumes(&self) -> Vec<Volume> {
            vec![Volume {
                name: "C:".into(),
                root: self.root.clone(),
            }]
        }

        fn capacity(&self, _volume: &Volume) -> Option<VolumeCapacity> {
            Some(VolumeCapacity {
                free: 1,
                total: 2,
            })
        }
    }

    #[derive(Default)]
    struct FakeHost {
        apps: Vec<RunningApp>,
        terminated: RefCell<Vec<u32>>,
        power_actions: RefCell<Vec<PowerAction>>,
    }

    impl HostActions for FakeHost {
        fn power(&self, action: PowerAction) -> Result<()> {
            self.power_actions.borrow_mut().push(action);
            Ok(())
        }

        fn system_status(&self) -> Result<String> {
            Ok("status".into())
        }

        fn system_resources(&self) -> Result<String> {
            Ok("resources".into())
        }

        fn battery(&self) -> Result<String> {
            Ok("battery".into())
        }

        fn top_processes(&self) -> Result<String> {
            Ok("processes".into())
        }

        fn running_apps(&self) -> Result<Vec<RunningApp>> {
            Ok(self.apps.clone())
        }

        fn terminate_app(&self, app: &RunningApp) -> Result<TerminationMethod> {
            self.terminated.borrow_mut().push(app.pid);
            Ok(TerminationMethod::GracefulTerminate)
        }

        fn screenshot(&self) -> Result<CapturedMedia> {
            Ok(CapturedMedia {
                path: PathBuf::from("/tmp/shot.png"),
                size: 100,
            })
        }

        fn webcam_photo(&self) -> Result<CapturedMedia> {
            Ok(CapturedMedia {
                path: PathBuf::from("/tmp/cam.jpg"),
                size: 100,
            })
        }

        fn webcam_video(&self) -> Result<RecordedVideo> {
            Ok(RecordedVideo {
                media: CapturedMedia {
                    path: PathBuf::from("/tmp/clip.mp4"),
                    size: 20_000,
                },
                tier: VideoTier::VideoOnly,
            })
        }

        fn detect_devices(&self) -> Result<String> {
            Ok("/dev/video0".into())
        }
    }

    fn fixture() -> (TempDir, Dispatcher<FakeHost, FakeVolumes>) {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("docs")).unwrap();
        std::fs::write(tmp.path().join("readme.txt"), b"hello").unwrap();
        let dispatcher = Dispatcher::new(
            OPERATOR,
            PASSWORD,
            FakeHost::default(),
            FakeVolumes {
                root: tmp.path().to_path_buf(),
            },
        );
        (tmp, dispatcher)
    }

    fn login(dispatcher: &mut Dispatcher<FakeHost, FakeVolumes>) {
        dispatcher.dispatch(Inbound::text(OPERATOR, "/login"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, PASSWORD));
        assert_eq!(r.first_text(), Some(render::LOGIN_OK));
    }

    #[test]
    fn test_stranger_gets_fixed_rejection() {
        let (_tmp, mut dispatcher) = fixture();
        for msg in ["/start", "/login", "/ls", "hello"] {
            let r = dispatcher.dispatch(Inbound::text(STRANGER, msg));
            assert_eq!(r.first_text(), Some(render::REJECTED));
        }
    }

    #[test]
    fn test_protected_command_requires_login() {
        let (_tmp, mut dispatcher) = fixture();
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/ls"));
        assert_eq!(r.first_text(), Some(render::LOGIN_REQUIRED));
    }

    #[test]
    fn test_login_flow_and_retry() {
        let (_tmp, mut dispatcher) = fixture();
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/login"));
        assert_eq!(r.first_text(), Some(render::PASSWORD_PROMPT));

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "wrong"));
        assert_eq!(r.first_text(), Some(render::WRONG_PASSWORD));

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, PASSWORD));
        assert_eq!(r.first_text(), Some(render::LOGIN_OK));
        assert!(dispatcher.session(OPERATOR).unwrap().authenticated);
    }

    #[test]
    fn test_login_locks_after_max_attempts() {
        let (_tmp, mut dispatcher) = fixture();
        dispatcher.dispatch(Inbound::text(OPERATOR, "/login"));
        for _ in 0..MAX_LOGIN_ATTEMPTS - 1 {
            let r = dispatcher.dispatch(Inbound::text(OPERATOR, "nope"));
            assert_eq!(r.first_text(), Some(render::WRONG_PASSWORD));
        }
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "nope"));
        assert_eq!(r.first_text(), Some(render::LOGIN_LOCKED));
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());

        // The correct password no longer lands anywhere.
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, PASSWORD));
        assert!(r.replies.is_empty());
        assert!(!dispatcher.session(OPERATOR).unwrap().authenticated);
    }

    #[test]
    fn test_failed_relogin_revokes_authentication() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        assert!(dispatcher.session(OPERATOR).unwrap().authenticated);

        // A mistyped re-login drops the session back to unauthenticated.
        dispatcher.dispatch(Inbound::text(OPERATOR, "/login"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "typo"));
        assert_eq!(r.first_text(), Some(render::WRONG_PASSWORD));
        assert!(!dispatcher.session(OPERATOR).unwrap().authenticated);

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/ls"));
        assert_eq!(r.first_text(), Some(render::LOGIN_REQUIRED));

        // The prompt is still open; the right password recovers.
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, PASSWORD));
        assert_eq!(r.first_text(), Some(render::LOGIN_OK));
        assert!(dispatcher.session(OPERATOR).unwrap().authenticated);
    }

    #[test]
    fn test_ls_at_root_lists_volumes() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/ls"));
        assert!(r.first_text().unwrap().contains("Available drives"));
        assert!(r.first_text().unwrap().contains("C:"));
    }

    #[test]
    fn test_cd_into_volume_then_subdir() {
        let (tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);

        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "C:"));
        let text = r.first_text().unwrap();
        assert!(text.contains("docs/"));
        // No parent entry at the volume root.
        assert!(!text.contains("parent directory"));

        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "docs"));
        let session = dispatcher.session(OPERATOR).unwrap();
        assert_eq!(
            session.location,
            Location::Dir(crate::fs::normalize(&tmp.path().join("docs")))
        );
    }

    #[test]
    fn test_cd_failure_keeps_location() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "C:"));
        let before = dispatcher.session(OPERATOR).unwrap().location.clone();

        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "ghost"));
        assert!(r.first_text().unwrap().contains("does not exist"));
        assert_eq!(dispatcher.session(OPERATOR).unwrap().location, before);
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());
    }

    #[test]
    fn test_parent_from_volume_root_returns_to_drive_list() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "C:"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, ".."));
        assert!(r.first_text().unwrap().contains("Available drives"));
        assert!(dispatcher.session(OPERATOR).unwrap().location.is_root());
    }

    #[test]
    fn test_download_flow_sends_document() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "C:"));

        dispatcher.dispatch(Inbound::text(OPERATOR, "/download"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "readme.txt"));
        match &r.replies[0] {
            Outbound::Document {
                file_name, caption, ..
            } => {
                assert_eq!(file_name, "readme.txt");
                assert!(caption.contains("5 B"));
            }
            other => panic!("expected document, got {:?}", other),
        }
    }

    #[test]
    fn test_download_requires_volume() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/download"));
        assert!(r.first_text().unwrap().contains("No drive selected"));
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());
    }

    #[test]
    fn test_mkdir_and_delete_refresh_listing() {
        let (tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "C:"));

        dispatcher.dispatch(Inbound::text(OPERATOR, "/mkdir"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "fresh"));
        assert!(r.first_text().unwrap().contains("Directory created: fresh"));
        assert!(tmp.path().join("fresh").is_dir());
        // Second reply is the refreshed listing.
        assert!(matches!(&r.replies[1], Outbound::Text(t) if t.contains("fresh/")));

        dispatcher.dispatch(Inbound::text(OPERATOR, "/delete"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "fresh"));
        assert!(r.first_text().unwrap().contains("Directory deleted: fresh"));
        assert!(!tmp.path().join("fresh").exists());
    }

    #[test]
    fn test_search_flow() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "C:"));

        dispatcher.dispatch(Inbound::text(OPERATOR, "/search"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "readme"));
        assert!(r.first_text().unwrap().contains("readme.txt"));
    }

    #[test]
    fn test_cancel_clears_pending() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_some());

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/cancel"));
        assert_eq!(r.first_text(), Some(render::CANCELLED));
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/cancel"));
        assert_eq!(r.first_text(), Some(render::NOTHING_TO_CANCEL));
    }

    #[test]
    fn test_cancel_keyword_inside_prompt() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "cancel"));
        assert_eq!(r.first_text(), Some(render::CANCELLED));
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());
    }

    #[test]
    fn test_new_command_replaces_pending_with_notice() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/status"));
        let notice = r.first_text().unwrap();
        assert!(notice.contains("Cancelled the pending change directory step"));
        assert!(matches!(&r.replies[1], Outbound::Text(t) if t == "status"));
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());
    }

    #[test]
    fn test_closeapp_choice_and_termination() {
        let (tmp, mut dispatcher) = fixture();
        dispatcher.host.apps = vec![
            RunningApp {
                pid: 11,
                window_title: "Editor".into(),
                process_name: "editor.exe".into(),
            },
            RunningApp {
                pid: 22,
                window_title: "Browser".into(),
                process_name: "browser.exe".into(),
            },
        ];
        let _ = tmp;
        login(&mut dispatcher);

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/closeapp"));
        assert!(r.first_text().unwrap().contains("1. Editor"));

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "2"));
        assert!(r.first_text().unwrap().contains("Closed 'Browser'"));
        assert_eq!(*dispatcher.host.terminated.borrow(), vec![22]);
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());
    }

    #[test]
    fn test_closeapp_invalid_choice_reprompts() {
        let (_tmp, mut dispatcher) = fixture();
        dispatcher.host.apps = vec![RunningApp {
            pid: 11,
            window_title: "Editor".into(),
            process_name: "editor.exe".into(),
        }];
        login(&mut dispatcher);

        dispatcher.dispatch(Inbound::text(OPERATOR, "/closeapp"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "seven"));
        assert!(r.first_text().unwrap().contains("Invalid choice"));
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_some());

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "0"));
        assert!(r.first_text().unwrap().contains("Invalid choice"));
    }

    #[test]
    fn test_closeapp_critical_needs_confirmation() {
        let (_tmp, mut dispatcher) = fixture();
        dispatcher.host.apps = vec![RunningApp {
            pid: 33,
            window_title: "Windows Explorer".into(),
            process_name: "explorer.exe".into(),
        }];
        login(&mut dispatcher);

        dispatcher.dispatch(Inbound::text(OPERATOR, "/closeapp"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "1"));
        assert!(r.first_text().unwrap().contains("critical system process"));
        assert!(dispatcher.host.terminated.borrow().is_empty());

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "y"));
        assert!(r.first_text().unwrap().contains("Closed"));
        assert_eq!(*dispatcher.host.terminated.borrow(), vec![33]);
    }

    #[test]
    fn test_closeapp_critical_denied_confirmation() {
        let (_tmp, mut dispatcher) = fixture();
        dispatcher.host.apps = vec![RunningApp {
            pid: 33,
            window_title: "Windows Explorer".into(),
            process_name: "explorer.exe".into(),
        }];
        login(&mut dispatcher);

        dispatcher.dispatch(Inbound::text(OPERATOR, "/closeapp"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "1"));
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "n"));
        assert_eq!(r.first_text(), Some(render::CANCELLED));
        assert!(dispatcher.host.terminated.borrow().is_empty());
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());
    }

    #[test]
    fn test_closeapp_no_windows() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/closeapp"));
        assert!(r.first_text().unwrap().contains("No running applications"));
        assert!(dispatcher.session(OPERATOR).unwrap().pending.is_none());
    }

    #[test]
    fn test_upload_stores_in_current_directory() {
        let (tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        dispatcher.dispatch(Inbound::text(OPERATOR, "/cd"));
        dispatcher.dispatch(Inbound::text(OPERATOR, "C:"));

        let r = dispatcher.dispatch(Inbound::document(OPERATOR, "notes.md", b"abc".to_vec()));
        assert!(r.first_text().unwrap().contains("File uploaded: notes.md"));
        assert_eq!(std::fs::read(tmp.path().join("notes.md")).unwrap(), b"abc");
    }

    #[test]
    fn test_upload_requires_volume() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        let r = dispatcher.dispatch(Inbound::document(OPERATOR, "notes.md", b"abc".to_vec()));
        assert!(r.first_text().unwrap().contains("No drive selected"));
    }

    #[test]
    fn test_single_shot_commands() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/status"));
        assert_eq!(r.first_text(), Some("status"));

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/screenshot"));
        assert!(matches!(&r.replies[0], Outbound::Photo { .. }));

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/webcamvideo"));
        assert!(matches!(&r.replies[0], Outbound::Video { caption, .. } if caption.contains("video only")));

        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/lock"));
        assert!(r.first_text().unwrap().contains("lock"));
        assert_eq!(*dispatcher.host.power_actions.borrow(), vec![PowerAction::Lock]);
    }

    #[test]
    fn test_stopbot_signals_shutdown() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/stopbot"));
        assert_eq!(r.control, Control::Shutdown);
    }

    #[test]
    fn test_unknown_slash_command() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "/teleport"));
        assert!(r.first_text().unwrap().contains("Unknown command"));
    }

    #[test]
    fn test_plain_text_outside_prompt_is_ignored() {
        let (_tmp, mut dispatcher) = fixture();
        login(&mut dispatcher);
        let r = dispatcher.dispatch(Inbound::text(OPERATOR, "hello there"));
        assert!(r.replies.is_empty());
    }
}

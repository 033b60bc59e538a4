//! Shared fixtures: a fake host and a temp-dir-backed volume set.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use telecommand::fs::{Volume, VolumeCapacity};
use telecommand::platform::{CapturedMedia, RecordedVideo, TerminationMethod, VideoTier};
use telecommand::session::{ChatId, RunningApp};
use telecommand::{Dispatcher, HostActions, Result, VolumeProvider};
use tempfile::TempDir;

pub const OPERATOR: ChatId = ChatId(123456789);
pub const STRANGER: ChatId = ChatId(987654321);
pub const PASSWORD: &str = "correct horse";

/// Volume provider mapping the drive name `C:` to a temp directory.
pub struct FixtureVolumes {
    pub root: PathBuf,
}

impl VolumeProvider for FixtureVolumes {
    fn volumes(&self) -> Vec<Volume> {
        vec![Volume {
            name: "C:".into(),
            root: self.root.clone(),
        }]
    }

    fn capacity(&self, _volume: &Volume) -> Option<VolumeCapacity> {
        Some(VolumeCapacity {
            free: 40 * 1024 * 1024 * 1024,
            total: 100 * 1024 * 1024 * 1024,
        })
    }
}

/// Host seam double: canned answers, recorded terminations.
#[derive(Default)]
pub struct MockHost {
    pub apps: Vec<RunningApp>,
    pub terminated: Arc<Mutex<Vec<u32>>>,
}

impl HostActions for MockHost {
    fn power(&self, _action: telecommand::platform::PowerAction) -> Result<()> {
        Ok(())
    }

    fn system_status(&self) -> Result<String> {
        Ok("OS: test\nHostname: fixture".into())
    }

    fn system_resources(&self) -> Result<String> {
        Ok("CPU: 1%\nMemory: 2%".into())
    }

    fn battery(&self) -> Result<String> {
        Ok("Battery: 80%".into())
    }

    fn top_processes(&self) -> Result<String> {
        Ok("1. fixture".into())
    }

    fn running_apps(&self) -> Result<Vec<RunningApp>> {
        Ok(self.apps.clone())
    }

    fn terminate_app(&self, app: &RunningApp) -> Result<TerminationMethod> {
        self.terminated.lock().unwrap().push(app.pid);
        Ok(TerminationMethod::GracefulTerminate)
    }

    fn screenshot(&self) -> Result<CapturedMedia> {
        Ok(CapturedMedia {
            path: PathBuf::from("/tmp/fixture.png"),
            size: 64,
        })
    }

    fn webcam_photo(&self) -> Result<CapturedMedia> {
        Ok(CapturedMedia {
            path: PathBuf::from("/tmp/fixture.jpg"),
            size: 64,
        })
    }

    fn webcam_video(&self) -> Result<RecordedVideo> {
        Ok(RecordedVideo {
            media: CapturedMedia {
                path: PathBuf::from("/tmp/fixture.mp4"),
                size: 32_000,
            },
            tier: VideoTier::AudioVideo,
        })
    }

    fn detect_devices(&self) -> Result<String> {
        Ok("/dev/video0".into())
    }
}

/// Dispatcher over a temp-dir drive seeded with a couple of entries.
pub fn dispatcher_with_host(host: MockHost) -> (TempDir, Dispatcher<MockHost, FixtureVolumes>) {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("projects")).unwrap();
    std::fs::create_dir(tmp.path().join("projects/reports")).unwrap();
    std::fs::write(tmp.path().join("notes.txt"), b"some notes").unwrap();
    std::fs::write(tmp.path().join("projects/plan.md"), b"# plan").unwrap();

    let dispatcher = Dispatcher::new(
        OPERATOR,
        PASSWORD,
        host,
        FixtureVolumes {
            root: tmp.path().to_path_buf(),
        },
    );
    (tmp, dispatcher)
}

pub fn dispatcher() -> (TempDir, Dispatcher<MockHost, FixtureVolumes>) {
    dispatcher_with_host(MockHost::default())
}

/// Drive the login flow to completion.
pub fn login(dispatcher: &mut Dispatcher<MockHost, FixtureVolumes>) {
    use telecommand::Inbound;
    dispatcher.dispatch(Inbound::text(OPERATOR, "/login"));
    let r = dispatcher.dispatch(Inbound::text(OPERATOR, PASSWORD));
    assert!(r.first_text().unwrap().contains("Login successful"));
}

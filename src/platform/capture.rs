//! Screen and camera capture through bounded external tools.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use super::exec::{run_ok, run_with_timeout};
use crate::error::AgentError;
use crate::Result;

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(15);
const VIDEO_TIMEOUT: Duration = Duration::from_secs(20);

/// Recording length for `/webcamvideo`, in seconds.
const VIDEO_SECONDS: &str = "10";

/// An encoded video smaller than this is treated as a failed capture.
const MIN_VIDEO_BYTES: u64 = 10_000;

/// A media file produced by a capture action. The file lives in the
/// OS temp directory; the transport reads it from there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMedia {
    pub path: PathBuf,
    pub size: u64,
}

/// Which fallback tier produced the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoTier {
    AudioVideo,
    VideoOnly,
    RawReencode,
}

impl fmt::Display for VideoTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VideoTier::AudioVideo => "audio+video",
            VideoTier::VideoOnly => "video only",
            VideoTier::RawReencode => "raw capture, re-encoded",
        };
        write!(f, "{}", s)
    }
}

/// A recorded clip plus the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedVideo {
    pub media: CapturedMedia,
    pub tier: VideoTier,
}

fn temp_path(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("telecommand-{}.{}", nanos, ext))
}

fn finish_media(path: PathBuf) -> Result<CapturedMedia> {
    let size = std::fs::metadata(&path)?.len();
    Ok(CapturedMedia { path, size })
}

/// Grab the current screen to a PNG file.
pub fn screenshot() -> Result<CapturedMedia> {
    let path = temp_path("png");
    let path_s = path.display().to_string();
    screenshot_command(&path_s)?;
    info!(path = %path_s, "screenshot captured");
    finish_media(path)
}

#[cfg(windows)]
fn screenshot_command(path: &str) -> Result<()> {
    let script = format!(
        "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
         $b = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds; \
         $bmp = New-Object System.Drawing.Bitmap($b.Width, $b.Height); \
         $g = [System.Drawing.Graphics]::FromImage($bmp); \
         $g.CopyFromScreen($b.Location, [System.Drawing.Point]::Empty, $b.Size); \
         $bmp.Save('{}')",
        path
    );
    run_ok("powershell.exe", &["-Command", &script], CAPTURE_TIMEOUT)?;
    Ok(())
}

#[cfg(unix)]
fn screenshot_command(path: &str) -> Result<()> {
    // First available desktop screenshot tool wins.
    let candidates: [(&str, Vec<&str>); 3] = [
        ("gnome-screenshot", vec!["-f", path]),
        ("import", vec!["-window", "root", path]),
        ("scrot", vec![path]),
    ];
    let mut last = AgentError::ActionFailed("no screenshot tool available".into());
    for (program, args) in candidates {
        match run_ok(program, &args, CAPTURE_TIMEOUT) {
            Ok(_) => return Ok(()),
            Err(e) => last = e,
        }
    }
    Err(last)
}

/// Capture a single webcam frame to a JPEG file.
pub fn webcam_photo(video_device: &str) -> Result<CapturedMedia> {
    let path = temp_path("jpg");
    let path_s = path.display().to_string();
    let input = camera_input(video_device);
    run_ok(
        "ffmpeg",
        &[
            "-f",
            camera_format(),
            "-i",
            &input,
            "-frames:v",
            "1",
            "-y",
            &path_s,
        ],
        CAPTURE_TIMEOUT,
    )?;
    info!(path = %path_s, "webcam frame captured");
    finish_media(path)
}

/// Record a 10-second webcam clip with a three-tier fallback:
/// combined audio+video encode, then video-only encode, then a raw
/// capture re-encoded in a second pass.
pub fn webcam_video(video_device: &str, audio_device: &str) -> Result<RecordedVideo> {
    match record_audio_video(video_device, audio_device) {
        Ok(media) => {
            return Ok(RecordedVideo {
                media,
                tier: VideoTier::AudioVideo,
            })
        }
        Err(e) => warn!(error = %e, "audio+video encode failed, trying video only"),
    }

    match record_video_only(video_device) {
        Ok(media) => {
            return Ok(RecordedVideo {
                media,
                tier: VideoTier::VideoOnly,
            })
        }
        Err(e) => warn!(error = %e, "video-only encode failed, trying raw capture"),
    }

    let media = record_raw_reencode(video_device)?;
    Ok(RecordedVideo {
        media,
        tier: VideoTier::RawReencode,
    })
}

#[cfg(windows)]
fn camera_format() -> &'static str {
    "dshow"
}

#[cfg(unix)]
fn camera_format() -> &'static str {
    "v4l2"
}

#[cfg(windows)]
fn camera_input(video_device: &str) -> String {
    format!("video={}", video_device)
}

#[cfg(unix)]
fn camera_input(video_device: &str) -> String {
    if video_device.starts_with("/dev/") {
        video_device.to_string()
    } else {
        "/dev/video0".to_string()
    }
}

#[cfg(windows)]
fn av_input(video_device: &str, audio_device: &str) -> String {
    format!("video={}:audio={}", video_device, audio_device)
}

#[cfg(unix)]
fn av_input(video_device: &str, _audio_device: &str) -> String {
    camera_input(video_device)
}

/// Encoder flags shared by the first two tiers: widely playable H.264.
const ENCODE_FLAGS: &[&str] = &[
    "-vcodec",
    "libx264",
    "-profile:v",
    "baseline",
    "-level",
    "3.0",
    "-pix_fmt",
    "yuv420p",
    "-preset",
    "medium",
    "-movflags",
    "+faststart",
    "-f",
    "mp4",
    "-r",
    "30",
    "-s",
    "1280x720",
    "-crf",
    "23",
];

fn validate_clip(path: PathBuf) -> Result<CapturedMedia> {
    let media = finish_media(path)?;
    if media.size < MIN_VIDEO_BYTES {
        return Err(AgentError::ActionFailed("capture produced no footage".into()));
    }
    Ok(media)
}

fn record_audio_video(video_device: &str, audio_device: &str) -> Result<CapturedMedia> {
    let path = temp_path("mp4");
    let path_s = path.display().to_string();
    let input = av_input(video_device, audio_device);

    let mut args: Vec<&str> = vec!["-f", camera_format(), "-i", &input, "-t", VIDEO_SECONDS];
    args.extend_from_slice(ENCODE_FLAGS);
    args.extend_from_slice(&[
        "-acodec", "aac", "-ac", "2", "-ar", "44100", "-ab", "128k", "-y", &path_s,
    ]);

    run_ok("ffmpeg", &args, VIDEO_TIMEOUT)?;
    validate_clip(path)
}

fn record_video_only(video_device: &str) -> Result<CapturedMedia> {
    let path = temp_path("mp4");
    let path_s = path.display().to_string();
    let input = camera_input(video_device);

    let mut args: Vec<&str> = vec![
        "-f",
        camera_format(),
        "-i",
        &input,
        "-t",
        VIDEO_SECONDS,
        "-an",
    ];
    args.extend_from_slice(ENCODE_FLAGS);
    args.extend_from_slice(&["-y", &path_s]);

    run_ok("ffmpeg", &args, VIDEO_TIMEOUT)?;
    validate_clip(path)
}

fn record_raw_reencode(video_device: &str) -> Result<CapturedMedia> {
    let raw = temp_path("avi");
    let raw_s = raw.display().to_string();
    let input = camera_input(video_device);

    // Pass 1: dump the camera stream untouched.
    run_ok(
        "ffmpeg",
        &[
            "-f",
            camera_format(),
            "-i",
            &input,
            "-t",
            VIDEO_SECONDS,
            "-c:v",
            "copy",
            "-an",
            "-y",
            &raw_s,
        ],
        VIDEO_TIMEOUT,
    )?;

    // Pass 2: re-encode the dump to a playable clip.
    let path = temp_path("mp4");
    let path_s = path.display().to_string();
    let mut args: Vec<&str> = vec!["-i", &raw_s, "-an"];
    args.extend_from_slice(ENCODE_FLAGS);
    args.extend_from_slice(&["-y", &path_s]);
    let encode = run_ok("ffmpeg", &args, VIDEO_TIMEOUT);
    let _ = std::fs::remove_file(&raw);
    encode?;

    validate_clip(path)
}

/// Enumerate available video/audio capture devices.
pub fn detect_devices() -> Result<String> {
    device_listing()
}

#[cfg(windows)]
fn device_listing() -> Result<String> {
    // ffmpeg exits non-zero for -list_devices; the listing is on stderr.
    let output = run_with_timeout(
        "ffmpeg",
        &["-list_devices", "true", "-f", "dshow", "-i", "dummy"],
        CAPTURE_TIMEOUT,
    )?;
    let listing: Vec<&str> = output
        .stderr
        .lines()
        .filter(|l| l.contains("dshow"))
        .collect();
    if listing.is_empty() {
        return Err(AgentError::ActionFailed("no capture devices reported".into()));
    }
    Ok(listing.join("\n"))
}

#[cfg(unix)]
fn device_listing() -> Result<String> {
    if let Ok(output) = run_with_timeout("v4l2-ctl", &["--list-devices"], CAPTURE_TIMEOUT) {
        if output.success() && !output.stdout.trim().is_empty() {
            return Ok(output.stdout.trim().to_string());
        }
    }
    // Fallback: whatever video nodes exist.
    let mut nodes: Vec<String> = std::fs::read_dir("/dev")
        .map_err(AgentError::Io)?
        .flatten()
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.starts_with("video").then(|| format!("/dev/{}", name))
        })
        .collect();
    if nodes.is_empty() {
        return Err(AgentError::ActionFailed("no capture devices found".into()));
    }
    nodes.sort();
    Ok(nodes.join("\n"))
}

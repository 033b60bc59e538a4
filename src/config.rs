//! Configuration management for telecommand.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values
//!
//! The principal chat id and the password have no usable defaults; a
//! configuration that leaves either unset is rejected at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::session::ChatId;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Principal and credential configuration.
    pub principal: PrincipalSection,
    /// Webcam device configuration.
    pub webcam: WebcamSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Principal configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipalSection {
    /// The one chat id the agent answers.
    pub chat_id: i64,
    /// Login password.
    pub password: String,
}

/// Webcam configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebcamSection {
    /// Video capture device name.
    pub video_device: String,
    /// Audio capture device name.
    pub audio_device: String,
}

impl Default for WebcamSection {
    fn default() -> Self {
        Self {
            video_device: default_video_device(),
            audio_device: default_audio_device(),
        }
    }
}

#[cfg(windows)]
fn default_video_device() -> String {
    "Integrated Camera".to_string()
}

#[cfg(not(windows))]
fn default_video_device() -> String {
    "/dev/video0".to_string()
}

#[cfg(windows)]
fn default_audio_device() -> String {
    "Microphone".to_string()
}

#[cfg(not(windows))]
fn default_audio_device() -> String {
    "default".to_string()
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(id) = std::env::var("TELECOMMAND_CHAT_ID") {
            if let Ok(id) = id.parse() {
                self.principal.chat_id = id;
            }
        }

        if let Ok(password) = std::env::var("TELECOMMAND_PASSWORD") {
            if !password.is_empty() {
                self.principal.password = password;
            }
        }

        if let Ok(device) = std::env::var("TELECOMMAND_VIDEO_DEVICE") {
            self.webcam.video_device = device;
        }

        if let Ok(device) = std::env::var("TELECOMMAND_AUDIO_DEVICE") {
            self.webcam.audio_device = device;
        }

        if let Ok(level) = std::env::var("TELECOMMAND_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(id) = args.chat_id {
            self.principal.chat_id = id;
        }

        if let Some(ref password) = args.password {
            self.principal.password = password.clone();
        }

        if let Some(ref device) = args.video_device {
            self.webcam.video_device = device.clone();
        }

        if let Some(ref device) = args.audio_device {
            self.webcam.audio_device = device.clone();
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the agent cannot safely run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.principal.chat_id == 0 {
            return Err(ConfigError::MissingChatId);
        }
        if self.principal.password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }
        Ok(())
    }

    /// The principal's chat identity.
    pub fn principal_id(&self) -> ChatId {
        ChatId(self.principal.chat_id)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// No principal chat id configured.
    MissingChatId,
    /// No password configured.
    MissingPassword,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::MissingChatId => write!(f, "no principal chat id configured"),
            Self::MissingPassword => write!(f, "no password configured"),
        }
    }
}

impl std::error::Error for ConfigError {}

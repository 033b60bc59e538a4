//! Command-line interface for telecommand.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Principal chat id (overrides config file).
    pub chat_id: Option<i64>,
    /// Login password (overrides config file).
    pub password: Option<String>,
    /// Webcam video device name.
    pub video_device: Option<String>,
    /// Webcam audio device name.
    pub audio_device: Option<String>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('i') | Long("chat-id") => {
                let value: String = parser.value()?.parse()?;
                result.chat_id = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("chat-id", value))?,
                );
            }
            Short('P') | Long("password") => {
                result.password = Some(parser.value()?.parse()?);
            }
            Long("video-device") => {
                result.video_device = Some(parser.value()?.parse()?);
            }
            Long("audio-device") => {
                result.audio_device = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"telecommand {version}
Chat-driven remote control agent for the local machine

USAGE:
    telecommand [OPTIONS]

OPTIONS:
    -c, --config <FILE>       Path to configuration file (JSON)
    -i, --chat-id <ID>        Principal chat id
    -P, --password <PASS>     Login password
        --video-device <DEV>  Webcam video device name
        --audio-device <DEV>  Webcam audio device name
    -l, --log-level <LVL>     Log level (error, warn, info, debug, trace)
    -h, --help                Print help
    -V, --version             Print version

ENVIRONMENT VARIABLES:
    TELECOMMAND_CHAT_ID       Principal chat id (overrides config)
    TELECOMMAND_PASSWORD      Login password (overrides config)
    TELECOMMAND_VIDEO_DEVICE  Webcam video device (overrides config)
    TELECOMMAND_AUDIO_DEVICE  Webcam audio device (overrides config)
    TELECOMMAND_LOG_LEVEL     Log level (overrides config)
    RUST_LOG                  Alternative log level setting

EXAMPLES:
    # Start with a config file
    telecommand -c /etc/telecommand/config.json

    # Start with inline credentials
    telecommand -i 123456789 -P secret

    # Verbose logging
    telecommand -c config.json -l debug
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("telecommand {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

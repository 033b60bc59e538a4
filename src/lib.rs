//! # telecommand
//!
//! Chat-driven remote control agent for the local machine.
//!
//! One configured principal talks to the agent over a chat transport;
//! after a password login, commands browse the filesystem drive by
//! drive, transfer files, capture the screen or webcam, report system
//! health, and control power state. Privileged actions run behind the
//! [`platform::HostActions`] seam so the protocol itself is plain,
//! testable state-machine logic.
//!
//! ## Quick Start
//!
//! ```no_run
//! use telecommand::platform::SystemHost;
//! use telecommand::protocol::{Dispatcher, Inbound};
//! use telecommand::fs::SystemVolumes;
//! use telecommand::session::ChatId;
//!
//! let operator = ChatId(123456789);
//! let host = SystemHost::new("/dev/video0", "default");
//! let mut dispatcher = Dispatcher::new(operator, "secret", host, SystemVolumes);
//!
//! let result = dispatcher.dispatch(Inbound::text(operator, "/start"));
//! for reply in &result.replies {
//!     println!("{:?}", reply);
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod logging;
pub mod platform;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use error::{AgentError, Result};
pub use fs::{Location, PathResolver, SystemVolumes, VolumeProvider};
pub use platform::{HostActions, SystemHost};
pub use protocol::{Control, DispatchResult, Dispatcher, Inbound, Outbound};
pub use session::{ChatId, Session, SessionStore};
pub use transport::ConsoleTransport;

//! Error types for telecommand.

use thiserror::Error;

/// Main error type for agent operations.
///
/// Path resolution and capability actions return these typed failures;
/// the command protocol converts them into user-visible messages at the
/// point of action execution. A truncated search is a result attribute,
/// not an error, and has no variant here.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Caller is not the configured principal or has not logged in.
    #[error("not authorized")]
    NotAuthorized,

    /// Password did not match. Retryable: the login prompt stays open.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Named volume is not mounted or cannot be entered.
    #[error("volume not available: {0}")]
    VolumeUnavailable(String),

    /// A location-relative operation was attempted before selecting a volume.
    #[error("no volume selected")]
    NoVolumeSelected,

    /// Path or item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission probe failed for the target location or item.
    #[error("access denied")]
    AccessDenied,

    /// Transfer-out refused: file exceeds the size ceiling.
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// An external process exceeded its deadline and was killed.
    #[error("action timed out")]
    ActionTimeout,

    /// An external process ran but reported failure.
    #[error("action failed: {0}")]
    ActionFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_unavailable_display() {
        let err = AgentError::VolumeUnavailable("D:".into());
        assert!(err.to_string().contains("D:"));
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn test_too_large_display() {
        let err = AgentError::TooLarge {
            size: 60 * 1024 * 1024,
            limit: 50 * 1024 * 1024,
        };
        assert!(err.to_string().contains("too large"));
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AgentError = io_err.into();
        assert!(matches!(err, AgentError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_not_found_display() {
        let err = AgentError::NotFound("report.pdf".into());
        assert!(err.to_string().contains("report.pdf"));
    }
}

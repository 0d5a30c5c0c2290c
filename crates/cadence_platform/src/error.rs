//! Platform error types

use thiserror::Error;

/// Platform-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    /// The driver has no display-refresh primitive
    #[error("Frame callbacks not supported by this driver")]
    FramesUnsupported,

    /// The driver refused to schedule a wake
    #[error("Wake request rejected: {0}")]
    WakeRejected(String),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;

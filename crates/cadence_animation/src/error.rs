//! Animation error types

use thiserror::Error;

/// Problems found while validating a motion-guide description
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuideError {
    /// A path needs a start point plus four values per quadratic curve
    #[error("Path must hold a start point and at least one curve (6 + 4n values), got {0} values")]
    BadPathLength(usize),

    #[error("Path value at index {index} is not a finite number: {value}")]
    NonFinite { index: usize, value: f64 },

    #[error("'start' out of bounds. Expected 0 to 1, got {0}")]
    StartOutOfBounds(f64),

    #[error("'end' out of bounds. Expected 0 to 1, got {0}")]
    EndOutOfBounds(f64),

    #[error("'orient' value not recognized: {0:?}")]
    UnknownOrientation(String),

    #[error("Sampling precision must be at least 1")]
    ZeroPrecision,

    /// Every anchor and control point coincides
    #[error("Path has zero length")]
    ZeroLength,
}

/// Animation-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("Unknown label: {0:?}")]
    UnknownLabel(String),

    #[error("Invalid motion guide: {0}")]
    Guide(#[from] GuideError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;

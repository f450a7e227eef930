//! Error types for the sift inspection pipeline.
//!
//! Soft schema violations are NOT errors — they accumulate as report
//! entries inside an outcome. `SiftError` is the hard channel: a hook
//! fault or a malformed schema aborts the whole inspection and discards
//! any reports gathered so far.

use thiserror::Error;

/// The unified error type for the sift crates.
#[derive(Debug, Error)]
pub enum SiftError {
    /// An exec hook or custom directive failed outright.
    ///
    /// This aborts the traversal; no outcome is produced.
    #[error("hook fault: {reason}")]
    HookFault { reason: String },

    /// A schema document could not be interpreted.
    #[error("invalid schema: {reason}")]
    InvalidSchema { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl SiftError {
    /// Shorthand for the hard-failure channel used inside hooks.
    pub fn fault(reason: impl Into<String>) -> Self {
        SiftError::HookFault {
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the sift crates.
pub type SiftResult<T> = Result<T, SiftError>;

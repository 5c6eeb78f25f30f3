//! Error types for filters, estimators and record sources.

use thiserror::Error;

/// Errors returned by `streamsketch`
#[derive(Error, Debug)]
pub enum Error {
    /// A construction parameter is outside of its valid domain
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

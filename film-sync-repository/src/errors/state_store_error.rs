//! Watermark state store error types.

use thiserror::Error;

/// Errors from loading or saving the watermark state.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file format error: {0}")]
    Format(String),
}

impl StateStoreError {
    /// Create a format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}

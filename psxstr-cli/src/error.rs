use thiserror::Error;

use psxstr_core::{DiscError, RemuxError, ReplaceError};

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Disc image could not be opened, read or written
    #[error("{0}")]
    Disc(#[from] DiscError),

    /// Replacement frame was rejected
    #[error("{0}")]
    Remux(#[from] RemuxError),

    /// Requested frame is not on the disc
    #[error("Frame not found: {0}")]
    FrameNotFound(String),

    /// JSON output failed
    #[error("JSON error: {0}")]
    Json(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

impl From<ReplaceError> for CliError {
    fn from(err: ReplaceError) -> Self {
        match err {
            ReplaceError::Disc(e) => Self::Disc(e),
            ReplaceError::Remux(e) => Self::Remux(e),
        }
    }
}

impl CliError {
    pub(crate) fn frame_not_found(msg: impl Into<String>) -> Self {
        Self::FrameNotFound(msg.into())
    }

    pub(crate) fn json(msg: impl Into<String>) -> Self {
        Self::Json(msg.into())
    }

    pub(crate) fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

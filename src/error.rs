//! Host-side error type.
//!
//! The shim surface itself never returns these: interpreter failures travel
//! as exception values inside each backend. `ShimError` is what host helpers
//! (context setup, typed extraction, scoped guile instances) report.

use thiserror::Error;

use crate::reader::ReadError;

/// Result alias for host-side helpers.
pub type Result<T> = std::result::Result<T, ShimError>;

#[derive(Debug, Error)]
pub enum ShimError {
    /// An interpreter returned an exception value; the payload is its printed report.
    #[error("scheme exception: {0}")]
    Exception(String),

    /// A value had the wrong shape for the requested conversion.
    #[error("data error: {0}")]
    Data(String),

    #[error("read error at {line}:{col}: {message}")]
    Read {
        message: String,
        line: usize,
        col: usize,
    },

    /// A panic escaped a scoped guile instance.
    #[error("nonlocal exit from guile mode")]
    NonLocalExit,

    #[error("context initialization failed: {0}")]
    Init(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShimError {
    pub fn data(message: impl Into<String>) -> Self {
        ShimError::Data(message.into())
    }
}

impl From<ReadError> for ShimError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Incomplete { line, col } => ShimError::Read {
                message: "unexpected end of input".to_string(),
                line,
                col,
            },
            ReadError::Syntax { message, loc } => ShimError::Read {
                message,
                line: loc.line,
                col: loc.col,
            },
        }
    }
}

//! Error types

use thiserror::Error;

/// Errors that can occur while configuring or writing hierarchical logs
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected configuration (bad names, missing fields, duplicate loggers)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected setter or call argument
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The sink's stream was released by `close()`
    #[error("Sink is closed")]
    SinkClosed,

    /// Call-stack introspection produced no caller frame
    #[error("Stack introspection unavailable: no caller frame could be resolved")]
    StackUnavailable,

    /// Depth tracker or renderer reached a state that should be impossible
    #[error("Internal error (bug): {0}")]
    Internal(String),

    /// IO error from a file or console stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Broad classification of an [`Error`]
///
/// Lets callers tell "you gave me bad input" apart from "the library is broken".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration or bad arguments
    UserInput,
    /// Valid input used at the wrong time (e.g. write after close)
    Usage,
    /// Programming bug inside the library, or missing stack introspection
    Internal,
    /// Operating system level failure
    Io,
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create an internal (bug) error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) | Error::InvalidParameter(_) | Error::Yaml(_) | Error::Json(_) => {
                ErrorKind::UserInput
            }
            Error::SinkClosed => ErrorKind::Usage,
            Error::StackUnavailable | Error::Internal(_) => ErrorKind::Internal,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// True when the error signals a defect in the library rather than in its input
    pub fn is_bug(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the training core can report.
///
/// Shape and input errors are programming or configuration mistakes and are
/// never retried. `NumericInstability` is kept separate so a caller can tell
/// "bad math" (usually a learning rate that is too high) from "bad shapes".
#[derive(Error, Debug)]
pub enum Error {
    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("numeric instability: {0}")]
    NumericInstability(String),

    #[error("could not find {}", .0.display())]
    NotFound(PathBuf),

    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed file {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Error {
        Error::Format { path: path.into(), message: message.into() }
    }

    pub fn is_numeric_instability(&self) -> bool {
        matches!(self, Error::NumericInstability(_))
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Error::Shape(_))
    }
}

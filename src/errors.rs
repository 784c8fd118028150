use std::io;

use thiserror::Error;

/// Failures while loading or resolving race data. None of these are fatal to a view:
/// callers degrade to an empty page plus a diagnostic.
#[derive(Debug, Error)]
pub(crate) enum ViewError {
    #[error("no {kind} matches '{key}'")]
    NotFound { kind: &'static str, key: String },
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("malformed document: {0}")]
    Parse(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        ViewError::Parse(err.to_string())
    }
}

pub(crate) type ViewResult<T> = std::result::Result<T, ViewError>;

impl ViewError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        ViewError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub(crate) fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        ViewError::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

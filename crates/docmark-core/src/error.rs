use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed page filename '{filename}': {reason}")]
    MalformedFilename { filename: String, reason: String },

    #[error("Text extraction failed for page {page_index} ({filename})")]
    ExtractionFailure {
        page_index: usize,
        filename: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Assembly mismatch in {what}: expected {expected}, got {actual}")]
    AssemblyMismatch { what: &'static str, expected: usize, actual: usize },

    #[error("Bookmark prediction failed")]
    Prediction(#[source] anyhow::Error),

    #[error("Persisting document failed")]
    Persistence(#[source] anyhow::Error),

    #[error("Notification dispatch failed: {0}")]
    DispatchFailure(String),

    #[error("Cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A pipeline run for document '{0}' is already active")]
    AlreadyRunning(String),

    #[error("Giving up after {attempts} attempts")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<Error>,
    },
}

impl Error {
    /// Whether the outer retry envelope may start another attempt after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::AlreadyRunning(_) | Error::InvalidConfig(_) | Error::RetryExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

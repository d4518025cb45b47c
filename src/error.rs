//! Error types, one enum per boundary.
//!
//! Only `IngestError` (and `ConfigError` at startup) ends a run. Everything
//! else is logged by the caller and the pipeline keeps going.

use std::path::PathBuf;

use thiserror::Error;

/// Item feed missing or malformed. Fatal for the run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open item feed {}: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("failed to read header of item feed {}: {source}", path.display())]
    Header { path: PathBuf, source: csv::Error },

    #[error("item feed {} is missing required columns: {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("malformed row in item feed {}: {source}", path.display())]
    Row { path: PathBuf, source: csv::Error },
}

/// Failure reading or writing the snapshot, history or report files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("i/o error on {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("{} is not valid json: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("{} has an unrecognized shape: expected {expected}", path.display())]
    Shape { path: PathBuf, expected: &'static str },

    #[error("failed to build spreadsheet {}: {source}", path.display())]
    Spreadsheet { path: PathBuf, source: rust_xlsxwriter::XlsxError },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            PersistenceError::NotFound { path }
        } else {
            PersistenceError::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::NotFound { .. })
    }
}

/// Remote content api failure. Reported as a `false` return, never raised.
#[derive(Debug, Error)]
pub enum RemoteSyncError {
    #[error("remote sync credentials not configured (token and repository required)")]
    MissingCredentials,

    #[error("local file {} does not exist", .0.display())]
    MissingLocalFile(PathBuf),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote content is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("remote file is {expected} bytes but {received} were received")]
    Incomplete { expected: u64, received: usize },

    #[error(transparent)]
    Local(#[from] PersistenceError),
}

/// Chat api failure for a single attempt.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("chat credentials not configured (token and chat id required)")]
    MissingCredentials,

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("chat api returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for NotificationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotificationError::Timeout
        } else {
            NotificationError::Http(e)
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("invalid duration for `{field}`: {source}")]
    Duration { field: &'static str, source: humantime::DurationError },

    #[error("utc offset of {0} hours is out of range")]
    Offset(i32),

    #[error("could not determine working directory: {0}")]
    WorkingDir(std::io::Error),
}

//! Error types for manifest loading, remote access, and the download pipeline.
//!
//! Each layer attaches its own context (which path, which file) and passes
//! the error up unchanged otherwise. Nothing here is retried.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single remote request.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Non-2xx response.
    #[error("HTTP {status}")]
    Status { status: u16 },
    /// Connection, timeout, or body transfer failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The listing response was not the expected JSON array.
    #[error("unexpected listing response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => SourceError::Status {
                status: status.as_u16(),
            },
            None => SourceError::Transport(e.to_string()),
        }
    }
}

/// Failure of one `download` invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No usable endpoint is configured. Raised before any network call.
    #[error("no endpoint configured; add one with `aliaszip endpoints add`")]
    NotConfigured,
    #[error("unknown resource key: {0}")]
    UnknownKey(String),
    /// A directory listing failed; the whole walk was discarded.
    #[error("failed to fetch file list: {path}: {source}")]
    ListFailed {
        path: String,
        #[source]
        source: SourceError,
    },
    /// A file fetch failed; nothing was saved.
    #[error("failed to download {path}: {source}")]
    FetchFailed {
        path: String,
        #[source]
        source: SourceError,
    },
    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("failed to save archive to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The manifest could not be loaded. Fatal at startup.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid manifest {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

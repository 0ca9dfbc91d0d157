use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single remote call or of the local IO around it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL {0:?}")]
    InvalidUrl(String),

    #[error("response is missing field `{0}`")]
    MissingField(&'static str),

    #[error("upload stopped at offset {actual} of {expected} bytes")]
    IncompleteTransfer { expected: u64, actual: u64 },
}

/// Failure that aborts a whole migration run.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("failed to prepare download directory {path:?}: {source}")]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list videos in source folder {folder_id}: {source}")]
    Listing {
        folder_id: String,
        #[source]
        source: ApiError,
    },
}

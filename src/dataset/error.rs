use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to download dataset: {0}")]
    DownloadFailed(String),

    #[error("Dataset not found at {0} and downloading is disabled")]
    NotCached(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Dataset contains no samples")]
    Empty,

    #[error("Every pixel is zero, cannot normalise")]
    AllZero,
}

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ClusterError {
    #[error("Cannot cluster an empty dataset")]
    EmptyData,

    #[error("Row {row} has {found} features, expected {expected}")]
    RaggedRows {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Requested {k} clusters but only {samples} samples are available")]
    TooFewSamples { k: usize, samples: usize },

    #[error("Invalid k-means parameters: {0}")]
    InvalidParams(String),
}

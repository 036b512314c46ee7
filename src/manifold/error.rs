use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TsneError {
    #[error("Cannot embed an empty dataset")]
    EmptyData,

    #[error("Row {row} has {found} features, expected {expected}")]
    RaggedRows {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("At least 2 samples are required, got {samples}")]
    TooFewSamples { samples: usize },

    #[error("Perplexity ({perplexity}) must be less than the number of samples ({samples})")]
    PerplexityTooLarge { perplexity: f64, samples: usize },

    #[error("Requested {requested} components but data has only {available} features")]
    TooManyComponents { requested: usize, available: usize },

    #[error("Invalid t-SNE parameters: {0}")]
    InvalidParams(String),
}

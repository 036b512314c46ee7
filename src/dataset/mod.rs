//! The 8x8 handwritten digits dataset.
//!
//! Samples are 64 pixel counts in `0..=16` (one 8x8 image per row) with a
//! digit label in `0..=9`. The data is the test split of the UCI optical
//! recognition of handwritten digits set, cached on disk after first download.

mod error;
mod loader;

#[cfg(test)]
mod tests;

pub use error::DatasetError;
pub use loader::{fetch, load, parse};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const IMAGE_SIDE: usize = 8;
pub const N_FEATURES: usize = IMAGE_SIDE * IMAGE_SIDE;
pub const MAX_PIXEL: u8 = 16;
pub const N_CLASSES: u8 = 10;

pub const DEFAULT_URL: &str =
    "https://archive.ics.uci.edu/ml/machine-learning-databases/optdigits/optdigits.tes";

/// Where the dataset lives and how to obtain it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Local cache file, read if present
    pub path: PathBuf,
    pub url: String,
    /// Fetch `url` into `path` when the cache is missing
    pub download: bool,
    /// Keep only the first N samples
    pub max_samples: Option<usize>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/optdigits.tes"),
            url: DEFAULT_URL.to_string(),
            download: true,
            max_samples: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Digits {
    /// Raw pixel counts, one row of `N_FEATURES` per sample
    pub samples: Vec<Vec<f32>>,
    pub targets: Vec<u8>,
    /// Largest pixel count over all samples
    pub max_value: f32,
    pub source: PathBuf,
    /// Hex SHA-256 of the file the samples were parsed from
    pub sha256: String,
}

impl Digits {
    pub fn new(samples: Vec<Vec<f32>>, targets: Vec<u8>, source: PathBuf, sha256: String) -> Self {
        let max_value = samples
            .iter()
            .flat_map(|row| row.iter().copied())
            .fold(0.0, f32::max);
        Self {
            samples,
            targets,
            max_value,
            source,
            sha256,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn n_features(&self) -> usize {
        N_FEATURES
    }

    pub fn image_side(&self) -> usize {
        IMAGE_SIDE
    }

    /// Samples divided by the global maximum pixel value
    pub fn normalized(&self) -> Result<Vec<Vec<f32>>, DatasetError> {
        if self.is_empty() {
            return Err(DatasetError::Empty);
        }
        let max = self.max_value;
        if max <= 0.0 {
            return Err(DatasetError::AllZero);
        }
        Ok(self
            .samples
            .iter()
            .map(|row| row.iter().map(|&x| x / max).collect())
            .collect())
    }

    pub fn class_counts(&self) -> [usize; N_CLASSES as usize] {
        let mut counts = [0; N_CLASSES as usize];
        for &t in &self.targets {
            counts[t as usize] += 1;
        }
        counts
    }
}

//! Run configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `DIGITSCOPE_*` environment variables, then command-line flags (applied by
//! the binary). Every section is optional in the file.
//!
//! ```toml
//! seed = 1000
//!
//! [dataset]
//! path = "data/optdigits.tes"
//! download = true
//!
//! [elbow]
//! min_clusters = 2
//! max_clusters = 20
//!
//! [kmeans]
//! n_clusters = 10
//!
//! [tsne]
//! perplexity = 10.0
//! init = "pca"
//!
//! [output]
//! dir = "output"
//! annotate_every = 10
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::clusterer::KMeansParams;
use crate::dataset::DatasetConfig;
use crate::manifold::TsneParams;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(String),

    #[error("Failed to serialize to TOML: {0}")]
    Serialize(String),

    #[error("[{section}] {message}")]
    Invalid {
        section: &'static str,
        message: String,
    },
}

/// Range of cluster counts for the inertia sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElbowConfig {
    pub min_clusters: usize,
    pub max_clusters: usize,
}

impl Default for ElbowConfig {
    fn default() -> Self {
        Self {
            min_clusters: 2,
            max_clusters: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Label every n-th point of the scatter plot; 0 disables labels
    pub annotate_every: usize,
    /// Render the SVG/PNG artifacts (the JSON report is always written)
    pub plots: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            annotate_every: 10,
            plots: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Seed shared by every randomised stage
    pub seed: u64,
    pub dataset: DatasetConfig,
    pub elbow: ElbowConfig,
    pub kmeans: KMeansParams,
    pub tsne: TsneParams,
    pub output: OutputConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: 1000,
            dataset: DatasetConfig::default(),
            elbow: ElbowConfig::default(),
            kmeans: KMeansParams::default(),
            tsne: TsneParams::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Apply `DIGITSCOPE_*` environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `DIGITSCOPE_SEED` | `seed` |
    /// | `DIGITSCOPE_DATA_PATH` | `dataset.path` |
    /// | `DIGITSCOPE_OUTPUT_DIR` | `output.dir` |
    /// | `DIGITSCOPE_MAX_SAMPLES` | `dataset.max_samples` |
    ///
    /// Unparseable numbers are ignored.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(seed) = lookup("DIGITSCOPE_SEED").and_then(|v| v.parse().ok()) {
            self.seed = seed;
        }
        if let Some(path) = lookup("DIGITSCOPE_DATA_PATH") {
            self.dataset.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("DIGITSCOPE_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(n) = lookup("DIGITSCOPE_MAX_SAMPLES").and_then(|v| v.parse().ok()) {
            self.dataset.max_samples = Some(n);
        }
        self
    }

    /// Check every section, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.max_samples == Some(0) {
            return Err(ConfigError::Invalid {
                section: "dataset",
                message: "max_samples must be at least 1".into(),
            });
        }

        if self.elbow.min_clusters == 0 || self.elbow.min_clusters > self.elbow.max_clusters {
            return Err(ConfigError::Invalid {
                section: "elbow",
                message: format!(
                    "need 1 <= min_clusters <= max_clusters, got {}..={}",
                    self.elbow.min_clusters, self.elbow.max_clusters
                ),
            });
        }

        self.kmeans.validate().map_err(|e| ConfigError::Invalid {
            section: "kmeans",
            message: e.to_string(),
        })?;

        self.tsne.validate().map_err(|e| ConfigError::Invalid {
            section: "tsne",
            message: e.to_string(),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifold::TsneInit;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, 1000);
        assert_eq!(config.elbow.min_clusters, 2);
        assert_eq!(config.elbow.max_clusters, 20);
        assert_eq!(config.kmeans.n_clusters, 10);
        assert_eq!(config.tsne.perplexity, 10.0);
        assert_eq!(config.output.annotate_every, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            seed = 7

            [kmeans]
            n_clusters = 4

            [tsne]
            init = "random"
            learning_rate = 100.0
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.kmeans.n_clusters, 4);
        assert_eq!(config.kmeans.n_init, 10);
        assert_eq!(config.tsne.init, TsneInit::Random);
        assert_eq!(config.tsne.learning_rate, Some(100.0));
        assert_eq!(config.tsne.perplexity, 10.0);
        assert_eq!(config.elbow, ElbowConfig::default());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let mut config = AnalysisConfig::default();
        config.output.dir = PathBuf::from("elsewhere");
        config.dataset.max_samples = Some(300);

        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), config.to_toml_string().unwrap()).unwrap();

        assert_eq!(AnalysisConfig::from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn test_parse_and_read_errors() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("seed = \"abc\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_file("/definitely/not/here.toml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_validation_names_section() {
        let mut config = AnalysisConfig::default();
        config.elbow.min_clusters = 5;
        config.elbow.max_clusters = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("[elbow]"));

        let mut config = AnalysisConfig::default();
        config.kmeans.n_init = 0;
        assert!(config.validate().unwrap_err().to_string().starts_with("[kmeans]"));

        let mut config = AnalysisConfig::default();
        config.tsne.perplexity = 0.0;
        assert!(config.validate().unwrap_err().to_string().starts_with("[tsne]"));

        let mut config = AnalysisConfig::default();
        config.dataset.max_samples = Some(0);
        assert!(config.validate().unwrap_err().to_string().starts_with("[dataset]"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DIGITSCOPE_SEED", "42"),
            ("DIGITSCOPE_OUTPUT_DIR", "/tmp/out"),
            ("DIGITSCOPE_MAX_SAMPLES", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = AnalysisConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.seed, 42);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.dataset.max_samples, None);
        assert_eq!(config.dataset.path, DatasetConfig::default().path);
    }
}

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::clusterer::ElbowPoint;

/// Summary of one analysis run, written next to the plots as JSON
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub created_at: String,
    pub generator: String,
    pub seed: u64,
    pub dataset: DatasetSummary,
    pub elbow: Vec<ElbowPoint>,
    pub clustering: ClusteringSummary,
    pub embedding: EmbeddingSummary,
    pub artifacts: Artifacts,
    pub timings: Vec<StageTiming>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub source: PathBuf,
    pub sha256: String,
    pub samples: usize,
    pub features: usize,
    pub max_value: f32,
    pub class_counts: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClusteringSummary {
    pub k: usize,
    pub inertia: f64,
    pub iterations: usize,
    pub cluster_sizes: Vec<usize>,
    /// Most common true digit per cluster
    pub dominant_digits: Vec<Option<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingSummary {
    pub perplexity: f64,
    pub kl_divergence: f64,
    pub iterations: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Artifacts {
    pub elbow_plot: Option<PathBuf>,
    pub centroids_image: Option<PathBuf>,
    pub embedding_plot: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub seconds: f64,
}

impl AnalysisReport {
    pub fn new(
        seed: u64,
        dataset: DatasetSummary,
        elbow: Vec<ElbowPoint>,
        clustering: ClusteringSummary,
        embedding: EmbeddingSummary,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now().to_rfc3339(),
            generator: format!("digitscope v{}", env!("CARGO_PKG_VERSION")),
            seed,
            dataset,
            elbow,
            clustering,
            embedding,
            artifacts: Artifacts::default(),
            timings: Vec::new(),
        }
    }

    pub fn total_seconds(&self) -> f64 {
        self.timings.iter().map(|t| t.seconds).sum()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        fs::write(path, json).context(format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .context(format!("Failed to read report from {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to parse report JSON")
    }
}

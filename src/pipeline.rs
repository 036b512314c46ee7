use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::clusterer::{inertia_sweep, kmeans};
use crate::config::AnalysisConfig;
use crate::dataset;
use crate::manifold::tsne;
use crate::plot::{render_centroids, render_elbow, render_embedding};
use crate::report::{
    AnalysisReport, Artifacts, ClusteringSummary, DatasetSummary, EmbeddingSummary, StageTiming,
};

pub const ELBOW_PLOT: &str = "elbow.svg";
pub const CENTROIDS_IMAGE: &str = "centroids.png";
pub const EMBEDDING_PLOT: &str = "tsne.svg";
pub const REPORT_FILE: &str = "report.json";

fn timed<T>(
    timings: &mut Vec<StageTiming>,
    stage: &str,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    info!(stage, "stage started");
    let start = Instant::now();
    let out = f()?;
    let seconds = start.elapsed().as_secs_f64();
    info!(stage, seconds, "stage finished");
    timings.push(StageTiming {
        stage: stage.to_string(),
        seconds,
    });
    Ok(out)
}

/// Load, cluster, sweep, embed and plot, in that order.
///
/// Plots land in `config.output.dir` as they are produced; the JSON report is
/// written last and returned.
pub fn run(config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate().context("Invalid configuration")?;

    let out_dir = &config.output.dir;
    fs::create_dir_all(out_dir)
        .context(format!("Failed to create output directory {}", out_dir.display()))?;
    let artifact = |name: &str| -> PathBuf { out_dir.join(name) };
    let plots = config.output.plots;
    let seed = config.seed;

    let mut timings = Vec::new();
    let mut artifacts = Artifacts::default();

    // Step 1: dataset
    let (digits, data) = timed(&mut timings, "load", || {
        let digits = dataset::load(&config.dataset).context("Failed to load digits dataset")?;
        let data = digits.normalized().context("Failed to normalise dataset")?;
        Ok((digits, data))
    })?;

    // Step 2: inertia for every candidate k
    let ks = config.elbow.min_clusters..=config.elbow.max_clusters;
    let curve = timed(&mut timings, "elbow", || {
        let curve = inertia_sweep(&data, &config.kmeans, ks, seed)
            .context("Inertia sweep failed")?;
        if plots {
            let path = artifact(ELBOW_PLOT);
            render_elbow(&curve, &path).context("Failed to render elbow plot")?;
            artifacts.elbow_plot = Some(path);
        }
        Ok(curve)
    })?;

    // Step 3: the clustering we keep
    let clusters = timed(&mut timings, "kmeans", || {
        let clusters = kmeans(&data, &config.kmeans, seed).context("k-means failed")?;
        if plots {
            let path = artifact(CENTROIDS_IMAGE);
            render_centroids(&clusters.centroids(), digits.image_side(), &path)
                .context("Failed to render centroids")?;
            artifacts.centroids_image = Some(path);
        }
        Ok(clusters)
    })?;

    // Step 4: 2-D embedding coloured by cluster
    let embedding = timed(&mut timings, "tsne", || {
        let embedding = tsne(&data, &config.tsne, seed).context("t-SNE failed")?;
        if plots {
            let path = artifact(EMBEDDING_PLOT);
            render_embedding(
                &embedding,
                &clusters.labels,
                config.output.annotate_every,
                &path,
            )
            .context("Failed to render embedding")?;
            artifacts.embedding_plot = Some(path);
        }
        Ok(embedding)
    })?;

    let mut report = AnalysisReport::new(
        seed,
        DatasetSummary {
            source: digits.source.clone(),
            sha256: digits.sha256.clone(),
            samples: digits.len(),
            features: digits.n_features(),
            max_value: digits.max_value,
            class_counts: digits.class_counts().to_vec(),
        },
        curve.points.clone(),
        ClusteringSummary {
            k: clusters.k(),
            inertia: clusters.inertia,
            iterations: clusters.iterations,
            cluster_sizes: clusters.cluster_sizes(),
            dominant_digits: clusters.dominant_targets(&digits.targets),
        },
        EmbeddingSummary {
            perplexity: config.tsne.perplexity,
            kl_divergence: embedding.kl_divergence,
            iterations: embedding.iterations,
        },
    );

    let report_path = artifact(REPORT_FILE);
    artifacts.report = Some(report_path.clone());
    report.artifacts = artifacts;
    report.timings = timings;
    report.write(&report_path)?;
    info!(path = %report_path.display(), "report written");

    Ok(report)
}

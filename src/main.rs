use anyhow::Result;
use clap::Parser;
use digitscope::{AnalysisConfig, AnalysisReport, run};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

/// Cluster the 8x8 handwritten digits with k-means and visualise them with t-SNE
#[derive(Parser)]
#[command(name = "digitscope", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset cache file (downloaded when missing)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory for plots and the JSON report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed shared by k-means and t-SNE
    #[arg(long)]
    seed: Option<u64>,

    /// Cluster count for the final k-means fit
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Smallest cluster count in the inertia sweep
    #[arg(long)]
    min_clusters: Option<usize>,

    /// Largest cluster count in the inertia sweep
    #[arg(long)]
    max_clusters: Option<usize>,

    /// t-SNE perplexity
    #[arg(long)]
    perplexity: Option<f64>,

    /// Use only the first N samples
    #[arg(long)]
    max_samples: Option<usize>,

    /// Fail instead of downloading a missing dataset
    #[arg(long)]
    no_download: bool,

    /// Skip rendering plots (the report is still written)
    #[arg(long)]
    no_plots: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        }
        .with_env_overrides();

        if let Some(data) = self.data {
            config.dataset.path = data;
        }
        if let Some(output) = self.output {
            config.output.dir = output;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(k) = self.clusters {
            config.kmeans.n_clusters = k;
        }
        if let Some(k) = self.min_clusters {
            config.elbow.min_clusters = k;
        }
        if let Some(k) = self.max_clusters {
            config.elbow.max_clusters = k;
        }
        if let Some(p) = self.perplexity {
            config.tsne.perplexity = p;
        }
        if let Some(n) = self.max_samples {
            config.dataset.max_samples = Some(n);
        }
        if self.no_download {
            config.dataset.download = false;
        }
        if self.no_plots {
            config.output.plots = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.into_config()?;
    println!("=== digitscope: k-means and t-SNE on handwritten digits ===\n");
    println!(
        "Seed {} | sweep k={}..={} | final k={} | perplexity {}\n",
        config.seed,
        config.elbow.min_clusters,
        config.elbow.max_clusters,
        config.kmeans.n_clusters,
        config.tsne.perplexity
    );

    let report = run(&config)?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    println!("=== Dataset ===");
    println!("Source:               {}", report.dataset.source.display());
    println!("Samples:              {}", report.dataset.samples);
    println!("Features:             {}", report.dataset.features);
    println!("Max pixel value:      {}", report.dataset.max_value);

    println!("\n=== Inertia by cluster count ===");
    for entry in &report.elbow {
        println!("  k={:<3} {:>12.3}", entry.k, entry.inertia);
    }

    println!("\n=== Clustering ===");
    println!("Clusters:             {}", report.clustering.k);
    println!("Inertia:              {:.3}", report.clustering.inertia);
    println!("Iterations:           {}", report.clustering.iterations);
    for (id, (size, digit)) in report
        .clustering
        .cluster_sizes
        .iter()
        .zip(report.clustering.dominant_digits.iter())
        .enumerate()
    {
        match digit {
            Some(d) => println!("  Cluster {}: {} samples, mostly digit {}", id, size, d),
            None => println!("  Cluster {}: empty", id),
        }
    }

    println!("\n=== Embedding ===");
    println!("Perplexity:           {}", report.embedding.perplexity);
    println!("KL divergence:        {:.4}", report.embedding.kl_divergence);
    println!("Iterations:           {}", report.embedding.iterations);

    let total = report.total_seconds();
    println!("\n=== Timing Breakdown ===");
    for timing in &report.timings {
        println!(
            "{:<22}{:.3}s ({:.1}%)",
            format!("{}:", timing.stage),
            timing.seconds,
            if total > 0.0 {
                100.0 * timing.seconds / total
            } else {
                0.0
            }
        );
    }
    println!("─────────────────────────────────");
    println!("Total execution:      {:.3}s", total);

    println!("\n=== Artifacts ===");
    let artifacts = &report.artifacts;
    for path in [
        &artifacts.elbow_plot,
        &artifacts.centroids_image,
        &artifacts.embedding_plot,
        &artifacts.report,
    ]
    .into_iter()
    .flatten()
    {
        println!("✓ {}", path.display());
    }
}

// Public API exports
pub mod clusterer;
pub mod config;
pub mod dataset;
pub mod manifold;
pub mod pipeline;
pub mod plot;
pub mod report;

// Re-export main types for convenience
pub use config::{AnalysisConfig, ConfigError, ElbowConfig, OutputConfig};

pub use dataset::{DatasetConfig, DatasetError, Digits};

pub use clusterer::{
    Cluster, ClusterError, ClusterResult, ElbowCurve, ElbowPoint, KMeansParams, inertia_sweep,
    kmeans, predict,
};

pub use manifold::{Embedding, TsneError, TsneInit, TsneParams, tsne};

pub use plot::{PlotError, render_centroids, render_elbow, render_embedding};

pub use pipeline::run;
pub use report::AnalysisReport;

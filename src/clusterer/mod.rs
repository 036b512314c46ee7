mod centroid;
mod distance;
mod elbow;
mod error;
mod kmeans;
mod types;

#[cfg(test)]
mod tests;

pub use centroid::compute_centroid;
pub use distance::squared_euclidean;
pub use elbow::inertia_sweep;
pub use error::ClusterError;
pub use kmeans::{KMeansParams, kmeans, predict};
pub use types::{Cluster, ClusterResult, ElbowCurve, ElbowPoint};

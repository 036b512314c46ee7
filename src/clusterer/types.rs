use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: u32,
    pub member_ids: Vec<u32>,
    pub centroid: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ClusterResult {
    pub clusters: Vec<Cluster>,
    /// Cluster index per input sample, in input order
    pub labels: Vec<usize>,
    /// Sum of squared distances from each sample to its assigned centroid
    pub inertia: f64,
    pub iterations: usize,
}

impl ClusterResult {
    pub fn k(&self) -> usize {
        self.clusters.len()
    }

    pub fn centroids(&self) -> Vec<&[f32]> {
        self.clusters.iter().map(|c| c.centroid.as_slice()).collect()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(|c| c.member_ids.len()).collect()
    }

    /// Most frequent ground-truth target inside each cluster.
    ///
    /// Returns `None` for clusters without members. Ties resolve to the
    /// smallest target value.
    pub fn dominant_targets(&self, targets: &[u8]) -> Vec<Option<u8>> {
        self.clusters
            .iter()
            .map(|cluster| {
                let mut counts = [0usize; 256];
                for &id in &cluster.member_ids {
                    if let Some(&t) = targets.get(id as usize) {
                        counts[t as usize] += 1;
                    }
                }
                counts
                    .iter()
                    .enumerate()
                    .filter(|&(_, &n)| n > 0)
                    .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
                    .map(|(t, _)| t as u8)
            })
            .collect()
    }
}

/// One point of the inertia-vs-k curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ElbowCurve {
    pub points: Vec<ElbowPoint>,
}

impl ElbowCurve {
    pub fn inertias(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.inertia).collect()
    }

    pub fn k_range(&self) -> Option<(usize, usize)> {
        Some((self.points.first()?.k, self.points.last()?.k))
    }
}

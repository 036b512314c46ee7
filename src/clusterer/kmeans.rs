use crate::clusterer::{
    centroid::{compute_centroid, mean_variance},
    distance::{nearest, squared_euclidean},
    error::ClusterError,
    types::{Cluster, ClusterResult},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Hyperparameters for a k-means fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansParams {
    /// Number of clusters (k)
    pub n_clusters: usize,
    /// Independent restarts; the lowest-inertia run wins
    pub n_init: usize,
    /// Lloyd iterations per restart
    pub max_iterations: usize,
    /// Relative convergence threshold, scaled by the mean feature variance
    pub tolerance: f64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            n_clusters: 10,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

impl KMeansParams {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Self::default()
        }
    }

    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.n_clusters == 0 {
            return Err(ClusterError::InvalidParams(
                "n_clusters must be at least 1".into(),
            ));
        }
        if self.n_init == 0 {
            return Err(ClusterError::InvalidParams("n_init must be at least 1".into()));
        }
        if self.max_iterations == 0 {
            return Err(ClusterError::InvalidParams(
                "max_iterations must be at least 1".into(),
            ));
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(ClusterError::InvalidParams(format!(
                "tolerance must be a finite non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Single restart outcome
struct Run {
    centroids: Vec<Vec<f32>>,
    labels: Vec<usize>,
    inertia: f64,
    iterations: usize,
}

pub fn kmeans(
    data: &[Vec<f32>],
    params: &KMeansParams,
    seed: u64,
) -> Result<ClusterResult, ClusterError> {
    params.validate()?;
    check_data(data)?;

    let n = data.len();
    let k = params.n_clusters;
    if k > n {
        return Err(ClusterError::TooFewSamples { k, samples: n });
    }

    let tol = params.tolerance * mean_variance(data);
    let mut master = ChaCha8Rng::seed_from_u64(seed);
    let mut best: Option<Run> = None;

    for init in 0..params.n_init {
        let mut rng = ChaCha8Rng::seed_from_u64(master.gen::<u64>());
        let centroids = init_plus_plus(data, k, &mut rng);
        let run = lloyd(data, centroids, params.max_iterations, tol);
        debug!(
            k,
            init,
            inertia = run.inertia,
            iterations = run.iterations,
            "k-means restart finished"
        );

        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    let Some(best) = best else {
        return Err(ClusterError::InvalidParams("n_init must be at least 1".into()));
    };

    Ok(build_result(best, k))
}

/// Assign each sample to its nearest centroid
pub fn predict(centroids: &[Vec<f32>], data: &[Vec<f32>]) -> Vec<usize> {
    data.iter().map(|x| nearest(x, centroids).0).collect()
}

fn check_data(data: &[Vec<f32>]) -> Result<(), ClusterError> {
    let Some(first) = data.first() else {
        return Err(ClusterError::EmptyData);
    };
    let dim = first.len();
    if dim == 0 {
        return Err(ClusterError::EmptyData);
    }
    for (row, x) in data.iter().enumerate() {
        if x.len() != dim {
            return Err(ClusterError::RaggedRows {
                row,
                found: x.len(),
                expected: dim,
            });
        }
    }
    Ok(())
}

/// Greedy k-means++ seeding.
///
/// Each new centre is the best of `2 + ln(k)` candidates drawn with
/// probability proportional to the squared distance to the closest centre.
fn init_plus_plus(data: &[Vec<f32>], k: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f32>> {
    let n = data.len();
    let n_trials = 2 + (k as f64).ln() as usize;

    let mut centroids = Vec::with_capacity(k);
    let first = rng.gen_range(0..n);
    centroids.push(data[first].clone());

    let mut closest: Vec<f64> = data
        .iter()
        .map(|x| squared_euclidean(x, &centroids[0]))
        .collect();
    let mut potential: f64 = closest.iter().sum();

    while centroids.len() < k {
        if potential <= 0.0 {
            // every sample already sits on a centre
            centroids.push(data[rng.gen_range(0..n)].clone());
            continue;
        }

        let mut best: Option<(usize, Vec<f64>, f64)> = None;
        for _ in 0..n_trials {
            let idx = sample_weighted(&closest, potential, rng);
            let candidate: Vec<f64> = data
                .iter()
                .zip(closest.iter())
                .map(|(x, &c)| c.min(squared_euclidean(x, &data[idx])))
                .collect();
            let pot: f64 = candidate.iter().sum();
            if best.as_ref().map_or(true, |b| pot < b.2) {
                best = Some((idx, candidate, pot));
            }
        }

        if let Some((idx, candidate, pot)) = best {
            centroids.push(data[idx].clone());
            closest = candidate;
            potential = pot;
        }
    }

    centroids
}

fn sample_weighted(weights: &[f64], total: f64, rng: &mut ChaCha8Rng) -> usize {
    let mut target = rng.gen::<f64>() * total;
    for (i, &w) in weights.iter().enumerate() {
        if target < w {
            return i;
        }
        target -= w;
    }
    // float rounding can walk past the end
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(0)
}

fn lloyd(data: &[Vec<f32>], mut centroids: Vec<Vec<f32>>, max_iters: usize, tol: f64) -> Run {
    let n = data.len();
    let k = centroids.len();
    let mut labels = vec![0usize; n];
    let mut distances = vec![0.0f64; n];
    let mut iterations = 0;

    for _ in 0..max_iters {
        iterations += 1;

        // 1. Assign each sample to the nearest centroid
        for (i, x) in data.iter().enumerate() {
            let (c, d) = nearest(x, &centroids);
            labels[i] = c;
            distances[i] = d;
        }

        // 2. Recompute centroids, relocating empty ones
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (i, &c) in labels.iter().enumerate() {
            members[c].push(i);
        }
        relocate_empty(&mut members, &distances);

        let updated: Vec<Vec<f32>> = members
            .iter()
            .zip(centroids.iter())
            .map(|(ids, old)| {
                if ids.is_empty() {
                    old.clone()
                } else {
                    let rows: Vec<&[f32]> = ids.iter().map(|&i| data[i].as_slice()).collect();
                    compute_centroid(&rows)
                }
            })
            .collect();

        // 3. Check convergence on total centre shift
        let shift: f64 = centroids
            .iter()
            .zip(updated.iter())
            .map(|(a, b)| squared_euclidean(a, b))
            .sum();
        centroids = updated;

        trace!(iteration = iterations, shift, "lloyd step");
        if shift <= tol {
            break;
        }
    }

    // labels and inertia always describe the final centres
    let mut inertia = 0.0;
    for (i, x) in data.iter().enumerate() {
        let (c, d) = nearest(x, &centroids);
        labels[i] = c;
        inertia += d;
    }

    Run {
        centroids,
        labels,
        inertia,
        iterations,
    }
}

/// Give each empty cluster the sample farthest from its current centre,
/// taken from clusters that can spare one.
fn relocate_empty(members: &mut [Vec<usize>], distances: &[f64]) {
    let empty: Vec<usize> = (0..members.len())
        .filter(|&c| members[c].is_empty())
        .collect();
    if empty.is_empty() {
        return;
    }

    let mut far: Vec<usize> = (0..distances.len()).collect();
    far.sort_by(|&a, &b| distances[b].total_cmp(&distances[a]));

    let mut candidates = far.into_iter();
    for c in empty {
        for sample in candidates.by_ref() {
            let Some(owner) = members.iter().position(|m| m.contains(&sample)) else {
                continue;
            };
            if members[owner].len() > 1 {
                members[owner].retain(|&i| i != sample);
                members[c].push(sample);
                break;
            }
        }
    }
}

fn build_result(run: Run, k: usize) -> ClusterResult {
    let mut clusters: Vec<Cluster> = run
        .centroids
        .into_iter()
        .enumerate()
        .map(|(i, centroid)| Cluster {
            id: i as u32,
            member_ids: vec![],
            centroid,
        })
        .collect();

    for (sample_id, &cluster_idx) in run.labels.iter().enumerate() {
        clusters[cluster_idx].member_ids.push(sample_id as u32);
    }
    debug_assert_eq!(clusters.len(), k);

    ClusterResult {
        clusters,
        labels: run.labels,
        inertia: run.inertia,
        iterations: run.iterations,
    }
}

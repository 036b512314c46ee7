use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{TsneError, affinity::joint_probabilities, check_data, pca::pca_project};

const N_COMPONENTS: usize = 2;
const EXPLORATION_ITERATIONS: usize = 250;
const CHECK_EVERY: usize = 50;
const INITIAL_SCALE: f64 = 1e-4;
const MIN_GAIN: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TsneInit {
    /// Leading principal components, rescaled to a tiny spread
    Pca,
    /// Isotropic Gaussian noise with standard deviation 1e-4
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsneParams {
    pub perplexity: f64,
    pub early_exaggeration: f64,
    /// `None` picks `max(n / early_exaggeration / 4, 50)`
    pub learning_rate: Option<f64>,
    pub n_iterations: usize,
    pub init: TsneInit,
    pub min_grad_norm: f64,
    pub n_iter_without_progress: usize,
}

impl Default for TsneParams {
    fn default() -> Self {
        Self {
            perplexity: 10.0,
            early_exaggeration: 12.0,
            learning_rate: None,
            n_iterations: 1000,
            init: TsneInit::Pca,
            min_grad_norm: 1e-7,
            n_iter_without_progress: 300,
        }
    }
}

impl TsneParams {
    pub fn with_perplexity(mut self, perplexity: f64) -> Self {
        self.perplexity = perplexity;
        self
    }

    pub fn with_iterations(mut self, n_iterations: usize) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    pub fn with_init(mut self, init: TsneInit) -> Self {
        self.init = init;
        self
    }

    pub fn validate(&self) -> Result<(), TsneError> {
        if !(self.perplexity > 0.0 && self.perplexity.is_finite()) {
            return Err(TsneError::InvalidParams(format!(
                "perplexity must be positive, got {}",
                self.perplexity
            )));
        }
        if !(self.early_exaggeration >= 1.0 && self.early_exaggeration.is_finite()) {
            return Err(TsneError::InvalidParams(format!(
                "early_exaggeration must be at least 1, got {}",
                self.early_exaggeration
            )));
        }
        if let Some(lr) = self.learning_rate {
            if !(lr > 0.0 && lr.is_finite()) {
                return Err(TsneError::InvalidParams(format!(
                    "learning_rate must be positive, got {}",
                    lr
                )));
            }
        }
        if self.n_iterations < EXPLORATION_ITERATIONS {
            return Err(TsneError::InvalidParams(format!(
                "n_iterations must be at least {}, got {}",
                EXPLORATION_ITERATIONS, self.n_iterations
            )));
        }
        if !(self.min_grad_norm >= 0.0) {
            return Err(TsneError::InvalidParams(
                "min_grad_norm must be non-negative".into(),
            ));
        }
        Ok(())
    }

    fn effective_learning_rate(&self, n: usize) -> f64 {
        self.learning_rate
            .unwrap_or_else(|| (n as f64 / self.early_exaggeration / 4.0).max(50.0))
    }
}

/// 2-D coordinates, one row per input sample
#[derive(Debug, Clone)]
pub struct Embedding {
    pub points: Vec<[f64; 2]>,
    /// KL(P || Q) at the last convergence check
    pub kl_divergence: f64,
    pub iterations: usize,
}

impl Embedding {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(min_x, max_x, min_y, max_y)`
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        Some(self.points.iter().fold(
            (first[0], first[0], first[1], first[1]),
            |(x0, x1, y0, y1), p| (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])),
        ))
    }
}

/// Optimiser state shared by both phases
struct Optimizer<'a> {
    p: Vec<f64>,
    n: usize,
    y: Vec<f64>,
    update: Vec<f64>,
    gains: Vec<f64>,
    grad: Vec<f64>,
    q_num: Vec<f64>,
    params: &'a TsneParams,
    learning_rate: f64,
}

/// Exact t-SNE with the Student-t kernel
pub fn tsne(data: &[Vec<f32>], params: &TsneParams, seed: u64) -> Result<Embedding, TsneError> {
    params.validate()?;
    check_data(data)?;

    let n = data.len();
    if n < 2 {
        return Err(TsneError::TooFewSamples { samples: n });
    }
    if params.perplexity >= n as f64 {
        return Err(TsneError::PerplexityTooLarge {
            perplexity: params.perplexity,
            samples: n,
        });
    }

    info!(samples = n, perplexity = params.perplexity, "computing t-SNE affinities");
    let p = joint_probabilities(data, params.perplexity);
    let y = initial_embedding(data, params.init, seed)?;

    let mut opt = Optimizer {
        p,
        n,
        y,
        update: vec![0.0; n * N_COMPONENTS],
        gains: vec![1.0; n * N_COMPONENTS],
        grad: vec![0.0; n * N_COMPONENTS],
        q_num: vec![0.0; n * n],
        params,
        learning_rate: params.effective_learning_rate(n),
    };

    // Phase 1: exaggerated affinities pull clusters apart
    let exploration = EXPLORATION_ITERATIONS.min(params.n_iterations);
    opt.scale_p(params.early_exaggeration);
    let (mut it, mut kl) = opt.descend(0, exploration, 0.5, EXPLORATION_ITERATIONS);
    opt.scale_p(1.0 / params.early_exaggeration);
    debug!(iterations = it, kl, "early exaggeration finished");

    // Phase 2: plain affinities, higher momentum
    if it < params.n_iterations {
        let (end, final_kl) =
            opt.descend(it, params.n_iterations, 0.8, params.n_iter_without_progress);
        it = end;
        kl = final_kl;
    } else {
        // the last check ran against exaggerated affinities
        kl = opt.gradient(true);
    }
    info!(iterations = it, kl_divergence = kl, "t-SNE finished");

    let points = opt.y.chunks_exact(N_COMPONENTS).map(|c| [c[0], c[1]]).collect();
    Ok(Embedding {
        points,
        kl_divergence: kl,
        iterations: it,
    })
}

fn initial_embedding(data: &[Vec<f32>], init: TsneInit, seed: u64) -> Result<Vec<f64>, TsneError> {
    match init {
        TsneInit::Pca => {
            let projected = pca_project(data, N_COMPONENTS, seed)?;
            let n = projected.len() as f64;
            let mean = projected.iter().map(|r| r[0]).sum::<f64>() / n;
            let std = (projected.iter().map(|r| (r[0] - mean).powi(2)).sum::<f64>() / n).sqrt();
            let scale = if std > 0.0 { INITIAL_SCALE / std } else { 1.0 };
            Ok(projected
                .into_iter()
                .flat_map(|r| [r[0] * scale, r[1] * scale])
                .collect())
        }
        TsneInit::Random => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            Ok((0..data.len() * N_COMPONENTS)
                .map(|_| INITIAL_SCALE * rng.sample::<f64, _>(StandardNormal))
                .collect())
        }
    }
}

impl Optimizer<'_> {
    fn scale_p(&mut self, factor: f64) {
        self.p.iter_mut().for_each(|v| *v *= factor);
    }

    /// Gradient descent with momentum and adaptive gains over `[start, end)`.
    ///
    /// Returns the iteration count reached and the last checked KL divergence.
    fn descend(
        &mut self,
        start: usize,
        end: usize,
        momentum: f64,
        n_iter_without_progress: usize,
    ) -> (usize, f64) {
        let mut best_error = f64::MAX;
        let mut best_iter = start;
        let mut error = f64::MAX;
        let mut reached = start;

        for it in start..end {
            let check = (it + 1) % CHECK_EVERY == 0 || it + 1 == end;
            let kl = self.gradient(check);
            let grad_norm = self.grad.iter().map(|g| g * g).sum::<f64>().sqrt();

            for idx in 0..self.y.len() {
                let g = self.grad[idx];
                let gain = if self.update[idx] * g < 0.0 {
                    self.gains[idx] + 0.2
                } else {
                    self.gains[idx] * 0.8
                };
                self.gains[idx] = gain.max(MIN_GAIN);
                self.update[idx] = momentum * self.update[idx] - self.learning_rate * g * self.gains[idx];
                self.y[idx] += self.update[idx];
            }
            reached = it + 1;

            if check {
                error = kl;
                debug!(iteration = it + 1, kl, grad_norm, "t-SNE progress");
                if error < best_error {
                    best_error = error;
                    best_iter = it;
                } else if it - best_iter > n_iter_without_progress {
                    debug!(iteration = it + 1, "no progress, stopping");
                    break;
                }
                if grad_norm <= self.params.min_grad_norm {
                    debug!(iteration = it + 1, grad_norm, "gradient vanished, stopping");
                    break;
                }
            }
        }

        (reached, error)
    }

    /// Fill `self.grad` with dKL/dy; returns KL(P || Q) when `with_error`.
    fn gradient(&mut self, with_error: bool) -> f64 {
        let n = self.n;
        let y = &self.y;

        let mut sum_q = 0.0;
        for i in 0..n {
            self.q_num[i * n + i] = 0.0;
            for j in (i + 1)..n {
                let dx = y[2 * i] - y[2 * j];
                let dy = y[2 * i + 1] - y[2 * j + 1];
                let num = 1.0 / (1.0 + dx * dx + dy * dy);
                self.q_num[i * n + j] = num;
                self.q_num[j * n + i] = num;
                sum_q += 2.0 * num;
            }
        }
        let sum_q = sum_q.max(f64::EPSILON);

        let mut kl = 0.0;
        self.grad.iter_mut().for_each(|g| *g = 0.0);
        for i in 0..n {
            let (mut gx, mut gy) = (0.0, 0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let num = self.q_num[i * n + j];
                let q = (num / sum_q).max(f64::EPSILON);
                let p = self.p[i * n + j];
                let mult = (p - q) * num;
                gx += mult * (y[2 * i] - y[2 * j]);
                gy += mult * (y[2 * i + 1] - y[2 * j + 1]);
                if with_error {
                    kl += p * (p.max(f64::EPSILON) / q).ln();
                }
            }
            self.grad[2 * i] = 4.0 * gx;
            self.grad[2 * i + 1] = 4.0 * gy;
        }

        kl
    }
}

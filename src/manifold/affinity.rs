//! Input-space affinities for t-SNE.
//!
//! Each row's Gaussian bandwidth is tuned by bisection so the conditional
//! distribution has the requested perplexity, then the conditionals are
//! symmetrised into a joint distribution.

use tracing::debug;

const ENTROPY_TOLERANCE: f64 = 1e-5;
const MAX_SEARCH_STEPS: usize = 100;
const MIN_ROW_SUM: f64 = 1e-8;

/// Dense row-major matrix of squared Euclidean distances
pub fn squared_distances(data: &[Vec<f32>]) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d: f64 = data[i]
                .iter()
                .zip(data[j].iter())
                .map(|(&a, &b)| {
                    let diff = a as f64 - b as f64;
                    diff * diff
                })
                .sum();
            out[i * n + j] = d;
            out[j * n + i] = d;
        }
    }
    out
}

/// Row-stochastic conditional probabilities p(j|i), diagonal zero
pub fn conditional_probabilities(distances: &[f64], n: usize, perplexity: f64) -> Vec<f64> {
    let desired_entropy = perplexity.ln();
    let mut p = vec![0.0; n * n];
    let mut beta_sum = 0.0;

    for i in 0..n {
        let row_d = &distances[i * n..(i + 1) * n];
        let row_p = &mut p[i * n..(i + 1) * n];

        let mut beta = 1.0;
        let mut beta_min = f64::NEG_INFINITY;
        let mut beta_max = f64::INFINITY;

        for _ in 0..MAX_SEARCH_STEPS {
            let mut sum_p = 0.0;
            for j in 0..n {
                row_p[j] = if j == i { 0.0 } else { (-row_d[j] * beta).exp() };
                sum_p += row_p[j];
            }
            if sum_p == 0.0 {
                sum_p = MIN_ROW_SUM;
            }

            let mut sum_dist_p = 0.0;
            for j in 0..n {
                row_p[j] /= sum_p;
                sum_dist_p += row_d[j] * row_p[j];
            }

            let entropy = sum_p.ln() + beta * sum_dist_p;
            let diff = entropy - desired_entropy;
            if diff.abs() <= ENTROPY_TOLERANCE {
                break;
            }

            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max == f64::INFINITY {
                    beta * 2.0
                } else {
                    (beta + beta_max) / 2.0
                };
            } else {
                beta_max = beta;
                beta = if beta_min == f64::NEG_INFINITY {
                    beta / 2.0
                } else {
                    (beta + beta_min) / 2.0
                };
            }
        }

        beta_sum += beta;
    }

    debug!(
        mean_sigma = (n as f64 / beta_sum).sqrt(),
        "perplexity search finished"
    );
    p
}

/// Symmetric joint probabilities p_ij summing to one, diagonal zero
pub fn joint_probabilities(data: &[Vec<f32>], perplexity: f64) -> Vec<f64> {
    let n = data.len();
    let distances = squared_distances(data);
    let cond = conditional_probabilities(&distances, n, perplexity);

    let mut p = vec![0.0; n * n];
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let v = cond[i * n + j] + cond[j * n + i];
                p[i * n + j] = v;
                total += v;
            }
        }
    }

    let total = total.max(f64::EPSILON);
    for i in 0..n {
        for j in 0..n {
            if i != j {
                p[i * n + j] = (p[i * n + j] / total).max(f64::EPSILON);
            }
        }
    }
    p
}

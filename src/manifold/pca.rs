use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{TsneError, check_data};

const POWER_ITERATIONS: usize = 1000;
const CONVERGENCE: f64 = 1e-12;

/// Project centred data onto its leading principal components.
///
/// Components come from power iteration with deflation on the covariance
/// matrix. Each component's sign is fixed so its largest-magnitude loading is
/// positive, which keeps the projection stable across seeds.
pub fn pca_project(
    data: &[Vec<f32>],
    n_components: usize,
    seed: u64,
) -> Result<Vec<Vec<f64>>, TsneError> {
    let dim = check_data(data)?;
    if n_components > dim {
        return Err(TsneError::TooManyComponents {
            requested: n_components,
            available: dim,
        });
    }

    let n = data.len();
    let mut mean = vec![0.0f64; dim];
    for row in data {
        for (m, &x) in mean.iter_mut().zip(row.iter()) {
            *m += x as f64;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n as f64);

    let centred: Vec<Vec<f64>> = data
        .iter()
        .map(|row| row.iter().zip(mean.iter()).map(|(&x, m)| x as f64 - m).collect())
        .collect();

    let denom = (n.max(2) - 1) as f64;
    let mut cov = vec![0.0f64; dim * dim];
    for row in &centred {
        for a in 0..dim {
            for b in a..dim {
                cov[a * dim + b] += row[a] * row[b];
            }
        }
    }
    for a in 0..dim {
        for b in a..dim {
            let v = cov[a * dim + b] / denom;
            cov[a * dim + b] = v;
            cov[b * dim + a] = v;
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut components = Vec::with_capacity(n_components);
    for _ in 0..n_components {
        let v = leading_eigenvector(&cov, dim, &mut rng);
        let eigenvalue = rayleigh(&cov, dim, &v);
        for a in 0..dim {
            for b in 0..dim {
                cov[a * dim + b] -= eigenvalue * v[a] * v[b];
            }
        }
        components.push(v);
    }

    Ok(centred
        .iter()
        .map(|row| {
            components
                .iter()
                .map(|c| row.iter().zip(c.iter()).map(|(x, w)| x * w).sum())
                .collect()
        })
        .collect())
}

fn leading_eigenvector(cov: &[f64], dim: usize, rng: &mut ChaCha8Rng) -> Vec<f64> {
    let mut v: Vec<f64> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
    normalize(&mut v);

    for _ in 0..POWER_ITERATIONS {
        let mut w = mat_vec(cov, dim, &v);
        if normalize(&mut w) == 0.0 {
            // no variance left in this subspace
            break;
        }
        let delta: f64 = w.iter().zip(v.iter()).map(|(a, b)| (a - b).abs()).sum();
        v = w;
        if delta < CONVERGENCE {
            break;
        }
    }

    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        v.iter_mut().for_each(|x| *x = -*x);
    }
    v
}

fn mat_vec(m: &[f64], dim: usize, v: &[f64]) -> Vec<f64> {
    (0..dim)
        .map(|a| (0..dim).map(|b| m[a * dim + b] * v[b]).sum())
        .collect()
}

fn rayleigh(m: &[f64], dim: usize, v: &[f64]) -> f64 {
    mat_vec(m, dim, v).iter().zip(v.iter()).map(|(a, b)| a * b).sum()
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}

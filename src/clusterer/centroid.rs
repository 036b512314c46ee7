pub fn compute_centroid(vectors: &[&[f32]]) -> Vec<f32> {
    let dim = vectors[0].len();
    let mut sums = vec![0.0f64; dim];

    for v in vectors {
        for (acc, &x) in sums.iter_mut().zip(v.iter()) {
            *acc += x as f64;
        }
    }

    let n = vectors.len() as f64;
    sums.into_iter().map(|s| (s / n) as f32).collect()
}

/// Per-feature variance averaged over all features.
///
/// Used to scale the convergence tolerance to the data.
pub fn mean_variance(data: &[Vec<f32>]) -> f64 {
    let n = data.len() as f64;
    let dim = data[0].len();
    let mut total = 0.0;

    for j in 0..dim {
        let mean = data.iter().map(|row| row[j] as f64).sum::<f64>() / n;
        let var = data
            .iter()
            .map(|row| {
                let d = row[j] as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        total += var;
    }

    total / dim as f64
}

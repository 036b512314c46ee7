pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum()
}

/// Index and squared distance of the closest centroid
pub fn nearest(point: &[f32], centroids: &[Vec<f32>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, center) in centroids.iter().enumerate() {
        let d = squared_euclidean(point, center);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

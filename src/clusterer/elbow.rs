use std::ops::RangeInclusive;

use tracing::info;

use crate::clusterer::{
    error::ClusterError,
    kmeans::{KMeansParams, kmeans},
    types::{ElbowCurve, ElbowPoint},
};

/// Fit one k-means model per cluster count and record its inertia.
///
/// `params.n_clusters` is ignored; every other setting and the seed are shared
/// by all fits.
pub fn inertia_sweep(
    data: &[Vec<f32>],
    params: &KMeansParams,
    ks: RangeInclusive<usize>,
    seed: u64,
) -> Result<ElbowCurve, ClusterError> {
    if ks.is_empty() || *ks.start() == 0 {
        return Err(ClusterError::InvalidParams(format!(
            "cluster range {}..={} must be non-empty and start at 1 or more",
            ks.start(),
            ks.end()
        )));
    }

    let mut curve = ElbowCurve::default();
    for k in ks {
        let fit_params = KMeansParams {
            n_clusters: k,
            ..params.clone()
        };
        let result = kmeans(data, &fit_params, seed)?;
        info!(k, inertia = result.inertia, "inertia sweep point");

        curve.points.push(ElbowPoint {
            k,
            inertia: result.inertia,
            iterations: result.iterations,
        });
    }

    Ok(curve)
}

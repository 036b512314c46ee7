use super::*;
use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CENTERS: [[f32; 2]; 4] = [[0.0, 0.0], [10.0, 10.0], [0.0, 10.0], [10.0, 0.0]];

/// 4 tight, well-separated blobs, `per_blob` points each, blob-major order
fn blobs(per_blob: usize) -> Vec<Vec<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    CENTERS
        .iter()
        .flat_map(|c| {
            (0..per_blob)
                .map(|_| {
                    vec![
                        c[0] + rng.gen_range(-0.5..0.5),
                        c[1] + rng.gen_range(-0.5..0.5),
                    ]
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn total_sum_of_squares(data: &[Vec<f32>]) -> f64 {
    let rows: Vec<&[f32]> = data.iter().map(|r| r.as_slice()).collect();
    let mean = compute_centroid(&rows);
    data.iter().map(|r| squared_euclidean(r, &mean)).sum()
}

#[test]
fn test_simple_kmeans() {
    let v1 = vec![1.0, 0.0];
    let v2 = vec![0.9, 0.1];
    let v3 = vec![0.0, 1.0];
    let v4 = vec![0.1, 0.9];

    let res = kmeans(&[v1, v2, v3, v4], &KMeansParams::new(2), 42).unwrap();

    assert_eq!(res.clusters.len(), 2);
    assert_eq!(res.labels[0], res.labels[1]);
    assert_eq!(res.labels[2], res.labels[3]);
    assert_ne!(res.labels[0], res.labels[2]);
}

#[test]
fn test_labels_cover_every_sample() {
    let data = blobs(25);
    let res = kmeans(&data, &KMeansParams::new(4), 1000).unwrap();

    assert_eq!(res.labels.len(), data.len());
    assert!(res.labels.iter().all(|&l| l < 4));
    assert_eq!(res.cluster_sizes().iter().sum::<usize>(), data.len());

    let mut distinct = res.labels.clone();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct.len(), 4);
}

#[test]
fn test_blobs_are_recovered() {
    let data = blobs(20);
    let res = kmeans(&data, &KMeansParams::new(4), 1000).unwrap();

    for blob in res.labels.chunks(20) {
        assert!(blob.iter().all(|&l| l == blob[0]), "blob split: {:?}", blob);
    }
    for cluster in &res.clusters {
        let near_center = CENTERS.iter().any(|c| {
            (cluster.centroid[0] - c[0]).abs() < 0.5 && (cluster.centroid[1] - c[1]).abs() < 0.5
        });
        assert!(near_center, "unexpected centroid {:?}", cluster.centroid);
    }
}

#[test]
fn test_inertia_matches_assignments() {
    let data = blobs(15);
    let res = kmeans(&data, &KMeansParams::new(3), 3).unwrap();

    let expected: f64 = data
        .iter()
        .zip(res.labels.iter())
        .map(|(x, &l)| squared_euclidean(x, &res.clusters[l].centroid))
        .sum();

    assert!(res.inertia >= 0.0);
    assert_relative_eq!(res.inertia, expected, max_relative = 1e-9);
}

#[test]
fn test_single_cluster_inertia_is_total_variance() {
    let data = blobs(10);
    let res = kmeans(&data, &KMeansParams::new(1), 5).unwrap();

    assert_relative_eq!(res.inertia, total_sum_of_squares(&data), max_relative = 1e-4);
}

#[test]
fn test_one_cluster_per_sample_has_zero_inertia() {
    let data = blobs(3);
    let res = kmeans(&data, &KMeansParams::new(data.len()), 11).unwrap();

    assert_relative_eq!(res.inertia, 0.0);
}

#[test]
fn test_duplicate_samples() {
    let data = vec![vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0], vec![5.0, 5.0]];
    let res = kmeans(&data, &KMeansParams::new(3), 2).unwrap();

    assert_eq!(res.labels.len(), 4);
    assert!(res.labels.iter().all(|&l| l < 3));
    assert_relative_eq!(res.inertia, 0.0);
}

#[test]
fn test_same_seed_is_deterministic() {
    let data = blobs(12);
    let params = KMeansParams::new(5).n_init(3);

    let a = kmeans(&data, &params, 1000).unwrap();
    let b = kmeans(&data, &params, 1000).unwrap();

    assert_eq!(a.labels, b.labels);
    assert_eq!(a.inertia, b.inertia);
    assert_eq!(a.centroids(), b.centroids());
}

#[test]
fn test_predict_agrees_with_fit() {
    let data = blobs(10);
    let res = kmeans(&data, &KMeansParams::new(4), 9).unwrap();
    let centroids: Vec<Vec<f32>> = res.clusters.iter().map(|c| c.centroid.clone()).collect();

    assert_eq!(predict(&centroids, &data), res.labels);
}

#[test]
fn test_more_clusters_than_samples() {
    let data = blobs(1);
    let err = kmeans(&data, &KMeansParams::new(5), 0).unwrap_err();
    assert_eq!(err, ClusterError::TooFewSamples { k: 5, samples: 4 });
}

#[test]
fn test_invalid_input() {
    assert_eq!(
        kmeans(&[], &KMeansParams::new(2), 0).unwrap_err(),
        ClusterError::EmptyData
    );

    let ragged = vec![vec![1.0, 2.0], vec![1.0]];
    assert_eq!(
        kmeans(&ragged, &KMeansParams::new(1), 0).unwrap_err(),
        ClusterError::RaggedRows {
            row: 1,
            found: 1,
            expected: 2
        }
    );

    let data = blobs(2);
    assert!(matches!(
        kmeans(&data, &KMeansParams::new(0), 0),
        Err(ClusterError::InvalidParams(_))
    ));
    assert!(matches!(
        kmeans(&data, &KMeansParams::new(2).n_init(0), 0),
        Err(ClusterError::InvalidParams(_))
    ));
    assert!(matches!(
        kmeans(&data, &KMeansParams::new(2).tolerance(f64::NAN), 0),
        Err(ClusterError::InvalidParams(_))
    ));
}

#[test]
fn test_dominant_targets() {
    let data = blobs(5);
    let res = kmeans(&data, &KMeansParams::new(4), 1).unwrap();
    let targets: Vec<u8> = (0..4u8).flat_map(|t| std::iter::repeat(t).take(5)).collect();

    let dominant = res.dominant_targets(&targets);
    assert_eq!(dominant.len(), 4);

    let mut seen: Vec<u8> = dominant.into_iter().map(|d| d.unwrap()).collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn test_inertia_sweep_shape() {
    let data = blobs(10);
    let curve = inertia_sweep(&data, &KMeansParams::default(), 2..=6, 1000).unwrap();

    let ks: Vec<usize> = curve.points.iter().map(|p| p.k).collect();
    assert_eq!(ks, vec![2, 3, 4, 5, 6]);
    assert_eq!(curve.k_range(), Some((2, 6)));
    assert!(curve.inertias().iter().all(|&i| i >= 0.0));
}

#[test]
fn test_inertia_drops_until_true_cluster_count() {
    let data = blobs(20);
    let curve = inertia_sweep(&data, &KMeansParams::default(), 1..=4, 1000).unwrap();
    let inertias = curve.inertias();

    for pair in inertias.windows(2) {
        assert!(pair[1] < pair[0], "inertia did not drop: {:?}", inertias);
    }
}

#[test]
fn test_inertia_sweep_rejects_bad_range() {
    let data = blobs(5);
    assert!(inertia_sweep(&data, &KMeansParams::default(), 0..=3, 0).is_err());
    #[allow(clippy::reversed_empty_ranges)]
    let empty = 5..=2;
    assert!(inertia_sweep(&data, &KMeansParams::default(), empty, 0).is_err());
}

//! Segment clustering and letter labels
//!
//! Segments are mean-pooled into one embedding each, the embeddings are
//! standardised, and spectral clustering groups segments that sound alike.
//!
//! # Algorithm
//!
//! 1. Affinity: symmetrised k-nearest-neighbour connectivity under cosine
//!    similarity (each segment counts itself as a neighbour), weighted by the
//!    non-negative part of the cosine, `A = 0.5·(C + Cᵀ) ⊙ max(cos, 0)`
//! 2. Spectral embedding: top-`k` eigenvectors of `D^-1/2 · A · D^-1/2`
//!    (Jacobi eigendecomposition), rows normalised to unit length
//! 3. k-means on the embedding with deterministic farthest-first seeding
//! 4. Model selection: for every `k` in the search range, the mean
//!    intra-cluster cosine similarity of the embeddings; the best `k` wins,
//!    the smallest on ties
//!
//! # Reference
//!
//! Ng, A. Y., Jordan, M. I., & Weiss, Y. (2001). On Spectral Clustering:
//! Analysis and an algorithm. *Advances in Neural Information Processing Systems*.

use super::similarity::SelfSimilarityMatrix;
use crate::features::stack::standardize_columns;

const EPSILON: f32 = 1e-10;
const MAX_JACOBI_SWEEPS: usize = 100;
const MAX_KMEANS_ITERATIONS: usize = 100;

/// A larger cluster count must beat the current best by more than this
const SCORE_TOLERANCE: f32 = 1e-5;

/// Parameters for cluster-count search
#[derive(Debug, Clone, Copy)]
pub struct ClusterParams {
    /// Smallest cluster count tried
    pub min_clusters: usize,
    /// Largest cluster count tried
    pub max_clusters: usize,
    /// Cluster count used when the search range is empty
    pub default_clusters: usize,
    /// Upper bound on kNN neighbours
    pub max_neighbors: usize,
}

/// Clustering outcome
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Cluster id per segment, numbered by first appearance (0, 1, 2, ...)
    pub labels: Vec<usize>,
    /// Number of clusters used
    pub k: usize,
    /// Mean intra-cluster cosine similarity
    pub score: f32,
}

/// Mean-pool sync frames within each segment, then standardise the embeddings
pub fn segment_embeddings(features: &[Vec<f32>], edges: &[usize]) -> Vec<Vec<f32>> {
    let mut embeddings = crate::features::stack::sync_mean(features, edges);
    standardize_columns(&mut embeddings);
    embeddings
}

/// Letter identifier for a cluster index: A..Z, then AA, AB, ...
pub fn letter_label(index: usize) -> String {
    let mut n = index as i64;
    let mut label = String::new();
    loop {
        let c = (b'A' + (n % 26) as u8) as char;
        label.insert(0, c);
        n = n / 26 - 1;
        if n < 0 {
            break;
        }
    }
    label
}

/// Cluster segment embeddings, searching for the best cluster count
///
/// With a single segment, or when the chosen count reaches the segment count,
/// every segment forms its own cluster.
pub fn cluster_segments(embeddings: &[Vec<f32>], params: &ClusterParams) -> Clustering {
    let m = embeddings.len();
    if m == 0 {
        return Clustering {
            labels: vec![],
            k: 0,
            score: 0.0,
        };
    }

    let cosine = SelfSimilarityMatrix::from_features(embeddings);

    // Keep at least one shared cluster when the range allows it
    let upper = params.max_clusters.min(m.saturating_sub(1));
    let mut best: Option<Clustering> = None;
    for k in params.min_clusters.max(1)..=upper {
        let labels = spectral_clustering(embeddings, &cosine, k, params.max_neighbors);
        let score = intra_cluster_similarity(&cosine, &labels);
        log::debug!("k={} intra-cluster similarity {:.4}", k, score);
        if best.as_ref().map_or(true, |b| score > b.score + SCORE_TOLERANCE) {
            best = Some(Clustering { labels, k, score });
        }
    }

    let clustering = match best {
        Some(c) => c,
        None => {
            let k = params.default_clusters.min(m).max(1);
            let labels = spectral_clustering(embeddings, &cosine, k, params.max_neighbors);
            let score = intra_cluster_similarity(&cosine, &labels);
            Clustering { labels, k, score }
        }
    };

    let labels = renumber_by_first_appearance(&clustering.labels);
    log::debug!(
        "Clustered {} segments into {} groups",
        m,
        labels.iter().max().map(|&l| l + 1).unwrap_or(0)
    );
    Clustering {
        labels,
        k: clustering.k,
        score: clustering.score,
    }
}

/// Spectral clustering of `points` into `k` groups
fn spectral_clustering(
    points: &[Vec<f32>],
    cosine: &SelfSimilarityMatrix,
    k: usize,
    max_neighbors: usize,
) -> Vec<usize> {
    let m = points.len();
    if k >= m {
        return (0..m).collect();
    }
    if k <= 1 {
        return vec![0; m];
    }

    // Step 1: kNN connectivity (self included), symmetrised
    let n_neighbors = max_neighbors.min(m - 1).max(1);
    let mut connectivity = vec![vec![0.0f32; m]; m];
    for (i, row) in connectivity.iter_mut().enumerate() {
        let mut order: Vec<usize> = (0..m).filter(|&j| j != i).collect();
        order.sort_by(|&a, &b| {
            cosine
                .get(i, b)
                .partial_cmp(&cosine.get(i, a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        row[i] = 1.0;
        for &j in order.iter().take(n_neighbors.saturating_sub(1)) {
            row[j] = 1.0;
        }
    }
    let mut affinity = vec![vec![0.0f32; m]; m];
    for i in 0..m {
        for j in 0..m {
            let linked = 0.5 * (connectivity[i][j] + connectivity[j][i]);
            affinity[i][j] = linked * cosine.get(i, j).max(0.0);
        }
    }

    // Step 2: Normalised affinity and its top-k eigenvectors
    let degree: Vec<f32> = affinity.iter().map(|row| row.iter().sum()).collect();
    let inv_sqrt: Vec<f32> = degree
        .iter()
        .map(|&d| if d > EPSILON { 1.0 / d.sqrt() } else { 0.0 })
        .collect();
    let normalized: Vec<Vec<f64>> = (0..m)
        .map(|i| {
            (0..m)
                .map(|j| (inv_sqrt[i] * affinity[i][j] * inv_sqrt[j]) as f64)
                .collect()
        })
        .collect();

    let (values, vectors) = symmetric_eigen(normalized);
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut embedding: Vec<Vec<f32>> = (0..m)
        .map(|i| order.iter().take(k).map(|&c| vectors[i][c] as f32).collect())
        .collect();
    crate::features::stack::normalize_rows(&mut embedding);

    // Step 3: k-means
    kmeans(&embedding, k)
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations
///
/// Returns `(eigenvalues, eigenvectors)` with eigenvector `c` stored in
/// column `c` (`vectors[row][c]`).
fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..MAX_JACOBI_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off < 1e-18 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < 1e-15 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vkp = row[p];
                    let vkq = row[q];
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = (0..n).map(|i| a[i][i]).collect();
    (values, v)
}

/// Lloyd's k-means with farthest-first seeding starting from point 0
fn kmeans(points: &[Vec<f32>], k: usize) -> Vec<usize> {
    let m = points.len();
    let dims = points.first().map(|p| p.len()).unwrap_or(0);

    let mut centroids: Vec<Vec<f32>> = vec![points[0].clone()];
    while centroids.len() < k {
        let mut far = 0usize;
        let mut far_dist = -1.0f32;
        for (i, p) in points.iter().enumerate() {
            let d = centroids
                .iter()
                .map(|c| squared_distance(p, c))
                .fold(f32::INFINITY, f32::min);
            if d > far_dist {
                far_dist = d;
                far = i;
            }
        }
        centroids.push(points[far].clone());
    }

    let mut labels = vec![usize::MAX; m];
    for _ in 0..MAX_KMEANS_ITERATIONS {
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = squared_distance(p, centroid);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            if labels[i] != best {
                labels[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&Vec<f32>> = points
                .iter()
                .zip(labels.iter())
                .filter(|(_, &l)| l == c)
                .map(|(p, _)| p)
                .collect();
            if members.is_empty() {
                continue;
            }
            let mut mean = vec![0.0f32; dims];
            for p in &members {
                for (acc, v) in mean.iter_mut().zip(p.iter()) {
                    *acc += v;
                }
            }
            mean.iter_mut().for_each(|v| *v /= members.len() as f32);
            *centroid = mean;
        }
    }

    labels
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Mean over segments of the mean cosine similarity to its cluster members
/// (itself included)
fn intra_cluster_similarity(cosine: &SelfSimilarityMatrix, labels: &[usize]) -> f32 {
    let m = labels.len();
    if m == 0 {
        return 0.0;
    }
    let total: f32 = (0..m)
        .map(|i| {
            let members: Vec<usize> = (0..m).filter(|&j| labels[j] == labels[i]).collect();
            members.iter().map(|&j| cosine.get(i, j)).sum::<f32>() / members.len() as f32
        })
        .sum();
    total / m as f32
}

/// Renumber cluster ids so they appear as 0, 1, 2, ... in time order
fn renumber_by_first_appearance(labels: &[usize]) -> Vec<usize> {
    let mut mapping: Vec<(usize, usize)> = Vec::new();
    labels
        .iter()
        .map(|&l| match mapping.iter().find(|(old, _)| *old == l) {
            Some(&(_, new)) => new,
            None => {
                let new = mapping.len();
                mapping.push((l, new));
                new
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ClusterParams {
        ClusterParams {
            min_clusters: 3,
            max_clusters: 6,
            default_clusters: 3,
            max_neighbors: 10,
        }
    }

    #[test]
    fn test_letter_labels() {
        assert_eq!(letter_label(0), "A");
        assert_eq!(letter_label(25), "Z");
        assert_eq!(letter_label(26), "AA");
        assert_eq!(letter_label(27), "AB");
        assert_eq!(letter_label(52), "BA");
    }

    #[test]
    fn test_jacobi_diagonalises() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let (mut values, _) = symmetric_eigen(a);
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((values[0] - 1.0).abs() < 1e-9);
        assert!((values[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_kmeans_separates_blobs() {
        let points = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
        ];
        let labels = kmeans(&points, 2);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_repeated_patterns_share_clusters() {
        // A B A B C A pattern in three orthogonal directions
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let c = vec![0.0, 0.0, 1.0];
        let embeddings = vec![
            a.clone(),
            b.clone(),
            a.clone(),
            b.clone(),
            c,
            a,
        ];
        let clustering = cluster_segments(&embeddings, &params());
        let l = &clustering.labels;
        assert_eq!(l[0], 0);
        assert_eq!(l[0], l[2]);
        assert_eq!(l[0], l[5]);
        assert_eq!(l[1], l[3]);
        assert_ne!(l[0], l[1]);
    }

    #[test]
    fn test_fewer_segments_than_min_clusters() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let clustering = cluster_segments(&embeddings, &params());
        assert_eq!(clustering.labels, vec![0, 1]);
    }

    #[test]
    fn test_k_search_stops_below_segment_count() {
        // Four segments: k = 4 would give every segment its own letter
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let c = vec![0.0, 0.0, 1.0];
        let embeddings = vec![a.clone(), b, a, c];
        let clustering = cluster_segments(&embeddings, &params());
        assert_eq!(clustering.k, 3);
        assert!(clustering.labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn test_renumber_by_first_appearance() {
        assert_eq!(renumber_by_first_appearance(&[2, 2, 0, 1, 0]), vec![0, 0, 1, 2, 1]);
    }
}

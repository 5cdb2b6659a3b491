use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::pipeline::types::{ClusteringResult, SimilarityMatrix};
use crate::pipeline::{MAX_CLUSTER_COUNT, TARGET_PIPELINE};

/// One agglomerative merge step. Cluster ids are 0..m for the singleton
/// leaves and m+k for the cluster produced by the k-th merge.
struct Merge {
    left: usize,
    right: usize,
    height: f64,
    size: usize,
}

/// Partitions the words of a similarity matrix into an automatically-sized
/// number of clusters.
///
/// Similarity is converted to distance (`1 - |similarity|`), a single Ward
/// dendrogram is built over the full distance matrix, and the dendrogram is
/// cut at every candidate cluster count from 2 up to the number of words,
/// keeping the cut with the best silhouette score. A strict improvement is
/// required to replace the running best, so ties keep the smaller count.
///
/// Returns `NotConverged` when fewer than two words are clusterable, when
/// the best count climbs above [`MAX_CLUSTER_COUNT`], or when no candidate
/// partition scores above zero.
pub fn select_clusters(matrix: &SimilarityMatrix) -> ClusteringResult {
    // Drop rows/columns where the word has no score at all
    let keep: Vec<usize> = (0..matrix.len())
        .filter(|&i| !matrix.row_is_undefined(i))
        .collect();
    let m = keep.len();
    if m < 2 {
        debug!(
            target: TARGET_PIPELINE,
            "Fewer than 2 clusterable words ({}), not converging", m
        );
        return ClusteringResult::NotConverged;
    }

    let words: Vec<&String> = keep.iter().map(|&i| &matrix.words()[i]).collect();

    // Convert similarity to distance; the absolute value guards against
    // negative similarity scores
    let mut dist = vec![vec![0.0f64; m]; m];
    for (r, &i) in keep.iter().enumerate() {
        for (c, &j) in keep.iter().enumerate() {
            if r != c {
                dist[r][c] = match matrix.get(i, j) {
                    Some(similarity) => 1.0 - similarity.abs(),
                    // A missing score between two otherwise-resolvable words
                    // is treated as maximally distant
                    None => 1.0,
                };
            }
        }
    }

    let merges = ward_linkage(&dist);

    let mut best_score = 0.0;
    let mut best_n = 2;
    let mut best_labels: Option<Vec<usize>> = None;

    for n in 2..=m {
        let labels = cut_dendrogram(&merges, m, n);
        let score = silhouette_score(&dist, &labels);
        if score > best_score {
            debug!(target: TARGET_PIPELINE, "n: {}, score: {:.4}", n, score);
            best_score = score;
            best_n = n;
            best_labels = Some(labels);
        }
        if best_n > MAX_CLUSTER_COUNT {
            // A best cluster count this high means the similarity structure
            // is too fragmented to yield a useful small set of topics
            info!(
                target: TARGET_PIPELINE,
                "Clusters did not converge: best n {} exceeds ceiling {}", best_n, MAX_CLUSTER_COUNT
            );
            return ClusteringResult::NotConverged;
        }
    }

    match best_labels {
        Some(labels) => {
            info!(
                target: TARGET_PIPELINE,
                "Clusters converged: n = {}, silhouette score = {:.4}", best_n, best_score
            );
            let assignments: BTreeMap<String, usize> = words
                .iter()
                .zip(labels.iter())
                .map(|(word, &cluster)| ((*word).clone(), cluster))
                .collect();
            ClusteringResult::Converged {
                assignments,
                score: best_score,
                n_clusters: best_n,
            }
        }
        None => {
            // No candidate partition scored above zero
            info!(
                target: TARGET_PIPELINE,
                "Clusters did not converge: no partition with a positive silhouette score"
            );
            ClusteringResult::NotConverged
        }
    }
}

/// Builds the full Ward-linkage dendrogram over a distance matrix.
///
/// Ward linkage merges the pair of clusters that minimizes the increase in
/// total within-cluster variance; inter-cluster distances are maintained
/// with the Lance-Williams update. Merge heights are monotone, so the k-th
/// merge is also the k-th lowest.
fn ward_linkage(dist: &[Vec<f64>]) -> Vec<Merge> {
    let m = dist.len();
    let key = |a: usize, b: usize| if a < b { (a, b) } else { (b, a) };

    let mut sizes: Vec<usize> = vec![1; m];
    let mut active: Vec<usize> = (0..m).collect();
    let mut distances: HashMap<(usize, usize), f64> = HashMap::new();
    for i in 0..m {
        for j in (i + 1)..m {
            distances.insert((i, j), dist[i][j]);
        }
    }

    let mut merges = Vec::with_capacity(m.saturating_sub(1));
    while active.len() > 1 {
        // Closest active pair
        let mut closest = (0usize, 0usize, f64::INFINITY);
        for x in 0..active.len() {
            for y in (x + 1)..active.len() {
                let (a, b) = (active[x], active[y]);
                let d = distances[&key(a, b)];
                if d < closest.2 {
                    closest = (a, b, d);
                }
            }
        }
        let (left, right, height) = closest;
        let new_id = sizes.len();
        let (n_left, n_right) = (sizes[left] as f64, sizes[right] as f64);

        // Lance-Williams update for Ward linkage
        for &other in active.iter().filter(|&&c| c != left && c != right) {
            let n_other = sizes[other] as f64;
            let d_left = distances[&key(left, other)];
            let d_right = distances[&key(right, other)];
            let squared = ((n_left + n_other) * d_left * d_left
                + (n_right + n_other) * d_right * d_right
                - n_other * height * height)
                / (n_left + n_right + n_other);
            distances.insert(key(new_id, other), squared.max(0.0).sqrt());
        }

        sizes.push(sizes[left] + sizes[right]);
        active.retain(|&c| c != left && c != right);
        active.push(new_id);
        merges.push(Merge {
            left,
            right,
            height,
            size: sizes[new_id],
        });
    }
    merges
}

/// Cuts a dendrogram over `m` leaves into exactly `n` clusters by applying
/// the first `m - n` merges. Cluster labels are contiguous from 0, numbered
/// in order of first appearance across the leaves.
fn cut_dendrogram(merges: &[Merge], m: usize, n: usize) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..m + merges.len()).collect();
    for (k, merge) in merges.iter().take(m.saturating_sub(n)).enumerate() {
        let id = m + k;
        parent[merge.left] = id;
        parent[merge.right] = id;
    }

    let mut label_of: HashMap<usize, usize> = HashMap::new();
    let mut labels = Vec::with_capacity(m);
    for leaf in 0..m {
        let mut root = leaf;
        while parent[root] != root {
            root = parent[root];
        }
        let next = label_of.len();
        labels.push(*label_of.entry(root).or_insert(next));
    }
    labels
}

/// Mean silhouette score of a partition over a precomputed distance matrix.
///
/// For each point: `a` is the mean distance to the other members of its own
/// cluster, `b` the smallest mean distance to any other cluster, and the
/// point's silhouette is `(b - a) / max(a, b)`. Points in singleton clusters
/// contribute zero.
fn silhouette_score(dist: &[Vec<f64>], labels: &[usize]) -> f64 {
    let m = labels.len();
    let n_clusters = labels.iter().copied().max().map_or(0, |top| top + 1);
    if m == 0 || n_clusters < 2 {
        return 0.0;
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_clusters];
    for (i, &label) in labels.iter().enumerate() {
        members[label].push(i);
    }

    let mut total = 0.0;
    for i in 0..m {
        let own = &members[labels[i]];
        if own.len() < 2 {
            continue;
        }
        let a = own
            .iter()
            .filter(|&&j| j != i)
            .map(|&j| dist[i][j])
            .sum::<f64>()
            / (own.len() - 1) as f64;
        let b = members
            .iter()
            .enumerate()
            .filter(|(label, cluster)| *label != labels[i] && !cluster.is_empty())
            .map(|(_, cluster)| {
                cluster.iter().map(|&j| dist[i][j]).sum::<f64>() / cluster.len() as f64
            })
            .fold(f64::INFINITY, f64::min);
        if b.is_finite() {
            let denom = a.max(b);
            if denom > 0.0 {
                total += (b - a) / denom;
            }
        }
    }
    total / m as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two tight groups far apart: {0, 1} at distance 0.1, {2, 3} at
    // distance 0.1, cross distances 0.9
    fn two_group_distances() -> Vec<Vec<f64>> {
        let mut dist = vec![vec![0.9; 4]; 4];
        for (i, row) in dist.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        dist[0][1] = 0.1;
        dist[1][0] = 0.1;
        dist[2][3] = 0.1;
        dist[3][2] = 0.1;
        dist
    }

    #[test]
    fn test_ward_linkage_merges_tight_pairs_first() {
        let merges = ward_linkage(&two_group_distances());
        assert_eq!(merges.len(), 3);
        // The first two merges join the tight pairs at their raw distance
        assert!((merges[0].height - 0.1).abs() < 1e-12);
        assert!((merges[1].height - 0.1).abs() < 1e-12);
        assert!(merges[2].height > merges[1].height);
        assert_eq!(merges[2].size, 4);
    }

    #[test]
    fn test_ward_heights_are_monotone() {
        let merges = ward_linkage(&two_group_distances());
        for pair in merges.windows(2) {
            assert!(pair[0].height <= pair[1].height);
        }
    }

    #[test]
    fn test_cut_dendrogram_counts() {
        let dist = two_group_distances();
        let merges = ward_linkage(&dist);
        for n in 1..=4 {
            let labels = cut_dendrogram(&merges, 4, n);
            let distinct = labels.iter().copied().max().unwrap() + 1;
            assert_eq!(distinct, n);
        }
    }

    #[test]
    fn test_cut_dendrogram_two_clusters_match_groups() {
        let dist = two_group_distances();
        let merges = ward_linkage(&dist);
        let labels = cut_dendrogram(&merges, 4, 2);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_silhouette_score_hand_computed() {
        let dist = two_group_distances();
        let labels = vec![0, 0, 1, 1];
        // Every point: a = 0.1, b = 0.9, s = (0.9 - 0.1) / 0.9
        let expected = 0.8 / 0.9;
        assert!((silhouette_score(&dist, &labels) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_silhouette_score_singletons_are_zero() {
        let dist = two_group_distances();
        let labels = vec![0, 1, 2, 3];
        assert_eq!(silhouette_score(&dist, &labels), 0.0);
    }

    #[test]
    fn test_silhouette_prefers_true_partition() {
        let dist = two_group_distances();
        let good = silhouette_score(&dist, &[0, 0, 1, 1]);
        let bad = silhouette_score(&dist, &[0, 1, 0, 1]);
        assert!(good > bad);
    }
}

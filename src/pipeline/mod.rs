// Module declarations
pub mod labeler;
pub mod matrix;
pub mod selector;
pub mod types;

// Re-export the pipeline stages and their types
pub use labeler::label_clusters;
pub use matrix::build_similarity_matrix;
pub use selector::select_clusters;
pub use types::{ClusteringResult, LabeledWord, SimilarityMatrix};

use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::taxonomy::Taxonomy;

pub const TARGET_PIPELINE: &str = "clustering";

/// Label for words that cannot be placed under a taxonomy term
pub const OTHER_LABEL: &str = "other";

/// Ceiling on the selected cluster count. A best cluster count above this
/// value signals that the similarity structure is too fragmented to produce
/// a meaningful small set of topics, and the scan declares non-convergence.
pub const MAX_CLUSTER_COUNT: usize = 15;

/// Groups a list of predicted words into labeled topic clusters.
///
/// This function:
/// 1. Builds the pairwise taxonomic similarity matrix
/// 2. Partitions the resolvable words into clusters, choosing the cluster
///    count by silhouette score
/// 3. Labels each cluster with its lowest common hypernym
/// 4. Routes unresolvable words, and every word when clustering does not
///    converge, to the `"other"` label
///
/// # Arguments
/// * `words` - Ordered, duplicate-free word list (duplicates are rejected)
/// * `taxonomy` - Taxonomy to resolve senses against
///
/// # Returns
/// * `Ok(labels)` - Word to label, covering every input word exactly once
/// * `Err` - If the input contains duplicate words
pub fn cluster_predictions(
    words: &[String],
    taxonomy: &Taxonomy,
) -> Result<BTreeMap<String, String>> {
    let mut seen = HashSet::new();
    for word in words {
        if !seen.insert(word.as_str()) {
            return Err(anyhow!("Duplicate word in input: {}", word));
        }
    }
    if words.is_empty() {
        return Ok(BTreeMap::new());
    }

    info!(target: TARGET_PIPELINE, "Clustering {} predicted words", words.len());

    let (matrix, unresolvable) = build_similarity_matrix(words, taxonomy);

    let mut labels = BTreeMap::new();
    match select_clusters(&matrix) {
        ClusteringResult::Converged {
            assignments,
            score,
            n_clusters,
        } => {
            info!(
                target: TARGET_PIPELINE,
                "Labeling {} clusters (silhouette score {:.4})", n_clusters, score
            );
            let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
            for (word, cluster) in assignments {
                groups.entry(cluster).or_default().push(word);
            }
            for labeled in label_clusters(&groups, taxonomy) {
                labels.insert(labeled.word, labeled.label);
            }
            for word in unresolvable {
                labels.insert(word, OTHER_LABEL.to_string());
            }
        }
        ClusteringResult::NotConverged => {
            info!(
                target: TARGET_PIPELINE,
                "Clustering did not converge, labeling all {} words as {:?}",
                words.len(),
                OTHER_LABEL
            );
            for word in words {
                labels.insert(word.clone(), OTHER_LABEL.to_string());
            }
        }
    }

    debug_assert_eq!(labels.len(), words.len());
    Ok(labels)
}

use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::pipeline::types::LabeledWord;
use crate::pipeline::{OTHER_LABEL, TARGET_PIPELINE};
use crate::taxonomy::{SenseId, Taxonomy};

/// Labels each cluster with the lowest common hypernym (LCH) of its words.
///
/// For every word that resolves in the taxonomy, the ancestor sets of all of
/// its senses are merged; the per-word sets are then intersected across the
/// cluster. The most specific surviving ancestor names the cluster. Words
/// with no senses don't constrain the intersection but still receive the
/// cluster's label. A cluster with an empty intersection is labeled
/// `"other"`.
///
/// # Arguments
/// * `clusters` - Cluster id to member words
/// * `taxonomy` - Taxonomy to resolve senses against
///
/// # Returns
/// * One `(word, label)` pair per member word across all clusters
pub fn label_clusters(
    clusters: &BTreeMap<usize, Vec<String>>,
    taxonomy: &Taxonomy,
) -> Vec<LabeledWord> {
    let mut labeled = Vec::new();
    for (cluster_id, words) in clusters {
        let label = match lowest_common_hypernym(words, taxonomy) {
            Some(sense) => taxonomy.term(sense).to_string(),
            None => OTHER_LABEL.to_string(),
        };
        debug!(
            target: TARGET_PIPELINE,
            "Cluster {}: {} words, label {:?}",
            cluster_id,
            words.len(),
            label
        );
        for word in words {
            labeled.push(LabeledWord {
                word: word.clone(),
                label: label.clone(),
            });
        }
    }
    labeled
}

/// Finds the most specific ancestor shared by every sense-bearing word.
///
/// Ancestors tied at maximum depth are broken lexicographically by sense
/// name, so the result is deterministic. Returns `None` when the words share
/// no ancestor or none of them has senses.
fn lowest_common_hypernym(words: &[String], taxonomy: &Taxonomy) -> Option<SenseId> {
    let mut common: Option<HashSet<SenseId>> = None;
    for word in words {
        let senses = taxonomy.senses_of(word);
        if senses.is_empty() {
            continue;
        }
        let mut ancestors = HashSet::new();
        for &sense in senses {
            ancestors.extend(taxonomy.hypernym_closure(sense));
        }
        common = Some(match common {
            None => ancestors,
            Some(current) => current.intersection(&ancestors).copied().collect(),
        });
    }

    common?.into_iter().max_by(|&a, &b| {
        taxonomy
            .depth(a)
            .cmp(&taxonomy.depth(b))
            // Reversed name comparison so the lexicographically smallest
            // name wins among equally deep ancestors
            .then_with(|| taxonomy.sense_name(b).cmp(taxonomy.sense_name(a)))
    })
}

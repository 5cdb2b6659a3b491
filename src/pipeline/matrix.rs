use std::collections::BTreeSet;
use tracing::debug;

use crate::pipeline::types::SimilarityMatrix;
use crate::pipeline::TARGET_PIPELINE;
use crate::taxonomy::Taxonomy;

/// Calculates pairwise taxonomic similarity for each word in the list.
///
/// Each word's first (canonical) taxonomy sense is compared with Wu-Palmer
/// similarity. Words with no taxonomy senses cannot be scored: every cell
/// involving them, including their diagonal, is undefined, and the word is
/// collected into the returned unresolvable set.
///
/// # Arguments
/// * `words` - Ordered, duplicate-free word list
/// * `taxonomy` - Taxonomy to resolve senses against
///
/// # Returns
/// * The symmetric similarity matrix and the set of unresolvable words
pub fn build_similarity_matrix(
    words: &[String],
    taxonomy: &Taxonomy,
) -> (SimilarityMatrix, BTreeSet<String>) {
    let n = words.len();
    let mut cells = vec![vec![Some(1.0); n]; n];
    let mut unresolvable = BTreeSet::new();

    let first_senses: Vec<_> = words
        .iter()
        .map(|word| taxonomy.senses_of(word).first().copied())
        .collect();

    for i in 0..n {
        match first_senses[i] {
            None => {
                // Not a taxonomy word; no cell involving it is defined
                unresolvable.insert(words[i].clone());
                for j in 0..n {
                    cells[i][j] = None;
                    cells[j][i] = None;
                }
            }
            Some(sense_i) => {
                for j in (i + 1)..n {
                    if let Some(sense_j) = first_senses[j] {
                        let score = taxonomy.wup_similarity(sense_i, sense_j);
                        cells[i][j] = Some(score);
                        cells[j][i] = Some(score);
                    }
                }
            }
        }
    }

    debug!(
        target: TARGET_PIPELINE,
        "Similarity matrix built: {} words, {} unresolvable",
        n,
        unresolvable.len()
    );

    (SimilarityMatrix::new(words.to_vec(), cells), unresolvable)
}

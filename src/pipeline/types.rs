use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symmetric pairwise taxonomic similarity over a fixed word list.
///
/// Cells are `Option<f64>`: `None` is the explicit "undefined" sentinel for
/// any pair involving a taxonomy-unresolvable word. The diagonal is 1.0 for
/// resolvable words and `None` for unresolvable ones.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    words: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl SimilarityMatrix {
    pub(crate) fn new(words: Vec<String>, cells: Vec<Vec<Option<f64>>>) -> Self {
        debug_assert_eq!(words.len(), cells.len());
        Self { words, cells }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Number of words (the matrix is n x n).
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.cells[i][j]
    }

    /// True when every cell of row `i` is undefined.
    pub fn row_is_undefined(&self, i: usize) -> bool {
        self.cells[i].iter().all(|cell| cell.is_none())
    }
}

/// Outcome of the cluster-count selection scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringResult {
    /// A useful partition was found within the cluster-count ceiling.
    Converged {
        /// Word to (unlabeled, arbitrary-valued) cluster id.
        assignments: BTreeMap<String, usize>,
        /// Silhouette score of the winning partition.
        score: f64,
        /// Number of clusters in the winning partition.
        n_clusters: usize,
    },
    /// The similarity structure is too fragmented for a meaningful small set
    /// of topics; callers fall back to labeling everything as "other".
    NotConverged,
}

/// A word together with its cluster label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledWord {
    pub word: String,
    pub label: String,
}

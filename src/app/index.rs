use serde::Serialize;
use std::collections::BTreeMap;

/// A single prediction tied to the subject whose sentence produced it.
#[derive(Debug, Clone)]
pub struct RawPrediction {
    pub subject_id: String,
    pub word: String,
    pub probability: f32,
}

/// Index over every prediction of one run: synthetic word ids, id/name
/// mappings, the deduplicated word list in first-appearance order, and
/// per-word probabilities keyed by subject.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionIndex {
    /// Word to synthetic id (`p1`, `p2`, ...)
    pub id_for_name: BTreeMap<String, String>,
    /// Synthetic id to word
    pub name_for_id: BTreeMap<String, String>,
    /// Unique predicted words, ordered by first appearance
    pub words: Vec<String>,
    /// Word to per-subject probability
    pub values: BTreeMap<String, BTreeMap<String, f32>>,
}

/// Assigns synthetic ids to predicted words and builds the unique-word index.
///
/// Pure over the full prediction list: the same input always yields the same
/// ids and word order. Ids are assigned in order of first appearance; a word
/// predicted for several subjects keeps one id, and its per-subject
/// probability map records the latest value seen for each subject.
pub fn index_predictions(predictions: &[RawPrediction]) -> PredictionIndex {
    let mut id_for_name = BTreeMap::new();
    let mut name_for_id = BTreeMap::new();
    let mut words = Vec::new();
    let mut values: BTreeMap<String, BTreeMap<String, f32>> = BTreeMap::new();

    for prediction in predictions {
        if !id_for_name.contains_key(&prediction.word) {
            let id = format!("p{}", words.len() + 1);
            id_for_name.insert(prediction.word.clone(), id.clone());
            name_for_id.insert(id, prediction.word.clone());
            words.push(prediction.word.clone());
        }
        values
            .entry(prediction.word.clone())
            .or_default()
            .insert(prediction.subject_id.clone(), prediction.probability);
    }

    PredictionIndex {
        id_for_name,
        name_for_id,
        words,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(subject_id: &str, word: &str, probability: f32) -> RawPrediction {
        RawPrediction {
            subject_id: subject_id.to_string(),
            word: word.to_string(),
            probability,
        }
    }

    #[test]
    fn test_ids_follow_first_appearance() {
        let index = index_predictions(&[
            raw("s1", "bark", 0.4),
            raw("s1", "run", 0.3),
            raw("s2", "bark", 0.2),
        ]);
        assert_eq!(index.words, vec!["bark", "run"]);
        assert_eq!(index.id_for_name["bark"], "p1");
        assert_eq!(index.id_for_name["run"], "p2");
        assert_eq!(index.name_for_id["p1"], "bark");
    }

    #[test]
    fn test_repeated_word_keeps_single_id() {
        let index = index_predictions(&[raw("s1", "bark", 0.4), raw("s2", "bark", 0.2)]);
        assert_eq!(index.words.len(), 1);
        assert_eq!(index.values["bark"]["s1"], 0.4);
        assert_eq!(index.values["bark"]["s2"], 0.2);
    }

    #[test]
    fn test_indexing_is_deterministic() {
        let input = [
            raw("s1", "bark", 0.4),
            raw("s2", "swim", 0.1),
            raw("s2", "bark", 0.2),
        ];
        let first = index_predictions(&input);
        let second = index_predictions(&input);
        assert_eq!(first.words, second.words);
        assert_eq!(first.id_for_name, second.id_for_name);
    }

    #[test]
    fn test_empty_predictions() {
        let index = index_predictions(&[]);
        assert!(index.words.is_empty());
        assert!(index.id_for_name.is_empty());
    }
}

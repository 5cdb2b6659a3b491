use anyhow::Result;
use candle_core::{IndexOp, Tensor, D};
use candle_nn::ops::softmax;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::predictor::{checkpoint, TARGET_PREDICTOR};

/// Placeholder in a sentence template that is replaced by the subject
pub const SUBJECT_PLACEHOLDER: &str = "[subject]";

/// A predicted word and its probability at the masked position
#[derive(Debug, Clone, Serialize)]
pub struct WordPrediction {
    pub word: String,
    pub probability: f32,
}

/// Renders a sentence template for a subject. The `[subject]` placeholder is
/// substituted when present; templates without it are used verbatim.
pub fn render_sentence(template: &str, subject: &str) -> String {
    if template.contains(SUBJECT_PLACEHOLDER) {
        template.replace(SUBJECT_PLACEHOLDER, subject)
    } else {
        template.to_string()
    }
}

/// Predicts the top-k candidate words for the fill marker in a sentence.
///
/// The fill marker is replaced with the checkpoint's mask token, the masked
/// sentence is run through the masked LM, and the mask position's logits are
/// converted to probabilities. Candidates that don't survive token cleanup
/// (subword pieces, punctuation, special tokens) are skipped.
///
/// # Arguments
/// * `model` - Name of a registered checkpoint
/// * `sentence` - Sentence containing the fill marker
/// * `fill` - Fill marker string, e.g. `_`
/// * `top_k` - Maximum number of candidates to return; zero means every
///   candidate that survives cleanup
///
/// # Returns
/// * `Ok(Vec<WordPrediction>)` - Predictions, most probable first
/// * `Err` - If the checkpoint is unknown, the sentence has no fill marker,
///   or inference fails
pub async fn predict_masked(
    model: &str,
    sentence: &str,
    fill: &str,
    top_k: usize,
) -> Result<Vec<WordPrediction>> {
    let start_time = Instant::now();
    let checkpoint = checkpoint(model)?;

    if !sentence.contains(fill) {
        return Err(anyhow::anyhow!(
            "Sentence {:?} has no fill marker {:?}",
            sentence,
            fill
        ));
    }
    let text = sentence.replace(fill, &checkpoint.mask_token);

    let tokenize_start = Instant::now();
    let encoding = checkpoint
        .tokenizer
        .encode(text.as_str(), true)
        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

    let mask_id = checkpoint
        .tokenizer
        .token_to_id(&checkpoint.mask_token)
        .ok_or_else(|| anyhow::anyhow!("Tokenizer has no {} token", checkpoint.mask_token))?;
    let mask_index = encoding
        .get_ids()
        .iter()
        .position(|&id| id == mask_id)
        .ok_or_else(|| anyhow::anyhow!("Mask token lost during tokenization of {:?}", text))?;

    // Truncate to max_length - 1 to avoid index boundary issues
    let max_len = checkpoint.max_length - 1;
    if mask_index >= max_len {
        return Err(anyhow::anyhow!(
            "Mask position {} beyond model context of {}",
            mask_index,
            max_len
        ));
    }
    let input_ids: Vec<i64> = encoding
        .get_ids()
        .iter()
        .take(max_len)
        .map(|&x| x as i64)
        .collect();
    let attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .take(max_len)
        .map(|&x| x as i64)
        .collect();

    let inference_start = Instant::now();

    let input_ids = Tensor::new(input_ids, &checkpoint.device)?.unsqueeze(0)?;
    let attention_mask = Tensor::new(attention_mask, &checkpoint.device)?.unsqueeze(0)?;
    let token_type_ids = input_ids.zeros_like()?;

    let logits = checkpoint
        .model
        .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

    // Extract the mask position's logits and convert to probabilities
    let mask_logits = logits.squeeze(0)?.i((mask_index, ..))?;
    let probs = softmax(&mask_logits, D::Minus1)?.to_vec1::<f32>()?;

    let mut candidates: Vec<usize> = (0..probs.len()).collect();
    candidates.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));

    let limit = candidate_limit(top_k, probs.len());
    let mut predictions = Vec::new();
    for token_id in candidates {
        if predictions.len() == limit {
            break;
        }
        let decoded = checkpoint
            .tokenizer
            .decode(&[token_id as u32], true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;
        if let Some(word) = clean_candidate(&decoded) {
            predictions.push(WordPrediction {
                word,
                probability: probs[token_id],
            });
        }
    }

    let end_time = Instant::now();
    info!(
        target: TARGET_PREDICTOR,
        "Predicted {} candidates with {} for {:?}: Tokenization time: {:?}; Inference time: {:?}; Total time: {:?}",
        predictions.len(),
        model,
        text,
        inference_start.duration_since(tokenize_start),
        end_time.duration_since(inference_start),
        end_time.duration_since(start_time)
    );
    debug!(
        target: TARGET_PREDICTOR,
        "Top candidates: {:?}",
        predictions
            .iter()
            .take(5)
            .map(|p| p.word.as_str())
            .collect::<Vec<_>>()
    );

    Ok(predictions)
}

/// A `top_k` of zero means no limit: return the full candidate set.
fn candidate_limit(top_k: usize, vocabulary: usize) -> usize {
    if top_k == 0 {
        vocabulary
    } else {
        top_k
    }
}

/// Normalizes a decoded candidate token into a comparable word.
///
/// Returns `None` for subword pieces, special tokens, and anything that is
/// not purely alphabetic after NFKC normalization.
fn clean_candidate(token: &str) -> Option<String> {
    let word: String = token.trim().nfkc().collect::<String>().to_lowercase();
    if word.is_empty() || word.starts_with("##") || word.starts_with('[') {
        return None;
    }
    if !word.chars().all(|c| c.is_alphabetic()) {
        return None;
    }
    Some(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sentence_substitutes_subject() {
        assert_eq!(
            render_sentence("A [subject] can _.", "dog"),
            "A dog can _."
        );
    }

    #[test]
    fn test_render_sentence_without_placeholder() {
        assert_eq!(render_sentence("The _ runs.", "dog"), "The _ runs.");
    }

    #[test]
    fn test_candidate_limit_zero_means_full_set() {
        assert_eq!(candidate_limit(0, 30522), 30522);
    }

    #[test]
    fn test_candidate_limit_caps_at_top_k() {
        assert_eq!(candidate_limit(10, 30522), 10);
    }

    #[tokio::test]
    async fn test_predict_masked_rejects_unknown_checkpoint() {
        assert!(predict_masked("no-such-model", "The _ runs.", "_", 5)
            .await
            .is_err());
    }

    #[test]
    fn test_clean_candidate_lowercases_and_trims() {
        assert_eq!(clean_candidate(" Dog "), Some("dog".to_string()));
    }

    #[test]
    fn test_clean_candidate_rejects_artifacts() {
        assert_eq!(clean_candidate("##ing"), None);
        assert_eq!(clean_candidate("[unused12]"), None);
        assert_eq!(clean_candidate("42"), None);
        assert_eq!(clean_candidate("half-baked"), None);
        assert_eq!(clean_candidate(""), None);
    }
}

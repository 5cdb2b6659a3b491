// Masked-language-model checkpoint registry
pub const TARGET_PREDICTOR: &str = "masked_lm";

/// Checkpoint used when a request doesn't name one
pub const DEFAULT_CHECKPOINT: &str = "bert";

use anyhow::Result;
use candle_core::Device;
use candle_transformers::models::bert::BertForMaskedLM;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokenizers::Tokenizer;

// Process-wide checkpoint registry, loaded once at startup
pub static CHECKPOINTS: OnceLock<HashMap<String, Arc<Checkpoint>>> = OnceLock::new();

pub mod config;
pub mod fill_mask;

// Re-export main components
pub use config::{init_checkpoints, CheckpointConfig, MaskedLmConfig};
pub use fill_mask::{predict_masked, render_sentence, WordPrediction};

/// A loaded masked LM together with its tokenizer and decoding parameters.
pub struct Checkpoint {
    pub model: BertForMaskedLM,
    pub tokenizer: Tokenizer,
    pub mask_token: String,
    pub max_length: usize,
    pub device: Device,
}

/// Returns a checkpoint by name, if the registry is initialized
pub fn checkpoint(name: &str) -> Result<Arc<Checkpoint>> {
    let registry = CHECKPOINTS
        .get()
        .ok_or_else(|| anyhow::anyhow!("Checkpoint registry not initialized"))?;
    registry
        .get(name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Unknown checkpoint {:?}", name))
}

/// Returns the registered checkpoint names, sorted, if the registry is
/// initialized
pub fn checkpoint_names() -> Result<Vec<String>> {
    let registry = CHECKPOINTS
        .get()
        .ok_or_else(|| anyhow::anyhow!("Checkpoint registry not initialized"))?;
    let mut names: Vec<String> = registry.keys().cloned().collect();
    names.sort();
    Ok(names)
}

use anyhow::Result;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{
    BertForMaskedLM, Config as BertConfig, HiddenAct, PositionEmbeddingType,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tokio::fs;
use tracing::{error, info};

use crate::predictor::{Checkpoint, CHECKPOINTS, TARGET_PREDICTOR};

/// One downloadable BERT-family checkpoint
pub struct CheckpointConfig {
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub model_path: String,
    pub tokenizer_path: String,
    pub mask_token: String,
    pub vocab_size: usize,
}

impl CheckpointConfig {
    fn new(name: &str, repo: &str, vocab_size: usize) -> Self {
        Self {
            name: name.to_string(),
            model_url: format!(
                "https://huggingface.co/{}/resolve/main/model.safetensors",
                repo
            ),
            tokenizer_url: format!("https://huggingface.co/{}/resolve/main/tokenizer.json", repo),
            model_path: format!("models/{}.safetensors", name),
            tokenizer_path: format!("models/{}-tokenizer.json", name),
            mask_token: "[MASK]".to_string(),
            vocab_size,
        }
    }
}

/// Configuration struct for the masked-LM checkpoint registry
pub struct MaskedLmConfig {
    pub checkpoints: Vec<CheckpointConfig>,
    pub max_length: usize,
    pub device: Device,
}

impl Default for MaskedLmConfig {
    fn default() -> Self {
        // BERT-architecture checkpoints only; they share one loader
        Self {
            checkpoints: vec![
                CheckpointConfig::new("bert", "google-bert/bert-base-uncased", 30522),
                CheckpointConfig::new(
                    "pubmedbert",
                    "microsoft/BiomedNLP-BiomedBERT-base-uncased-abstract-fulltext",
                    30522,
                ),
                CheckpointConfig::new("scibert", "allenai/scibert_scivocab_uncased", 31090),
            ],
            max_length: 512,
            device: Device::Cpu,
        }
    }
}

impl MaskedLmConfig {
    pub async fn ensure_models_exist(&self) -> Result<()> {
        // Create models directory if it doesn't exist
        if !Path::new("models").exists() {
            fs::create_dir("models").await?;
        }

        for checkpoint in &self.checkpoints {
            // Check and download model file if needed
            if !Path::new(&checkpoint.model_path).exists() {
                info!(
                    target: TARGET_PREDICTOR,
                    "Downloading {} masked LM from {}", checkpoint.name, checkpoint.model_url
                );
                let response = reqwest::get(&checkpoint.model_url).await?;
                let bytes = response.bytes().await?;
                fs::write(&checkpoint.model_path, bytes).await?;
                info!(
                    target: TARGET_PREDICTOR,
                    "Downloaded {} masked LM to {}", checkpoint.name, checkpoint.model_path
                );
            }

            // Check and download tokenizer file if needed
            if !Path::new(&checkpoint.tokenizer_path).exists() {
                info!(
                    target: TARGET_PREDICTOR,
                    "Downloading {} tokenizer from {}", checkpoint.name, checkpoint.tokenizer_url
                );
                let response = reqwest::get(&checkpoint.tokenizer_url).await?;
                let bytes = response.bytes().await?;
                fs::write(&checkpoint.tokenizer_path, bytes).await?;
                info!(
                    target: TARGET_PREDICTOR,
                    "Downloaded {} tokenizer to {}", checkpoint.name, checkpoint.tokenizer_path
                );
            }
        }

        Ok(())
    }
}

/// Initialize the checkpoint registry from config
pub fn init_checkpoints(config: &MaskedLmConfig) -> Result<()> {
    let mut registry = HashMap::new();
    for checkpoint_config in &config.checkpoints {
        let checkpoint = load_checkpoint(checkpoint_config, config)?;
        registry.insert(checkpoint_config.name.clone(), Arc::new(checkpoint));
    }

    // Set the registry in the static
    if CHECKPOINTS.set(registry).is_err() {
        error!(target: TARGET_PREDICTOR, "!!! Failed to set checkpoint registry in static");
        return Err(anyhow::anyhow!("Failed to set checkpoint registry in static"));
    }

    info!(
        target: TARGET_PREDICTOR,
        "Successfully loaded {} checkpoints", config.checkpoints.len()
    );
    Ok(())
}

/// Load one masked LM and its tokenizer from disk
fn load_checkpoint(
    checkpoint_config: &CheckpointConfig,
    config: &MaskedLmConfig,
) -> Result<Checkpoint> {
    info!(
        target: TARGET_PREDICTOR,
        "Starting to load {} masked LM from {}",
        checkpoint_config.name,
        checkpoint_config.model_path
    );
    let bert_config = BertConfig {
        hidden_size: 768,
        intermediate_size: 3072,
        max_position_embeddings: config.max_length,
        num_attention_heads: 12,
        num_hidden_layers: 12,
        vocab_size: checkpoint_config.vocab_size,
        layer_norm_eps: 1e-12,
        pad_token_id: 0,
        hidden_act: HiddenAct::Gelu,
        hidden_dropout_prob: 0.0,
        type_vocab_size: 2,
        initializer_range: 0.02,
        position_embedding_type: PositionEmbeddingType::Absolute,
        use_cache: false,
        classifier_dropout: None,
        model_type: None,
    };

    // Load the safetensors file
    let tensors = match candle_core::safetensors::load_buffer(
        &std::fs::read(&checkpoint_config.model_path)?,
        &config.device,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(
                target: TARGET_PREDICTOR,
                "!!! Failed to load {} model tensors: {}", checkpoint_config.name, e
            );
            return Err(anyhow::anyhow!("Failed to load model tensors"));
        }
    };

    // Create VarBuilder from the loaded tensors
    let vb = VarBuilder::from_tensors(tensors, DType::F32, &config.device);

    // Load the model
    let model = match BertForMaskedLM::load(vb, &bert_config) {
        Ok(m) => m,
        Err(e) => {
            error!(
                target: TARGET_PREDICTOR,
                "!!! Failed to load {} BERT masked LM: {}", checkpoint_config.name, e
            );
            return Err(anyhow::anyhow!("Failed to load BERT masked LM"));
        }
    };

    let tokenizer = match Tokenizer::from_file(&checkpoint_config.tokenizer_path) {
        Ok(t) => t,
        Err(e) => {
            error!(
                target: TARGET_PREDICTOR,
                "!!! Failed to load {} tokenizer: {}", checkpoint_config.name, e
            );
            return Err(anyhow::anyhow!("Failed to load tokenizer"));
        }
    };

    info!(
        target: TARGET_PREDICTOR,
        "Successfully loaded checkpoint {}", checkpoint_config.name
    );
    Ok(Checkpoint {
        model,
        tokenizer,
        mask_token: checkpoint_config.mask_token.clone(),
        max_length: config.max_length,
        device: config.device.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::DEFAULT_CHECKPOINT;
    use std::collections::HashSet;

    #[test]
    fn test_default_config_registers_bert_family() {
        let config = MaskedLmConfig::default();
        let names: Vec<&str> = config
            .checkpoints
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert!(names.contains(&DEFAULT_CHECKPOINT));
        assert!(names.contains(&"pubmedbert"));
        assert!(names.contains(&"scibert"));
    }

    #[test]
    fn test_checkpoint_paths_are_distinct() {
        let config = MaskedLmConfig::default();
        let paths: HashSet<&str> = config
            .checkpoints
            .iter()
            .flat_map(|c| [c.model_path.as_str(), c.tokenizer_path.as_str()])
            .collect();
        assert_eq!(paths.len(), config.checkpoints.len() * 2);
    }
}

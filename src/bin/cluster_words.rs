use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::env;
use tokio::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use wordlens::pipeline::cluster_predictions;
use wordlens::taxonomy::load_taxonomy;

/// Utility to cluster a word list into labeled topic groups offline.
///
/// This tool:
/// 1. Loads a taxonomy dump
/// 2. Runs the clustering-and-labeling pipeline over the given words
/// 3. Logs the labeled groups
///
/// Usage:
///    cargo run --bin cluster_words -- TAXONOMY_PATH WORD [WORD...]
///
/// Example:
///    cargo run --bin cluster_words -- data/taxonomy.tsv dog cat car truck

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set default subscriber");

    // Get command line arguments
    let args: Vec<String> = env::args().collect();
    let taxonomy_path = args
        .get(1)
        .ok_or_else(|| anyhow!("Usage: cluster_words TAXONOMY_PATH WORD [WORD...]"))?;
    let words: Vec<String> = args[2..].to_vec();
    if words.is_empty() {
        return Err(anyhow!("No words given"));
    }

    let start_time = Instant::now();
    info!("Clustering {} words...", words.len());

    let taxonomy = load_taxonomy(taxonomy_path)?;
    let labels = cluster_predictions(&words, &taxonomy)?;

    // Group words by label for display
    let mut groups: BTreeMap<&String, Vec<&String>> = BTreeMap::new();
    for (word, label) in &labels {
        groups.entry(label).or_default().push(word);
    }

    info!("Found {} labeled groups:", groups.len());
    for (label, members) in &groups {
        info!(
            "  {}: {}",
            label,
            members
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    info!("Done in {:?}", start_time.elapsed());
    Ok(())
}

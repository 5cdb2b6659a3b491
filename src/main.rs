use anyhow::Result;
use tracing::info;

use wordlens::app::api_loop;
use wordlens::environment::{get_env_or, get_env_parsed};
use wordlens::logging::configure_logging;
use wordlens::predictor::{init_checkpoints, MaskedLmConfig};
use wordlens::taxonomy::{init_taxonomy, load_taxonomy};

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let port: u16 = get_env_parsed("PORT", 3000);
    let taxonomy_path = get_env_or("TAXONOMY_PATH", "data/taxonomy.tsv");

    info!("Loading taxonomy from {}", taxonomy_path);
    let taxonomy = load_taxonomy(&taxonomy_path)?;
    init_taxonomy(taxonomy)?;

    info!("Loading masked LM checkpoints");
    let config = MaskedLmConfig::default();
    config.ensure_models_exist().await?;
    init_checkpoints(&config)?;

    api_loop(port).await
}

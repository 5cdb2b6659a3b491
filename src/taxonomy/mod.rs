// In-memory lexical taxonomy used for taxonomic word similarity
pub const TARGET_TAXONOMY: &str = "taxonomy";

use anyhow::Result;
use std::sync::{Arc, OnceLock};

// Process-wide taxonomy handle, loaded once at startup
pub static TAXONOMY: OnceLock<Arc<Taxonomy>> = OnceLock::new();

pub mod graph;
pub mod loader;
#[cfg(test)]
mod tests;

pub use graph::{SenseId, Taxonomy, TaxonomyBuilder};
pub use loader::load_taxonomy;

/// Installs the process-wide taxonomy. Call once at startup.
pub fn init_taxonomy(taxonomy: Taxonomy) -> Result<()> {
    if TAXONOMY.set(Arc::new(taxonomy)).is_err() {
        return Err(anyhow::anyhow!("Taxonomy already initialized"));
    }
    Ok(())
}

/// Returns a reference to the taxonomy, if initialized
pub fn taxonomy() -> Result<Arc<Taxonomy>> {
    TAXONOMY
        .get()
        .ok_or_else(|| anyhow::anyhow!("Taxonomy not initialized"))
        .map(Arc::clone)
}

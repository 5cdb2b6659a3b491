use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::info;

use crate::taxonomy::{Taxonomy, TaxonomyBuilder, TARGET_TAXONOMY};

/// Loads a taxonomy from a plain-text dump.
///
/// Format, one record per line, tab-separated fields:
/// - `S<TAB>name<TAB>parent1,parent2,...` declares a sense; the parent list
///   is empty for roots.
/// - `L<TAB>word<TAB>sense1,sense2,...` declares a word's senses in
///   canonical order (first sense = canonical sense).
///
/// Blank lines and lines starting with `#` are ignored.
pub fn load_taxonomy(path: impl AsRef<Path>) -> Result<Taxonomy> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read taxonomy dump {}", path.display()))?;
    let taxonomy = parse_taxonomy(&contents)?;

    info!(
        target: TARGET_TAXONOMY,
        "Loaded taxonomy from {}: {} senses",
        path.display(),
        taxonomy.len()
    );

    Ok(taxonomy)
}

/// Parses taxonomy dump contents. See [`load_taxonomy`] for the format.
pub fn parse_taxonomy(contents: &str) -> Result<Taxonomy> {
    let mut builder = TaxonomyBuilder::new();

    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        let kind = fields.next().unwrap_or("");
        let name = fields
            .next()
            .ok_or_else(|| anyhow!("Line {}: missing name field", lineno + 1))?
            .trim();
        let refs: Vec<&str> = fields
            .next()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect();

        match kind {
            "S" => builder
                .add_sense(name, &refs)
                .with_context(|| format!("Line {}", lineno + 1))?,
            "L" => builder
                .add_lemma(name, &refs)
                .with_context(|| format!("Line {}", lineno + 1))?,
            other => {
                return Err(anyhow!(
                    "Line {}: unknown record kind {:?}",
                    lineno + 1,
                    other
                ));
            }
        }
    }

    builder.build()
}

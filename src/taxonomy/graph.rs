use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};

/// Opaque handle to one sense (one meaning of a word) within the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenseId(u32);

struct SenseNode {
    name: String,
    parents: Vec<SenseId>,
    // Distance from a taxonomy root, root = 1, larger = more specific
    depth: u32,
}

/// A hierarchical lexical graph: senses connected by hypernym edges, plus a
/// lemma index mapping surface words to their senses in canonical order.
pub struct Taxonomy {
    nodes: Vec<SenseNode>,
    lemma_index: HashMap<String, Vec<SenseId>>,
}

impl Taxonomy {
    /// Returns the senses of a word in canonical order, possibly empty.
    /// The first sense is the word's canonical sense.
    pub fn senses_of(&self, word: &str) -> &[SenseId] {
        self.lemma_index
            .get(word)
            .map(|senses| senses.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the full sense name, e.g. `carnivore.n.01`.
    pub fn sense_name(&self, sense: SenseId) -> &str {
        &self.nodes[sense.0 as usize].name
    }

    /// Returns the human-readable term of a sense: the name up to the first
    /// part-of-speech separator, e.g. `carnivore` for `carnivore.n.01`.
    pub fn term(&self, sense: SenseId) -> &str {
        let name = self.sense_name(sense);
        name.split('.').next().unwrap_or(name)
    }

    /// Depth of a sense within the taxonomy; roots have depth 1.
    pub fn depth(&self, sense: SenseId) -> u32 {
        self.nodes[sense.0 as usize].depth
    }

    /// Returns the set of ancestors of a sense, including the sense itself
    /// (the full hypernym closure, not just direct parents).
    pub fn hypernym_closure(&self, sense: SenseId) -> HashSet<SenseId> {
        let mut closure = HashSet::new();
        let mut stack = vec![sense];
        while let Some(current) = stack.pop() {
            if closure.insert(current) {
                stack.extend(&self.nodes[current.0 as usize].parents);
            }
        }
        closure
    }

    /// Wu-Palmer taxonomic similarity between two senses, in [0, 1].
    ///
    /// Based on the depths of the two senses and that of their most specific
    /// common ancestor: `2 * depth(lcs) / (depth(a) + depth(b))`. Identical
    /// senses score 1.0; senses with no common ancestor score 0.0.
    pub fn wup_similarity(&self, a: SenseId, b: SenseId) -> f64 {
        if a == b {
            return 1.0;
        }
        let closure_a = self.hypernym_closure(a);
        let closure_b = self.hypernym_closure(b);
        let lcs_depth = closure_a
            .intersection(&closure_b)
            .map(|&sense| self.depth(sense))
            .max();
        match lcs_depth {
            Some(depth) => 2.0 * depth as f64 / (self.depth(a) + self.depth(b)) as f64,
            None => 0.0,
        }
    }

    /// Number of senses in the taxonomy.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Incremental construction of a [`Taxonomy`]. Senses may reference parents
/// declared later; name resolution and depth computation happen in
/// [`TaxonomyBuilder::build`].
#[derive(Default)]
pub struct TaxonomyBuilder {
    senses: Vec<(String, Vec<String>)>,
    by_name: HashMap<String, usize>,
    lemmas: Vec<(String, Vec<String>)>,
}

impl TaxonomyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a sense with its direct hypernym parents (empty for roots).
    pub fn add_sense(&mut self, name: &str, parents: &[&str]) -> Result<()> {
        if self.by_name.contains_key(name) {
            return Err(anyhow!("Duplicate sense name: {}", name));
        }
        self.by_name.insert(name.to_string(), self.senses.len());
        self.senses.push((
            name.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
        ));
        Ok(())
    }

    /// Declares a word's senses in canonical order. A word may be declared
    /// only once; redeclaration is rejected in [`TaxonomyBuilder::build`].
    pub fn add_lemma(&mut self, word: &str, senses: &[&str]) -> Result<()> {
        if senses.is_empty() {
            return Err(anyhow!("Lemma {} declared with no senses", word));
        }
        self.lemmas.push((
            word.to_string(),
            senses.iter().map(|s| s.to_string()).collect(),
        ));
        Ok(())
    }

    /// Resolves all references and computes sense depths.
    ///
    /// Fails on unknown parent or lemma-sense references and on hypernym
    /// cycles.
    pub fn build(self) -> Result<Taxonomy> {
        let mut parents: Vec<Vec<usize>> = Vec::with_capacity(self.senses.len());
        for (name, parent_names) in &self.senses {
            let mut resolved = Vec::with_capacity(parent_names.len());
            for parent in parent_names {
                let idx = self
                    .by_name
                    .get(parent)
                    .ok_or_else(|| anyhow!("Unknown parent sense {} of {}", parent, name))?;
                resolved.push(*idx);
            }
            parents.push(resolved);
        }

        let depths = resolve_depths(&parents, &self.senses)?;

        let nodes = self
            .senses
            .iter()
            .enumerate()
            .map(|(i, (name, _))| SenseNode {
                name: name.clone(),
                parents: parents[i].iter().map(|&p| SenseId(p as u32)).collect(),
                depth: depths[i],
            })
            .collect();

        let mut lemma_index: HashMap<String, Vec<SenseId>> = HashMap::new();
        for (word, sense_names) in &self.lemmas {
            if lemma_index.contains_key(word) {
                return Err(anyhow!("Duplicate lemma declaration: {}", word));
            }
            let mut resolved = Vec::with_capacity(sense_names.len());
            for sense in sense_names {
                let idx = self
                    .by_name
                    .get(sense)
                    .ok_or_else(|| anyhow!("Unknown sense {} for lemma {}", sense, word))?;
                resolved.push(SenseId(*idx as u32));
            }
            lemma_index.insert(word.clone(), resolved);
        }

        Ok(Taxonomy { nodes, lemma_index })
    }
}

const UNVISITED: u8 = 0;
const VISITING: u8 = 1;
const DONE: u8 = 2;

/// Computes each sense's depth: 1 for roots, otherwise one more than the
/// deepest parent. Iterative DFS so deep taxonomies can't blow the stack.
fn resolve_depths(parents: &[Vec<usize>], senses: &[(String, Vec<String>)]) -> Result<Vec<u32>> {
    let n = parents.len();
    let mut depth = vec![0u32; n];
    let mut state = vec![UNVISITED; n];

    for start in 0..n {
        if state[start] == DONE {
            continue;
        }
        let mut stack = vec![start];
        while let Some(&node) = stack.last() {
            if state[node] == DONE {
                stack.pop();
                continue;
            }
            if state[node] == UNVISITED {
                state[node] = VISITING;
                let mut ready = true;
                for &parent in &parents[node] {
                    match state[parent] {
                        DONE => {}
                        VISITING => {
                            return Err(anyhow!(
                                "Hypernym cycle in taxonomy at {}",
                                senses[parent].0
                            ));
                        }
                        _ => {
                            ready = false;
                            stack.push(parent);
                        }
                    }
                }
                if !ready {
                    continue;
                }
            }
            depth[node] = parents[node]
                .iter()
                .map(|&parent| depth[parent])
                .max()
                .map_or(1, |deepest| deepest + 1);
            state[node] = DONE;
            stack.pop();
        }
    }

    Ok(depth)
}

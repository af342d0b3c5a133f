//! Multi-index search: one HNSW graph per level, one shared inverted index,
//! a node metadata table, and ranked fusion across both.

mod hnsw;
pub mod inverted;
pub mod ranking;
#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::constants::{
    DEFAULT_EF_CONSTRUCTION, DEFAULT_EF_SEARCH, DEFAULT_HNSW_M, MAX_RESULTS_CAP,
    RECENCY_HALF_LIFE_MS,
};
use crate::error::{Error, Result};
use crate::hierarchy::{Hierarchy, Level, NodeId};

pub use hnsw::{HnswConfig, HnswIndex};
pub use inverted::InvertedIndex;
pub use ranking::RankingWeights;

const LEVEL_COUNT: usize = 4;

fn levels_in_range(min_level: Level, max_level: Level) -> Vec<Level> {
    (min_level as u8..=max_level as u8)
        .filter_map(Level::from_u8)
        .collect()
}

#[derive(Clone, Copy)]
struct NodeMeta {
    level: Level,
    created_at_ns: u64,
}

/// Sparse, doubling-growth array of per-node metadata, indexed by `NodeId`.
#[derive(Default)]
struct MetaTable {
    entries: Vec<Option<NodeMeta>>,
}

impl MetaTable {
    fn set(&mut self, id: NodeId, meta: NodeMeta) {
        let idx = id.0 as usize;
        if idx >= self.entries.len() {
            let mut new_len = self.entries.len().max(1);
            while new_len <= idx {
                new_len *= 2;
            }
            self.entries.resize(new_len, None);
        }
        self.entries[idx] = Some(meta);
    }

    fn get(&self, id: NodeId) -> Option<NodeMeta> {
        self.entries.get(id.0 as usize).copied().flatten()
    }
}

/// Parameters controlling graph shape and per-level capacity.
#[derive(Debug, Clone, Copy)]
pub struct SearchEngineConfig {
    /// Reproducible PRNG seed for HNSW layer assignment.
    pub seed: u64,
    /// Max neighbors per node (layer 0 uses `2 * m`).
    pub m: usize,
    /// Beam width used while inserting.
    pub ef_construction: usize,
    /// Beam width used while searching.
    pub ef_search: usize,
    /// Hard cap on vectors per level.
    pub capacity_per_level: usize,
}

impl Default for SearchEngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            m: DEFAULT_HNSW_M,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
            ef_search: DEFAULT_EF_SEARCH,
            capacity_per_level: 1_000_000,
        }
    }
}

/// A search request. `[min_level, max_level]` is an enum-order interval —
/// "all levels" is `Level::Statement..=Level::Session`.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query embedding, for semantic search.
    pub embedding: Option<Vec<f32>>,
    /// Query tokens, for lexical search (OR semantics).
    pub tokens: Option<Vec<String>>,
    /// Maximum hits to return.
    pub k: usize,
    /// Lower bound (inclusive) of the level range, in enum order.
    pub min_level: Level,
    /// Upper bound (inclusive) of the level range, in enum order.
    pub max_level: Level,
}

/// One ranked hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// The matching node.
    pub id: NodeId,
    /// Fused ranking score; bounded to `[0, 1.1]` with default weights.
    pub score: f64,
}

/// One HNSW graph per level, a shared inverted index, a node metadata
/// table, and the ranker tying them together.
pub struct SearchEngine {
    hnsw: [RwLock<HnswIndex>; LEVEL_COUNT],
    inverted: RwLock<InvertedIndex>,
    metadata: RwLock<MetaTable>,
    rng: Mutex<ChaCha8Rng>,
    weights: RankingWeights,
}

impl SearchEngine {
    /// Build an empty engine with the given graph parameters and ranking
    /// weights.
    #[must_use]
    pub fn new(config: SearchEngineConfig, weights: RankingWeights) -> Self {
        let hnsw_config = HnswConfig {
            m: config.m,
            ef_construction: config.ef_construction,
            ef_search: config.ef_search,
            capacity: config.capacity_per_level,
        };
        Self {
            hnsw: std::array::from_fn(|_| RwLock::new(HnswIndex::new(hnsw_config))),
            inverted: RwLock::new(InvertedIndex::new()),
            metadata: RwLock::new(MetaTable::default()),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
            weights,
        }
    }

    /// Index one node: records its metadata, inserts its embedding into
    /// the level's HNSW graph (if present), and tokenizes its text into
    /// the shared inverted index (if present).
    ///
    /// # Errors
    /// Propagates [`Error::Exists`]/[`Error::Full`]/[`Error::InvalidArg`]
    /// from the HNSW insert. Embedder absence is not an error here — pass
    /// `embedding: None`.
    pub fn index(
        &self,
        id: NodeId,
        level: Level,
        embedding: Option<&[f32]>,
        text: Option<&str>,
        created_at_ns: u64,
    ) -> Result<()> {
        self.metadata.write().set(id, NodeMeta { level, created_at_ns });
        if let Some(vector) = embedding {
            let mut rng = self.rng.lock();
            self.hnsw[level as usize]
                .write()
                .insert(id, vector.to_vec(), &mut rng)?;
        }
        if let Some(text) = text {
            self.inverted.write().index(id, text);
        }
        Ok(())
    }

    /// Soft-delete `id` from whichever indices it appears in.
    pub fn tombstone(&self, id: NodeId) {
        if let Some(meta) = self.metadata.read().get(id) {
            let _ = self.hnsw[meta.level as usize].write().tombstone(id);
        }
        self.inverted.write().tombstone(id);
    }

    /// Run the ranking pipeline from spec §4.4.4 and return the top `k`
    /// hits sorted descending by score.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArg`] if `min_level > max_level`.
    pub fn search(&self, query: &SearchQuery, now_ns: u64) -> Result<Vec<SearchHit>> {
        if query.min_level > query.max_level {
            return Err(Error::InvalidArg(
                "min_level must be <= max_level".to_string(),
            ));
        }
        let k = query.k.clamp(1, MAX_RESULTS_CAP);

        let mut semantic_scores: HashMap<NodeId, f64> = HashMap::new();
        if let Some(embedding) = &query.embedding {
            for level in levels_in_range(query.min_level, query.max_level) {
                let hits = self.hnsw[level as usize].read().search(embedding, k.max(16))?;
                for (id, dist) in hits {
                    let score = 1.0 - f64::from(dist);
                    semantic_scores
                        .entry(id)
                        .and_modify(|s| *s = s.max(score))
                        .or_insert(score);
                }
            }
        }

        let mut exact_scores: HashMap<NodeId, f64> = HashMap::new();
        if let Some(tokens) = &query.tokens {
            let raw_hits = self.inverted.read().search_any(tokens, k * 4 + 16);
            let metadata = self.metadata.read();
            for (id, count) in raw_hits {
                if let Some(meta) = metadata.get(id) {
                    if meta.level >= query.min_level && meta.level <= query.max_level {
                        let score = f64::from(count);
                        exact_scores
                            .entry(id)
                            .and_modify(|s| *s = s.max(score))
                            .or_insert(score);
                    }
                }
            }
        }
        let max_exact = exact_scores.values().copied().fold(0.0_f64, f64::max);

        let mut candidates: HashSet<NodeId> = semantic_scores.keys().copied().collect();
        candidates.extend(exact_scores.keys().copied());

        let metadata = self.metadata.read();
        let mut hits = Vec::with_capacity(candidates.len());
        for id in candidates {
            let Some(meta) = metadata.get(id) else {
                continue;
            };
            if meta.level < query.min_level || meta.level > query.max_level {
                continue;
            }
            let semantic = semantic_scores.get(&id).copied().unwrap_or(0.0);
            let exact_raw = exact_scores.get(&id).copied().unwrap_or(0.0);
            let exact = if max_exact > 0.0 { exact_raw / max_exact } else { 0.0 };
            let recency = ranking::recency_score(meta.created_at_ns, now_ns, RECENCY_HALF_LIFE_MS);
            let level_boost = ranking::level_boost(meta.level);
            let score = ranking::combine(semantic, exact, recency, level_boost, &self.weights);
            hits.push(SearchHit { id, score });
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    /// Rebuild the engine's semantic indices from a [`Hierarchy`] after a
    /// restart. Lexical postings are not rebuilt — they repopulate lazily
    /// as content churns (accepted behavior, per spec).
    ///
    /// # Errors
    /// Propagates hierarchy lookup failures or HNSW insert failures for
    /// corrupt state.
    pub fn rebuild_from_hierarchy(&self, hierarchy: &Hierarchy) -> Result<()> {
        for raw_id in 0..hierarchy.count() {
            let id = NodeId(raw_id as u32);
            let Ok(info) = hierarchy.get_node(id) else {
                continue; // the agent root has no Level and is skipped
            };
            let embedding = hierarchy.get_embedding(id)?;
            self.metadata.write().set(
                id,
                NodeMeta {
                    level: info.level,
                    created_at_ns: info.created_at_ns,
                },
            );
            if let Some(vector) = embedding {
                let mut rng = self.rng.lock();
                match self.hnsw[info.level as usize].write().insert(id, vector, &mut rng) {
                    Ok(()) | Err(Error::Exists(_)) => {}
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(())
    }
}

//! Core-level configuration: the fields that shape how a [`crate::hierarchy::Hierarchy`]
//! and [`crate::search::SearchEngine`] are constructed.
//!
//! Transport-level fields (`port`, request timeouts) live in
//! `memory-rpc::config::ServerConfig`, which embeds this struct — grounded
//! on the teacher's layering of `types/config.rs` (domain config) beneath
//! `memory-cli/src/config.rs` (process-level config).

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EF_CONSTRUCTION, DEFAULT_EF_SEARCH, DEFAULT_HNSW_M, DEFAULT_MAX_RESULTS,
};
use crate::search::RankingWeights;

/// Configuration governing hierarchy storage and the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Root directory for persisted arenas and the event log.
    pub data_dir: String,
    /// Fixed embedding dimension produced by the configured embedder.
    pub embedding_dim: usize,
    /// Initial mmap size (bytes) for each arena.
    pub arena_size: usize,
    /// HNSW `M` (max neighbors per node above layer 0).
    pub hnsw_m: usize,
    /// HNSW `ef_construction` beam width.
    pub hnsw_ef_construct: usize,
    /// HNSW `ef_search` beam width.
    pub hnsw_ef_search: usize,
    /// Default `max_results` for queries that don't specify one.
    pub max_results: usize,
    /// Weight on the relevance term.
    pub w_relevance: f64,
    /// Weight on the recency term.
    pub w_recency: f64,
    /// Weight on the level-boost term.
    pub w_level: f64,
    /// Whether mutations append to the event log.
    pub emit_events: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            embedding_dim: 384,
            arena_size: 1 << 20,
            hnsw_m: DEFAULT_HNSW_M,
            hnsw_ef_construct: DEFAULT_EF_CONSTRUCTION,
            hnsw_ef_search: DEFAULT_EF_SEARCH,
            max_results: DEFAULT_MAX_RESULTS,
            w_relevance: RankingWeights::default().w_relevance,
            w_recency: RankingWeights::default().w_recency,
            w_level: RankingWeights::default().w_level,
            emit_events: true,
        }
    }
}

impl MemoryConfig {
    /// The ranking weights implied by this config's `w_*` fields, with the
    /// engine-level `w_semantic`/`w_exact` split left at their defaults
    /// (spec.md names only `w_relevance`/`w_recency`/`w_level` as
    /// configurable).
    #[must_use]
    pub fn ranking_weights(&self) -> RankingWeights {
        RankingWeights {
            w_relevance: self.w_relevance,
            w_recency: self.w_recency,
            w_level: self.w_level,
            ..RankingWeights::default()
        }
    }
}

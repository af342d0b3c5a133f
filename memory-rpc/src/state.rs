//! Shared service state: the long-lived handles every RPC handler closes
//! over, assembled once at startup in `bin/memory-server.rs`.

use std::path::Path;
use std::time::Instant;

use memory_core::embeddings::{Embedder, MockEmbedder};
use memory_core::events::EventEmitter;
use memory_core::hierarchy::Hierarchy;
use memory_core::search::{SearchEngine, SearchEngineConfig};

use crate::config::ServerConfig;
use crate::metrics::MetricsRegistry;

/// Everything a handler needs: the hierarchy tree, the search engine, an
/// embedder, the event sink, and bookkeeping for `/health` and `/metrics`.
pub struct MemoryService {
    pub hierarchy: Hierarchy,
    pub search: SearchEngine,
    pub embedder: Box<dyn Embedder>,
    pub events: EventEmitter,
    pub config: ServerConfig,
    pub metrics: MetricsRegistry,
    start_time: Instant,
}

impl MemoryService {
    /// Open (or create, if absent) the on-disk hierarchy at
    /// `config.memory.data_dir`, rebuild the search index from it, and wire
    /// up the embedder and event emitter.
    ///
    /// # Errors
    /// Returns an error if the arena files can't be opened/created, or the
    /// events directory can't be prepared.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let dim = config.memory.embedding_dim;
        let data_dir = Path::new(&config.memory.data_dir);
        let marker = data_dir.join("relations/nodes.bin");

        let hierarchy = if marker.exists() {
            Hierarchy::open(data_dir, dim)?
        } else {
            Hierarchy::create(data_dir, config.memory.arena_size, dim)?
        };

        let weights = config.memory.ranking_weights();
        if let Err(e) = weights.validate() {
            tracing::warn!(error = %e, "ranking weights do not sum to 1.0; continuing with configured values");
        }

        let search_config = SearchEngineConfig {
            m: config.memory.hnsw_m,
            ef_construction: config.memory.hnsw_ef_construct,
            ef_search: config.memory.hnsw_ef_search,
            ..SearchEngineConfig::default()
        };
        let search = SearchEngine::new(search_config, weights);
        search.rebuild_from_hierarchy(&hierarchy)?;

        let events = if config.memory.emit_events {
            EventEmitter::open(data_dir).await?
        } else {
            EventEmitter::disabled()
        };

        Ok(Self {
            hierarchy,
            search,
            embedder: Box::new(MockEmbedder::new(dim)),
            events,
            config,
            metrics: MetricsRegistry::new(),
            start_time: Instant::now(),
        })
    }

    #[must_use]
    pub fn uptime_ms(&self) -> u64 {
        u64::try_from(self.start_time.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn now_ns() -> u64 {
        u64::try_from(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
        )
        .unwrap_or(u64::MAX)
    }
}

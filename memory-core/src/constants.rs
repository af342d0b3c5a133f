//! System-wide constants.

/// Sentinel value for an absent [`crate::hierarchy::NodeId`].
pub const INVALID_NODE_ID: u32 = u32::MAX;

/// Maximum agent key length in bytes.
pub const MAX_AGENT_KEY_LEN: usize = 63;

/// Maximum session key length in bytes.
pub const MAX_SESSION_KEY_LEN: usize = 127;

/// Maximum blocks extracted from a single message; excess is dropped silently.
pub const MAX_BLOCKS_PER_MESSAGE: usize = 64;

/// Maximum sentences/lines extracted from a single block; excess is dropped silently.
pub const MAX_SENTENCES_PER_BLOCK: usize = 128;

/// Maximum fence language tag length in bytes.
pub const MAX_FENCE_LANG_LEN: usize = 31;

/// Hard cap on HNSW layer count.
pub const MAX_HNSW_LAYERS: usize = 16;

/// Half-life used by the recency scoring function, in milliseconds.
pub const RECENCY_HALF_LIFE_MS: f64 = 3_600_000.0;

/// Default HNSW `M` (max neighbors per node at layers above 0).
pub const DEFAULT_HNSW_M: usize = 16;

/// Default `ef_construction` beam width used during insertion.
pub const DEFAULT_EF_CONSTRUCTION: usize = 100;

/// Default `ef_search` beam width used during search.
pub const DEFAULT_EF_SEARCH: usize = 50;

/// Default maximum results returned by a query.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Hard cap on `max_results` regardless of caller request.
pub const MAX_RESULTS_CAP: usize = 100;

/// Content preview length (bytes) for query hits.
pub const QUERY_CONTENT_PREVIEW_BYTES: usize = 1000;

/// Content preview length (bytes) for `zoom_out` sibling previews.
pub const ZOOM_OUT_SIBLING_PREVIEW_BYTES: usize = 100;

/// Maximum siblings returned by `zoom_out`.
pub const ZOOM_OUT_MAX_SIBLINGS: usize = 20;

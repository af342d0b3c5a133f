//! Shared test fixtures for the hierarchical memory store, grounded on the
//! teacher's `test-utils/src/lib.rs` (fixture builders consumed by multiple
//! crates' test suites instead of each crate hand-rolling its own).

use memory_core::embeddings::{Embedder, MockEmbedder};
use memory_core::hierarchy::{Hierarchy, Level, NodeId};
use memory_core::search::{SearchEngine, SearchEngineConfig};

pub const TEST_EMBEDDING_DIM: usize = 16;

/// An in-memory hierarchy plus a matching search engine, wired the same way
/// `memory_rpc::state::MemoryService` wires them, with a deterministic
/// embedder fixed at [`TEST_EMBEDDING_DIM`].
pub struct TestStore {
    pub hierarchy: Hierarchy,
    pub search: SearchEngine,
    pub embedder: MockEmbedder,
}

impl TestStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hierarchy: Hierarchy::in_memory(TEST_EMBEDDING_DIM),
            search: SearchEngine::new(SearchEngineConfig::default(), Default::default()),
            embedder: MockEmbedder::new(TEST_EMBEDDING_DIM),
        }
    }

    /// Create an agent/session/message chain and index the message text.
    ///
    /// # Panics
    /// Panics on any hierarchy/search error — fixture setup is expected to
    /// always succeed in tests.
    pub async fn seed_message(&self, agent_id: &str, session_id: &str, text: &str) -> NodeId {
        let agent = self.hierarchy.create_agent(agent_id).unwrap();
        let session = self.hierarchy.create_session(agent.id, session_id).unwrap();
        let message_id = self.hierarchy.create_message(session.id).unwrap();
        self.index_text(message_id, Level::Message, text).await;
        message_id
    }

    /// Embed and index `text` at `level` for an already-created `id`.
    ///
    /// # Panics
    /// Panics on any hierarchy/search error.
    pub async fn index_text(&self, id: NodeId, level: Level, text: &str) {
        self.hierarchy.set_text(id, text.as_bytes()).unwrap();
        let embedding = self.embedder.embed(text).await.unwrap();
        self.hierarchy.set_embedding(id, &embedding).unwrap();
        self.search
            .index(id, level, Some(&embedding), Some(text), 0)
            .unwrap();
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A deterministic block of conversational text with nested code, used by
/// several test suites to exercise `decompose` and multi-level storage.
#[must_use]
pub fn sample_message() -> &'static str {
    "Let's talk about error handling. Rust favors `Result` over exceptions. \
     ```rust\nfn might_fail() -> Result<(), Error> {\n    Ok(())\n}\n``` \
     That keeps failure paths explicit and type-checked."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_message_creates_a_queryable_node() {
        let store = TestStore::new();
        let id = store.seed_message("agent-1", "sess-1", "hello world").await;
        assert!(id.is_valid());
        assert_eq!(store.hierarchy.get_text(id).unwrap().unwrap(), b"hello world");
    }
}

//! Hierarchical memory store core.
//!
//! Ingests conversational content into a four-level tree (session →
//! message → block → statement), indexes each node by dense embedding and
//! token bag, and serves semantic + lexical queries with fused ranking.
//!
//! ```
//! use memory_core::hierarchy::Hierarchy;
//!
//! let hierarchy = Hierarchy::in_memory(4);
//! let agent = hierarchy.create_agent("agent-a").unwrap().id;
//! let session = hierarchy.create_session(agent, "session-1").unwrap().id;
//! let message = hierarchy.create_message(session).unwrap();
//! hierarchy.set_text(message, b"hello").unwrap();
//! assert_eq!(hierarchy.get_text(message).unwrap().unwrap(), b"hello");
//! ```

pub mod arena;
pub mod config;
pub mod constants;
pub mod decomposer;
pub mod embeddings;
pub mod error;
pub mod events;
pub mod hierarchy;
pub mod search;

pub use error::{Error, Result};

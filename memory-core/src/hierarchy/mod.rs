//! The node table: a dense, arena-backed tree of agent → session → message →
//! block → statement nodes.
//!
//! Nodes are never structurally deleted. The child-sibling linked list plus
//! a dense `NodeId` space gives an arena+index data model — a `Vec<Node>`
//! indexed by id, not heap-allocated nodes with owning pointers — which is
//! the natural Rust translation of the child-sibling tree (see `DESIGN.md`).

mod node_table;

use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use crate::arena::{Arena, HeapArena, MmapArena};
use crate::constants::{INVALID_NODE_ID, MAX_AGENT_KEY_LEN, MAX_SESSION_KEY_LEN};
use crate::error::{Error, Result};
use node_table::{AGENT_LEVEL_TAG, RECORD_SIZE};

/// Dense, monotonically assigned node identifier. `NodeId::INVALID` (all
/// ones) marks absence; ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel marking "no node" (parent of the agent root, absent sibling, etc).
    pub const INVALID: NodeId = NodeId(INVALID_NODE_ID);

    /// Whether this id refers to a real node.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 != INVALID_NODE_ID
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tree level. Numeric order matters: `min_level ≤ max_level` range queries
/// compare these discriminants directly, in enum order rather than
/// tree-depth order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// A sentence (text) or line (code) extracted from a block.
    Statement = 0,
    /// A paragraph or fenced code region extracted from a message.
    Block = 1,
    /// One ingested message within a session.
    Message = 2,
    /// A conversation session, identified by an external `session_key`.
    Session = 3,
}

impl Level {
    /// Decode a raw tag byte, rejecting the auxiliary agent-root tag.
    #[must_use]
    pub fn from_u8(tag: u8) -> Option<Level> {
        match tag {
            0 => Some(Level::Statement),
            1 => Some(Level::Block),
            2 => Some(Level::Message),
            3 => Some(Level::Session),
            _ => None,
        }
    }
}

/// Owned snapshot of a node's metadata, returned by `get_node` so callers
/// never hold a reference into locked state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// This node's id.
    pub id: NodeId,
    /// This node's level.
    pub level: Level,
    /// Parent id, or `NodeId::INVALID` for the agent root.
    pub parent_id: NodeId,
    /// Populated for `Session` nodes; empty otherwise.
    pub agent_id: String,
    /// Populated for `Session` nodes; empty otherwise.
    pub session_key: String,
    /// Ingest wall-clock time.
    pub created_at_ns: u64,
}

/// Result of an idempotent `create_agent`/`create_session` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateResult {
    /// The node id — existing or newly created.
    pub id: NodeId,
    /// `false` when an existing node with the same key was found instead.
    pub created: bool,
}

/// Raw, arena-persisted node record. Kept private; `NodeInfo` is the public
/// copy-out type.
#[derive(Debug, Clone)]
struct Node {
    id: NodeId,
    level_tag: u8,
    parent_id: NodeId,
    first_child_id: NodeId,
    next_sibling_id: NodeId,
    text_offset: u32,
    text_len: u32,
    embedding_offset: u32,
    created_at_ns: u64,
    agent_id: String,
    session_key: String,
}

impl Node {
    fn to_info(&self) -> Result<NodeInfo> {
        let level = if self.level_tag == AGENT_LEVEL_TAG {
            // Only reachable if a caller fetches the internal agent root directly.
            return Err(Error::Internal(
                "agent root has no queryable Level".to_string(),
            ));
        } else {
            Level::from_u8(self.level_tag)
                .ok_or_else(|| Error::Internal(format!("corrupt level tag {}", self.level_tag)))?
        };
        Ok(NodeInfo {
            id: self.id,
            level,
            parent_id: self.parent_id,
            agent_id: self.agent_id.clone(),
            session_key: self.session_key.clone(),
            created_at_ns: self.created_at_ns,
        })
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// The hierarchy store: owns the relations/text/embeddings arenas and the
/// in-memory node table built from them.
pub struct Hierarchy {
    relations: Box<dyn Arena>,
    text: Box<dyn Arena>,
    embeddings: Box<dyn Arena>,
    embedding_dim: usize,
    nodes: RwLock<Vec<Node>>,
    agent_keys: RwLock<HashMap<String, NodeId>>,
    session_keys: RwLock<HashMap<String, NodeId>>,
    session_ids: RwLock<Vec<NodeId>>,
}

impl Hierarchy {
    /// An in-memory hierarchy backed by `HeapArena`s, for tests and
    /// ephemeral workloads.
    #[must_use]
    pub fn in_memory(embedding_dim: usize) -> Self {
        Self {
            relations: Box::new(HeapArena::default()),
            text: Box::new(HeapArena::default()),
            embeddings: Box::new(HeapArena::default()),
            embedding_dim,
            nodes: RwLock::new(Vec::new()),
            agent_keys: RwLock::new(HashMap::new()),
            session_keys: RwLock::new(HashMap::new()),
            session_ids: RwLock::new(Vec::new()),
        }
    }

    /// Initialize a fresh, file-backed hierarchy under `dir`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the arena files cannot be created.
    pub fn create(dir: impl AsRef<Path>, capacity: usize, embedding_dim: usize) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir.join("relations"))?;
        std::fs::create_dir_all(dir.join("text"))?;
        std::fs::create_dir_all(dir.join("embeddings"))?;
        Ok(Self {
            relations: Box::new(MmapArena::open(dir.join("relations/nodes.bin"), capacity)?),
            text: Box::new(MmapArena::open(dir.join("text/text.bin"), capacity)?),
            embeddings: Box::new(MmapArena::open(
                dir.join("embeddings/vectors.bin"),
                capacity,
            )?),
            embedding_dim,
            nodes: RwLock::new(Vec::new()),
            agent_keys: RwLock::new(HashMap::new()),
            session_keys: RwLock::new(HashMap::new()),
            session_ids: RwLock::new(Vec::new()),
        })
    }

    /// Reopen a previously created hierarchy under `dir`, rebuilding the
    /// in-memory node table and key maps from the relations arena.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the arena files cannot be opened, or
    /// [`Error::Internal`] if the relations arena is corrupt.
    pub fn open(dir: impl AsRef<Path>, embedding_dim: usize) -> Result<Self> {
        let hierarchy = Self::create(dir, 1, embedding_dim)?;
        let record_count = hierarchy.relations.used() / RECORD_SIZE;
        let mut nodes = Vec::with_capacity(record_count);
        let mut agent_keys = HashMap::new();
        let mut session_keys = HashMap::new();
        let mut session_ids = Vec::new();
        for i in 0..record_count {
            let offset = u32::try_from(i * RECORD_SIZE)
                .map_err(|_| Error::Internal("relations arena too large".to_string()))?;
            let bytes = hierarchy.relations.slice(offset, RECORD_SIZE)?;
            let node = node_table::decode(&bytes)?;
            if node.level_tag == AGENT_LEVEL_TAG {
                agent_keys.insert(node.agent_id.clone(), node.id);
            } else if node.level_tag == Level::Session as u8 {
                session_keys.insert(node.session_key.clone(), node.id);
                session_ids.push(node.id);
            }
            nodes.push(node);
        }
        *hierarchy.nodes.write() = nodes;
        *hierarchy.agent_keys.write() = agent_keys;
        *hierarchy.session_keys.write() = session_keys;
        *hierarchy.session_ids.write() = session_ids;
        Ok(hierarchy)
    }

    /// Total number of nodes ever created (including the agent root(s)).
    #[must_use]
    pub fn count(&self) -> usize {
        self.nodes.read().len()
    }

    /// Idempotently create (or find) the agent root node for `agent_key`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArg`] if `agent_key` exceeds
    /// [`MAX_AGENT_KEY_LEN`] bytes.
    pub fn create_agent(&self, agent_key: &str) -> Result<CreateResult> {
        if agent_key.len() > MAX_AGENT_KEY_LEN {
            return Err(Error::InvalidArg(format!(
                "agent_key exceeds {MAX_AGENT_KEY_LEN} bytes"
            )));
        }
        {
            let keys = self.agent_keys.read();
            if let Some(&id) = keys.get(agent_key) {
                return Ok(CreateResult { id, created: false });
            }
        }
        let mut nodes = self.nodes.write();
        let mut keys = self.agent_keys.write();
        if let Some(&id) = keys.get(agent_key) {
            return Ok(CreateResult { id, created: false });
        }
        let id = self.push_node(
            &mut nodes,
            AGENT_LEVEL_TAG,
            NodeId::INVALID,
            agent_key.to_string(),
            String::new(),
        )?;
        keys.insert(agent_key.to_string(), id);
        tracing::debug!(node_id = id.0, level = "agent", "created agent root");
        Ok(CreateResult { id, created: true })
    }

    /// Idempotently create (or find) a session under `agent_id`.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `agent_id` does not exist,
    /// [`Error::InvalidLevel`] if it is not the agent root, and
    /// [`Error::InvalidArg`] if `session_key` exceeds [`MAX_SESSION_KEY_LEN`]
    /// bytes.
    pub fn create_session(&self, agent_id: NodeId, session_key: &str) -> Result<CreateResult> {
        if session_key.len() > MAX_SESSION_KEY_LEN {
            return Err(Error::InvalidArg(format!(
                "session_key exceeds {MAX_SESSION_KEY_LEN} bytes"
            )));
        }
        {
            let keys = self.session_keys.read();
            if let Some(&id) = keys.get(session_key) {
                return Ok(CreateResult { id, created: false });
            }
        }
        let mut nodes = self.nodes.write();
        let mut keys = self.session_keys.write();
        if let Some(&id) = keys.get(session_key) {
            return Ok(CreateResult { id, created: false });
        }
        self.check_parent(&nodes, agent_id, AGENT_LEVEL_TAG)?;
        let agent_key = nodes[agent_id.0 as usize].agent_id.clone();
        let id = self.link_child(
            &mut nodes,
            agent_id,
            Level::Session as u8,
            agent_key,
            session_key.to_string(),
        )?;
        keys.insert(session_key.to_string(), id);
        self.session_ids.write().push(id);
        tracing::debug!(node_id = id.0, level = "session", parent_id = agent_id.0, "created session");
        Ok(CreateResult { id, created: true })
    }

    /// Create a message under a session.
    ///
    /// # Errors
    /// Returns [`Error::InvalidLevel`] if `parent` is not a session, or
    /// [`Error::NotFound`] if `parent` does not exist.
    pub fn create_message(&self, parent: NodeId) -> Result<NodeId> {
        self.create_child(parent, Level::Message)
    }

    /// Create a block under a message.
    ///
    /// # Errors
    /// Returns [`Error::InvalidLevel`] if `parent` is not a message, or
    /// [`Error::NotFound`] if `parent` does not exist.
    pub fn create_block(&self, parent: NodeId) -> Result<NodeId> {
        self.create_child(parent, Level::Block)
    }

    /// Create a statement under a block.
    ///
    /// # Errors
    /// Returns [`Error::InvalidLevel`] if `parent` is not a block, or
    /// [`Error::NotFound`] if `parent` does not exist.
    pub fn create_statement(&self, parent: NodeId) -> Result<NodeId> {
        self.create_child(parent, Level::Statement)
    }

    fn create_child(&self, parent: NodeId, level: Level) -> Result<NodeId> {
        let mut nodes = self.nodes.write();
        self.check_parent(&nodes, parent, level as u8 + 1)?;
        let id = self.link_child(&mut nodes, parent, level as u8, String::new(), String::new())?;
        tracing::debug!(node_id = id.0, level = ?level, parent_id = parent.0, "created node");
        Ok(id)
    }

    fn check_parent(&self, nodes: &[Node], parent: NodeId, expected_level_tag: u8) -> Result<()> {
        let parent_idx = parent.0 as usize;
        let parent_node = nodes
            .get(parent_idx)
            .ok_or_else(|| Error::NotFound(format!("no node with id {parent}")))?;
        if parent_node.level_tag != expected_level_tag {
            return Err(Error::InvalidLevel(format!(
                "parent {parent} has level tag {}, expected {expected_level_tag}",
                parent_node.level_tag
            )));
        }
        Ok(())
    }

    /// Allocates a new node, links it as `parent`'s last child, and
    /// persists both the new record and whichever existing record's
    /// sibling pointer changed.
    fn link_child(
        &self,
        nodes: &mut Vec<Node>,
        parent: NodeId,
        level_tag: u8,
        agent_id: String,
        session_key: String,
    ) -> Result<NodeId> {
        let id = self.push_node(nodes, level_tag, parent, agent_id, session_key)?;

        let parent_idx = parent.0 as usize;
        if nodes[parent_idx].first_child_id == NodeId::INVALID {
            nodes[parent_idx].first_child_id = id;
            self.persist(&nodes[parent_idx])?;
        } else {
            let mut cursor = nodes[parent_idx].first_child_id;
            loop {
                let cursor_idx = cursor.0 as usize;
                let next = nodes[cursor_idx].next_sibling_id;
                if next == NodeId::INVALID {
                    nodes[cursor_idx].next_sibling_id = id;
                    self.persist(&nodes[cursor_idx])?;
                    break;
                }
                cursor = next;
            }
        }
        Ok(id)
    }

    fn push_node(
        &self,
        nodes: &mut Vec<Node>,
        level_tag: u8,
        parent_id: NodeId,
        agent_id: String,
        session_key: String,
    ) -> Result<NodeId> {
        let index = nodes.len();
        let id = NodeId(
            u32::try_from(index)
                .map_err(|_| Error::Full("node id space exhausted".to_string()))?,
        );
        let parent_created_at = if parent_id.is_valid() {
            nodes
                .get(parent_id.0 as usize)
                .map(|p| p.created_at_ns)
                .unwrap_or(0)
        } else {
            0
        };
        let node = Node {
            id,
            level_tag,
            parent_id,
            first_child_id: NodeId::INVALID,
            next_sibling_id: NodeId::INVALID,
            text_offset: 0,
            text_len: 0,
            embedding_offset: INVALID_NODE_ID,
            created_at_ns: now_ns().max(parent_created_at),
            agent_id,
            session_key,
        };
        let record_offset = self.relations.alloc(RECORD_SIZE, 1)?;
        debug_assert_eq!(record_offset as usize, index * RECORD_SIZE);
        self.relations.write_at(record_offset, &node_table::encode(&node))?;
        nodes.push(node);
        Ok(id)
    }

    fn persist(&self, node: &Node) -> Result<()> {
        let offset = u32::try_from(node.id.0 as usize * RECORD_SIZE)
            .map_err(|_| Error::Internal("relations offset overflow".to_string()))?;
        self.relations.write_at(offset, &node_table::encode(node))
    }

    /// Copy `bytes` into the text arena and point `id` at them.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist.
    pub fn set_text(&self, id: NodeId, bytes: &[u8]) -> Result<()> {
        let mut nodes = self.nodes.write();
        let idx = id.0 as usize;
        if idx >= nodes.len() {
            return Err(Error::NotFound(format!("no node with id {id}")));
        }
        if bytes.is_empty() {
            nodes[idx].text_offset = 0;
            nodes[idx].text_len = 0;
        } else {
            let offset = self.text.alloc(bytes.len(), 1)?;
            self.text.write_at(offset, bytes)?;
            nodes[idx].text_offset = offset;
            nodes[idx].text_len = u32::try_from(bytes.len())
                .map_err(|_| Error::InvalidArg("text too long".to_string()))?;
        }
        self.persist(&nodes[idx])
    }

    /// Fetch the bytes previously stored via `set_text`, if any.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist.
    pub fn get_text(&self, id: NodeId) -> Result<Option<Vec<u8>>> {
        let nodes = self.nodes.read();
        let idx = id.0 as usize;
        let node = nodes
            .get(idx)
            .ok_or_else(|| Error::NotFound(format!("no node with id {id}")))?;
        if node.text_len == 0 {
            return Ok(None);
        }
        Ok(Some(self.text.slice(node.text_offset, node.text_len as usize)?))
    }

    /// Store (or replace) `id`'s embedding.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist, or
    /// [`Error::InvalidArg`] if `embedding.len() != embedding_dim`.
    pub fn set_embedding(&self, id: NodeId, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.embedding_dim {
            return Err(Error::InvalidArg(format!(
                "embedding has {} dims, expected {}",
                embedding.len(),
                self.embedding_dim
            )));
        }
        let mut nodes = self.nodes.write();
        let idx = id.0 as usize;
        if idx >= nodes.len() {
            return Err(Error::NotFound(format!("no node with id {id}")));
        }
        let mut bytes = Vec::with_capacity(embedding.len() * 4);
        for v in embedding {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let offset = self.embeddings.alloc(bytes.len(), 4)?;
        self.embeddings.write_at(offset, &bytes)?;
        nodes[idx].embedding_offset = offset;
        self.persist(&nodes[idx])
    }

    /// Fetch `id`'s embedding, if one has been set.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist.
    pub fn get_embedding(&self, id: NodeId) -> Result<Option<Vec<f32>>> {
        let nodes = self.nodes.read();
        let idx = id.0 as usize;
        let node = nodes
            .get(idx)
            .ok_or_else(|| Error::NotFound(format!("no node with id {id}")))?;
        if node.embedding_offset == INVALID_NODE_ID {
            return Ok(None);
        }
        let bytes = self
            .embeddings
            .slice(node.embedding_offset, self.embedding_dim * 4)?;
        let mut out = Vec::with_capacity(self.embedding_dim);
        for chunk in bytes.chunks_exact(4) {
            out.push(f32::from_le_bytes(chunk.try_into().unwrap()));
        }
        Ok(Some(out))
    }

    /// Fetch an owned snapshot of a node's metadata.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist.
    pub fn get_node(&self, id: NodeId) -> Result<NodeInfo> {
        let nodes = self.nodes.read();
        let node = nodes
            .get(id.0 as usize)
            .ok_or_else(|| Error::NotFound(format!("no node with id {id}")))?;
        node.to_info()
    }

    /// Children of `id`, in insertion order, capped at `cap`.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist.
    pub fn get_children(&self, id: NodeId, cap: usize) -> Result<Vec<NodeId>> {
        let nodes = self.nodes.read();
        let node = nodes
            .get(id.0 as usize)
            .ok_or_else(|| Error::NotFound(format!("no node with id {id}")))?;
        let mut out = Vec::new();
        let mut cursor = node.first_child_id;
        while cursor.is_valid() && out.len() < cap {
            out.push(cursor);
            cursor = nodes[cursor.0 as usize].next_sibling_id;
        }
        Ok(out)
    }

    /// Siblings of `id` (excludes `id` itself), order unspecified, capped
    /// at `cap`.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist.
    pub fn get_siblings(&self, id: NodeId, cap: usize) -> Result<Vec<NodeId>> {
        let nodes = self.nodes.read();
        let node = nodes
            .get(id.0 as usize)
            .ok_or_else(|| Error::NotFound(format!("no node with id {id}")))?;
        if !node.parent_id.is_valid() {
            return Ok(Vec::new());
        }
        let parent = &nodes[node.parent_id.0 as usize];
        let mut out = Vec::new();
        let mut cursor = parent.first_child_id;
        while cursor.is_valid() && out.len() < cap {
            if cursor != id {
                out.push(cursor);
            }
            cursor = nodes[cursor.0 as usize].next_sibling_id;
        }
        Ok(out)
    }

    /// Ancestors of `id`, immediate parent first, up to `cap` entries.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist.
    pub fn get_ancestors(&self, id: NodeId, cap: usize) -> Result<Vec<NodeId>> {
        let nodes = self.nodes.read();
        nodes
            .get(id.0 as usize)
            .ok_or_else(|| Error::NotFound(format!("no node with id {id}")))?;
        let mut out = Vec::new();
        let mut cursor = nodes[id.0 as usize].parent_id;
        while cursor.is_valid() && out.len() < cap {
            out.push(cursor);
            cursor = nodes[cursor.0 as usize].parent_id;
        }
        Ok(out)
    }

    /// `id`'s next sibling, or `NodeId::INVALID` if it is the last child
    /// (or `id` does not exist).
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> NodeId {
        let nodes = self.nodes.read();
        nodes
            .get(id.0 as usize)
            .map_or(NodeId::INVALID, |n| n.next_sibling_id)
    }

    /// All session node ids, in creation order (see `DESIGN.md` for why
    /// this is the canonical order this implementation picked).
    #[must_use]
    pub fn sessions(&self) -> Vec<NodeId> {
        self.session_ids.read().clone()
    }

    /// Look up a session by its external key.
    #[must_use]
    pub fn find_session(&self, session_key: &str) -> Option<NodeId> {
        self.session_keys.read().get(session_key).copied()
    }

    /// Total number of descendants of `id` (children, grandchildren, …).
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if `id` does not exist.
    pub fn count_descendants(&self, id: NodeId) -> Result<usize> {
        let nodes = self.nodes.read();
        nodes
            .get(id.0 as usize)
            .ok_or_else(|| Error::NotFound(format!("no node with id {id}")))?;
        let mut total = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let mut cursor = nodes[current.0 as usize].first_child_id;
            while cursor.is_valid() {
                total += 1;
                stack.push(cursor);
                cursor = nodes[cursor.0 as usize].next_sibling_id;
            }
        }
        Ok(total)
    }

    /// Flush all three arenas to disk.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if any underlying flush fails.
    pub fn sync(&self) -> Result<()> {
        self.relations.sync()?;
        self.text.sync()?;
        self.embeddings.sync()
    }
}

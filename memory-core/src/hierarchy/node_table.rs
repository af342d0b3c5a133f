//! Fixed-width binary encoding of [`super::Node`] records for persistence
//! in the relations arena.
//!
//! The node table is an in-memory `Vec` guarded by a lock (see
//! [`super::Hierarchy`]); this module only handles turning one record into
//! bytes and back, matching the "arena + index" data model called for by
//! the child-sibling tree: a vector of records indexed by `NodeId`, not
//! heap-allocated nodes with owning pointers.

use crate::constants::{INVALID_NODE_ID, MAX_AGENT_KEY_LEN, MAX_SESSION_KEY_LEN};
use crate::error::{Error, Result};

use super::Node;

/// Raw on-disk size of one node record, in bytes.
pub(crate) const RECORD_SIZE: usize = 4 // id
    + 1 // level
    + 4 // parent_id
    + 4 // first_child_id
    + 4 // next_sibling_id
    + 4 // text_offset
    + 4 // text_len
    + 4 // embedding_offset
    + 8 // created_at_ns
    + 1 + MAX_AGENT_KEY_LEN // agent_id_len + agent_id
    + 1 + MAX_SESSION_KEY_LEN; // session_key_len + session_key

/// Marks a node as the auxiliary agent root, which sits above `SESSION` in
/// the tree but is not part of the public `Level` enum's enum-order range.
pub(crate) const AGENT_LEVEL_TAG: u8 = 4;

pub(crate) fn encode(node: &Node) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    let mut w = 0;

    buf[w..w + 4].copy_from_slice(&node.id.0.to_le_bytes());
    w += 4;
    buf[w] = node.level_tag;
    w += 1;
    buf[w..w + 4].copy_from_slice(&node.parent_id.0.to_le_bytes());
    w += 4;
    buf[w..w + 4].copy_from_slice(&node.first_child_id.0.to_le_bytes());
    w += 4;
    buf[w..w + 4].copy_from_slice(&node.next_sibling_id.0.to_le_bytes());
    w += 4;
    buf[w..w + 4].copy_from_slice(&node.text_offset.to_le_bytes());
    w += 4;
    buf[w..w + 4].copy_from_slice(&node.text_len.to_le_bytes());
    w += 4;
    buf[w..w + 4].copy_from_slice(&node.embedding_offset.to_le_bytes());
    w += 4;
    buf[w..w + 8].copy_from_slice(&node.created_at_ns.to_le_bytes());
    w += 8;

    let agent_bytes = node.agent_id.as_bytes();
    buf[w] = agent_bytes.len() as u8;
    w += 1;
    buf[w..w + agent_bytes.len()].copy_from_slice(agent_bytes);
    w += MAX_AGENT_KEY_LEN;

    let session_bytes = node.session_key.as_bytes();
    buf[w] = session_bytes.len() as u8;
    w += 1;
    buf[w..w + session_bytes.len()].copy_from_slice(session_bytes);
    w += MAX_SESSION_KEY_LEN;

    debug_assert_eq!(w, RECORD_SIZE);
    buf
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Node> {
    if bytes.len() != RECORD_SIZE {
        return Err(Error::Internal(format!(
            "node record has wrong size: expected {RECORD_SIZE}, got {}",
            bytes.len()
        )));
    }
    let mut r = 0;
    let id = u32::from_le_bytes(bytes[r..r + 4].try_into().unwrap());
    r += 4;
    let level_tag = bytes[r];
    r += 1;
    let parent_id = u32::from_le_bytes(bytes[r..r + 4].try_into().unwrap());
    r += 4;
    let first_child_id = u32::from_le_bytes(bytes[r..r + 4].try_into().unwrap());
    r += 4;
    let next_sibling_id = u32::from_le_bytes(bytes[r..r + 4].try_into().unwrap());
    r += 4;
    let text_offset = u32::from_le_bytes(bytes[r..r + 4].try_into().unwrap());
    r += 4;
    let text_len = u32::from_le_bytes(bytes[r..r + 4].try_into().unwrap());
    r += 4;
    let embedding_offset = u32::from_le_bytes(bytes[r..r + 4].try_into().unwrap());
    r += 4;
    let created_at_ns = u64::from_le_bytes(bytes[r..r + 8].try_into().unwrap());
    r += 8;

    let agent_len = bytes[r] as usize;
    r += 1;
    let agent_id = String::from_utf8_lossy(&bytes[r..r + agent_len]).into_owned();
    r += MAX_AGENT_KEY_LEN;

    let session_len = bytes[r] as usize;
    r += 1;
    let session_key = String::from_utf8_lossy(&bytes[r..r + session_len]).into_owned();
    r += MAX_SESSION_KEY_LEN;

    debug_assert_eq!(r, RECORD_SIZE);

    Ok(Node {
        id: super::NodeId(id),
        level_tag,
        parent_id: super::NodeId(parent_id),
        first_child_id: super::NodeId(first_child_id),
        next_sibling_id: super::NodeId(next_sibling_id),
        text_offset,
        text_len,
        embedding_offset,
        created_at_ns,
        agent_id,
        session_key,
    })
}

pub(crate) const INVALID: u32 = INVALID_NODE_ID;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{Level, Node, NodeId};

    #[test]
    fn round_trips_a_full_record() {
        let node = Node {
            id: NodeId(7),
            level_tag: Level::Session as u8,
            parent_id: NodeId(0),
            first_child_id: NodeId::INVALID,
            next_sibling_id: NodeId::INVALID,
            text_offset: 10,
            text_len: 20,
            embedding_offset: 30,
            created_at_ns: 123_456_789,
            agent_id: "agent-a".to_string(),
            session_key: "session-key".to_string(),
        };
        let bytes = encode(&node);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.id, node.id);
        assert_eq!(decoded.level_tag, node.level_tag);
        assert_eq!(decoded.agent_id, node.agent_id);
        assert_eq!(decoded.session_key, node.session_key);
        assert_eq!(decoded.created_at_ns, node.created_at_ns);
    }

    #[test]
    fn rejects_wrong_size_buffer() {
        assert!(decode(&[0u8; 3]).is_err());
    }
}

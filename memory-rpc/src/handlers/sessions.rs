//! `get_session`, `list_sessions` — session lookup and enumeration.
//!
//! `list_sessions` returns sessions in creation order via
//! [`memory_core::hierarchy::Hierarchy::sessions`], the already-idiomatic
//! `Vec<NodeId>` translation of an iterator-style listing (see DESIGN.md).

use serde::Deserialize;
use serde_json::{Value, json};

use memory_core::Error;

use crate::error::RpcError;
use crate::handlers::common::parse_params;
use crate::state::MemoryService;

#[derive(Debug, Deserialize)]
struct GetSessionParams {
    session_id: String,
}

pub async fn get_session(service: &MemoryService, params: Option<Value>) -> Result<Value, RpcError> {
    let params: GetSessionParams = parse_params(params)?;
    let node = service
        .hierarchy
        .find_session(&params.session_id)
        .ok_or_else(|| Error::NotFound(format!("no such session: {}", params.session_id)))?;

    let info = service.hierarchy.get_node(node)?;
    let message_count = service.hierarchy.get_children(node, usize::MAX)?.len();

    Ok(json!({
        "node_id": node.0,
        "session_id": info.session_key,
        "agent_id": info.agent_id,
        "message_count": message_count,
        "created_at_ns": info.created_at_ns,
    }))
}

pub async fn list_sessions(service: &MemoryService, _params: Option<Value>) -> Result<Value, RpcError> {
    let mut sessions = Vec::new();
    for node in service.hierarchy.sessions() {
        let info = service.hierarchy.get_node(node)?;
        sessions.push(json!({
            "node_id": node.0,
            "session_id": info.session_key,
            "agent_id": info.agent_id,
            "created_at_ns": info.created_at_ns,
        }));
    }
    Ok(json!({ "sessions": sessions }))
}

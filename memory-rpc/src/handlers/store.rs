//! `store`, `store_block`, `store_statement` — ingest handlers. Grounded on
//! spec.md §4.5's control-flow description: decompose, then for every node
//! produced, embed and index it.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use memory_core::decomposer::decompose;
use memory_core::hierarchy::{Level, NodeId};

use crate::error::RpcError;
use crate::handlers::common::parse_params;
use crate::state::MemoryService;

#[derive(Debug, Deserialize)]
struct StoreParams {
    agent_id: String,
    session_id: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct StoreChildParams {
    parent_id: u32,
    content: String,
}

async fn embed_and_index(
    service: &MemoryService,
    id: NodeId,
    level: Level,
    text: &str,
    created_at_ns: u64,
) -> Result<(), RpcError> {
    service.hierarchy.set_text(id, text.as_bytes())?;
    let embedding = service.embedder.embed(text).await?;
    service.hierarchy.set_embedding(id, &embedding)?;
    service
        .search
        .index(id, level, Some(&embedding), Some(text), created_at_ns)?;
    Ok(())
}

/// Ingest a full message: create the agent/session if absent, create the
/// message node, decompose its content into blocks and statements, and
/// index every node produced.
pub async fn store(service: &MemoryService, params: Option<Value>) -> Result<Value, RpcError> {
    let params: StoreParams = parse_params(params)?;

    let agent = service.hierarchy.create_agent(&params.agent_id)?;
    let session = service
        .hierarchy
        .create_session(agent.id, &params.session_id)?;
    let message_id = service.hierarchy.create_message(session.id)?;
    let now_ns = MemoryService::now_ns();

    embed_and_index(service, message_id, Level::Message, &params.content, now_ns).await?;

    let mut blocks_created = 0usize;
    let mut statements_created = 0usize;

    for block in decompose(params.content.as_bytes()) {
        let block_text = String::from_utf8_lossy(block.content.bytes).into_owned();
        let block_id = service.hierarchy.create_block(message_id)?;
        embed_and_index(service, block_id, Level::Block, &block_text, now_ns).await?;
        blocks_created += 1;

        for statement in &block.statements {
            let statement_text = String::from_utf8_lossy(statement.bytes).into_owned();
            let statement_id = service.hierarchy.create_statement(block_id)?;
            embed_and_index(service, statement_id, Level::Statement, &statement_text, now_ns)
                .await?;
            statements_created += 1;
        }
    }

    Ok(json!({
        "agent_id": params.agent_id,
        "session_id": params.session_id,
        "message_id": message_id.0,
        "blocks_created": blocks_created,
        "statements_created": statements_created,
        "new_session": session.created,
    }))
}

#[derive(Serialize)]
struct NodeCreatedResponse {
    id: u32,
    level: &'static str,
}

/// Ingest a standalone block under an existing message.
pub async fn store_block(service: &MemoryService, params: Option<Value>) -> Result<Value, RpcError> {
    let params: StoreChildParams = parse_params(params)?;
    let parent = NodeId(params.parent_id);
    let block_id = service.hierarchy.create_block(parent)?;
    let now_ns = MemoryService::now_ns();
    embed_and_index(service, block_id, Level::Block, &params.content, now_ns).await?;
    Ok(serde_json::to_value(NodeCreatedResponse { id: block_id.0, level: "block" }).unwrap())
}

/// Ingest a standalone statement under an existing block.
pub async fn store_statement(
    service: &MemoryService,
    params: Option<Value>,
) -> Result<Value, RpcError> {
    let params: StoreChildParams = parse_params(params)?;
    let parent = NodeId(params.parent_id);
    let statement_id = service.hierarchy.create_statement(parent)?;
    let now_ns = MemoryService::now_ns();
    embed_and_index(service, statement_id, Level::Statement, &params.content, now_ns).await?;
    Ok(serde_json::to_value(NodeCreatedResponse { id: statement_id.0, level: "statement" }).unwrap())
}

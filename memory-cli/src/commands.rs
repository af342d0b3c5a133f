//! CLI subcommands, each built as a `serde_json` params value dispatched
//! through `memory_rpc::dispatcher::dispatch` — the CLI is an in-process
//! JSON-RPC client over the same [`memory_rpc::state::MemoryService`] the
//! server binary builds, so business logic lives in exactly one place.

use clap::Subcommand;
use serde_json::{Value, json};

use memory_rpc::dispatcher;
use memory_rpc::jsonrpc::JsonRpcRequest;
use memory_rpc::state::MemoryService;

#[derive(Subcommand)]
pub enum Command {
    /// Ingest a full message under an agent/session, decomposing it into
    /// blocks and statements.
    Store {
        #[arg(long)]
        agent_id: String,
        #[arg(long)]
        session_id: String,
        /// Message text. Read from stdin if omitted.
        content: Option<String>,
    },
    /// Ingest a standalone block under an existing message.
    StoreBlock {
        #[arg(long)]
        parent_id: u32,
        content: String,
    },
    /// Ingest a standalone statement under an existing block.
    StoreStatement {
        #[arg(long)]
        parent_id: u32,
        content: String,
    },
    /// Run a semantic + lexical query across the tree.
    Query {
        query: String,
        #[arg(long)]
        max_results: Option<usize>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        top_level: Option<String>,
        #[arg(long)]
        bottom_level: Option<String>,
    },
    /// List a node's children, optionally filtered by substring.
    DrillDown {
        id: u32,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Show a node's ancestors and siblings.
    ZoomOut { id: u32 },
    /// Show a node plus whichever of parent/children/siblings are requested.
    GetContext {
        node_id: u32,
        #[arg(long)]
        no_parent: bool,
        #[arg(long)]
        no_children: bool,
        #[arg(long)]
        no_siblings: bool,
    },
    /// Look up one session by key.
    GetSession { session_id: String },
    /// List every session, in creation order.
    ListSessions,
}

impl Command {
    fn method(&self) -> &'static str {
        match self {
            Command::Store { .. } => "store",
            Command::StoreBlock { .. } => "store_block",
            Command::StoreStatement { .. } => "store_statement",
            Command::Query { .. } => "query",
            Command::DrillDown { .. } => "drill_down",
            Command::ZoomOut { .. } => "zoom_out",
            Command::GetContext { .. } => "get_context",
            Command::GetSession { .. } => "get_session",
            Command::ListSessions => "list_sessions",
        }
    }

    fn params(&self) -> anyhow::Result<Value> {
        Ok(match self {
            Command::Store { agent_id, session_id, content } => {
                let content = match content {
                    Some(c) => c.clone(),
                    None => read_stdin_to_string()?,
                };
                json!({ "agent_id": agent_id, "session_id": session_id, "content": content })
            }
            Command::StoreBlock { parent_id, content } => {
                json!({ "parent_id": parent_id, "content": content })
            }
            Command::StoreStatement { parent_id, content } => {
                json!({ "parent_id": parent_id, "content": content })
            }
            Command::Query { query, max_results, level, top_level, bottom_level } => json!({
                "query": query,
                "max_results": max_results,
                "level": level,
                "top_level": top_level,
                "bottom_level": bottom_level,
            }),
            Command::DrillDown { id, filter, max_results } => json!({
                "id": id,
                "filter": filter,
                "max_results": max_results,
            }),
            Command::ZoomOut { id } => json!({ "id": id }),
            Command::GetContext { node_id, no_parent, no_children, no_siblings } => json!({
                "node_id": node_id,
                "include_parent": !no_parent,
                "include_children": !no_children,
                "include_siblings": !no_siblings,
            }),
            Command::GetSession { session_id } => json!({ "session_id": session_id }),
            Command::ListSessions => json!({}),
        })
    }
}

fn read_stdin_to_string() -> anyhow::Result<String> {
    use std::io::Read;
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Build a JSON-RPC request for `command` and dispatch it against `service`.
///
/// # Errors
/// Returns the RPC error's message as a plain string on failure.
pub async fn run(service: &MemoryService, command: &Command) -> Result<Value, String> {
    let params = command.params().map_err(|e| e.to_string())?;
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(json!(1)),
        method: command.method().to_string(),
        params: Some(params),
    };
    let response = dispatcher::dispatch(service, request)
        .await
        .expect("request carries an id, so a response is always returned");
    match (response.result, response.error) {
        (Some(value), _) => Ok(value),
        (None, Some(error)) => Err(error.message),
        (None, None) => Ok(Value::Null),
    }
}

//! MCP tool-surface wrapper: `initialize`, `tools/list`, `tools/call`,
//! `shutdown` — grounded on the teacher's `protocol.rs` handlers, stripped
//! of the OAuth 2.1 capability block (authentication is out of scope here).

use serde::Serialize;
use serde_json::{Value, json};

use crate::dispatcher;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::state::MemoryService;

/// Supported MCP protocol versions, latest first.
pub const SUPPORTED_VERSIONS: &[&str] = &["2025-06-18", "2024-11-05"];

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: Value,
    #[serde(rename = "serverInfo")]
    pub server_info: Value,
}

#[derive(Debug, Serialize)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Serialize)]
pub struct ListToolsResult {
    pub tools: Vec<McpTool>,
}

/// One entry per tool, mapping it 1:1 onto an RPC method.
fn tool_catalog() -> Vec<McpTool> {
    let text_schema = |props: Value, required: &[&str]| {
        json!({ "type": "object", "properties": props, "required": required })
    };

    vec![
        McpTool {
            name: "memory_store".to_string(),
            description: "Ingest a message into a session, decomposing it into blocks and statements".to_string(),
            input_schema: text_schema(
                json!({
                    "agent_id": {"type": "string"},
                    "session_id": {"type": "string"},
                    "content": {"type": "string"},
                }),
                &["agent_id", "session_id", "content"],
            ),
        },
        McpTool {
            name: "memory_store_block".to_string(),
            description: "Add a block under an existing message".to_string(),
            input_schema: text_schema(
                json!({"parent_id": {"type": "integer"}, "content": {"type": "string"}}),
                &["parent_id", "content"],
            ),
        },
        McpTool {
            name: "memory_store_statement".to_string(),
            description: "Add a statement under an existing block".to_string(),
            input_schema: text_schema(
                json!({"parent_id": {"type": "integer"}, "content": {"type": "string"}}),
                &["parent_id", "content"],
            ),
        },
        McpTool {
            name: "memory_query".to_string(),
            description: "Semantic + lexical search across the hierarchy".to_string(),
            input_schema: text_schema(json!({"query": {"type": "string"}}), &["query"]),
        },
        McpTool {
            name: "memory_drill_down".to_string(),
            description: "List a node's children, optionally filtered by substring".to_string(),
            input_schema: text_schema(json!({"id": {"type": "integer"}}), &["id"]),
        },
        McpTool {
            name: "memory_zoom_out".to_string(),
            description: "Show a node's ancestors and sibling previews".to_string(),
            input_schema: text_schema(json!({"id": {"type": "integer"}}), &["id"]),
        },
        McpTool {
            name: "memory_list_sessions".to_string(),
            description: "List all known sessions in creation order".to_string(),
            input_schema: text_schema(json!({}), &[]),
        },
        McpTool {
            name: "memory_get_session".to_string(),
            description: "Look up a session by its external key".to_string(),
            input_schema: text_schema(json!({"session_id": {"type": "string"}}), &["session_id"]),
        },
    ]
}

/// `initialize` — negotiate protocol version and advertise capabilities.
pub async fn handle_initialize(request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    request.id.as_ref()?;

    let requested = request
        .params
        .as_ref()
        .and_then(|params| params.get("protocolVersion"))
        .and_then(Value::as_str);

    let protocol_version = match requested {
        Some(version) if SUPPORTED_VERSIONS.contains(&version) => version.to_string(),
        _ => SUPPORTED_VERSIONS[0].to_string(),
    };

    let result = InitializeResult {
        protocol_version,
        capabilities: json!({ "tools": { "listChanged": false } }),
        server_info: json!({ "name": "memory-server", "version": env!("CARGO_PKG_VERSION") }),
    };

    Some(JsonRpcResponse::ok(request.id, serde_json::to_value(result).unwrap_or(Value::Null)))
}

/// `tools/list` — advertise the tool catalog.
pub async fn handle_list_tools(request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    request.id.as_ref()?;
    let result = ListToolsResult { tools: tool_catalog() };
    Some(JsonRpcResponse::ok(request.id, serde_json::to_value(result).unwrap_or(Value::Null)))
}

/// `tools/call` — dispatch a tool invocation onto the matching RPC method
/// and wrap the result as MCP's `{content: [{type: "text", text}]}` shape.
pub async fn handle_call_tool(service: &MemoryService, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    let id = request.id.clone();
    id.as_ref()?;

    let Some(params) = request.params else {
        return Some(JsonRpcResponse::err(
            id,
            crate::error::RpcError::InvalidParams("missing params".to_string()).to_jsonrpc(),
        ));
    };
    let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
        return Some(JsonRpcResponse::err(
            id,
            crate::error::RpcError::InvalidParams("missing tool name".to_string()).to_jsonrpc(),
        ));
    };
    let Some(method) = tool_name.strip_prefix("memory_") else {
        return Some(JsonRpcResponse::err(
            id,
            crate::error::RpcError::MethodNotFound(tool_name.to_string()).to_jsonrpc(),
        ));
    };

    let arguments = params.get("arguments").cloned();
    let inner = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: id.clone(),
        method: method.to_string(),
        params: arguments,
    };
    let response = dispatcher::dispatch(service, inner).await?;

    match response.error {
        Some(error) => Some(JsonRpcResponse::err(id, error)),
        None => {
            let text = response.result.map_or_else(String::new, |v| v.to_string());
            Some(JsonRpcResponse::ok(
                id,
                json!({ "content": [{ "type": "text", "text": text }] }),
            ))
        }
    }
}

/// `shutdown` — acknowledge and let the caller stop the transport loop.
pub async fn handle_shutdown(request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    request.id.as_ref()?;
    Some(JsonRpcResponse::ok(request.id, json!(null)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_negotiates_latest_when_unspecified() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: "initialize".to_string(),
            params: None,
        };
        let response = handle_initialize(request).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], SUPPORTED_VERSIONS[0]);
    }

    #[tokio::test]
    async fn initialize_is_silent_for_notifications() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "initialize".to_string(),
            params: None,
        };
        assert!(handle_initialize(request).await.is_none());
    }

    #[tokio::test]
    async fn list_tools_returns_full_catalog() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: "tools/list".to_string(),
            params: None,
        };
        let response = handle_list_tools(request).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["tools"].as_array().unwrap().len(), tool_catalog().len());
    }
}

//! Method-name dispatch, grounded on the teacher's `bin/server.rs`
//! `handle_request` match — stripped of the OAuth/compat-alias logic this
//! spec has no use for.

use std::time::Instant;

use serde_json::json;

use memory_core::events::Event;
use tracing::Instrument;

use crate::handlers::{navigate, query, sessions, store};
use crate::jsonrpc::{INVALID_REQUEST, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::state::MemoryService;

const MUTATING_METHODS: &[&str] = &["store", "store_block", "store_statement"];

/// Validate and route one JSON-RPC request. Returns `None` for
/// notifications (no `id`), since those get no response per spec.
pub async fn dispatch(service: &MemoryService, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    let trace_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("rpc_method", method = %request.method, trace_id = %trace_id);

    if request.jsonrpc != "2.0" {
        let error = JsonRpcError {
            code: INVALID_REQUEST,
            message: "jsonrpc must be \"2.0\"".to_string(),
            data: None,
        };
        service.metrics.record(false, 0);
        return request.id.map(|id| JsonRpcResponse::err(Some(id), error));
    }

    let method = request.method.clone();
    let start = Instant::now();
    let outcome = route(service, &method, request.params).instrument(span).await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (result, error) = match &outcome {
        Ok(value) => (Some(value.clone()), None),
        Err(err) => (None, Some(err.to_jsonrpc())),
    };
    service.metrics.record(error.is_none(), latency_ms);

    if error.is_none() && service.config.memory.emit_events && MUTATING_METHODS.contains(&method.as_str()) {
        let event = Event {
            ts: chrono::Utc::now().to_rfc3339(),
            component_id: "memory-rpc".to_string(),
            level: "info".to_string(),
            event: method.clone(),
            trace_id,
            data: result.clone().unwrap_or(json!(null)),
        };
        let _ = service.events.emit(&event).await;
    }

    request.id.map(|id| match outcome {
        Ok(value) => JsonRpcResponse::ok(Some(id), value),
        Err(_) => JsonRpcResponse::err(Some(id), error.expect("error set when outcome is Err")),
    })
}

async fn route(
    service: &MemoryService,
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<serde_json::Value, crate::error::RpcError> {
    match method {
        "store" => store::store(service, params).await,
        "store_block" => store::store_block(service, params).await,
        "store_statement" => store::store_statement(service, params).await,
        "query" => query::query(service, params).await,
        "drill_down" => navigate::drill_down(service, params).await,
        "zoom_out" => navigate::zoom_out(service, params).await,
        "get_context" => navigate::get_context(service, params).await,
        "get_session" => sessions::get_session(service, params).await,
        "list_sessions" => sessions::list_sessions(service, params).await,
        other => Err(crate::error::RpcError::MethodNotFound(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use serde_json::json;

    async fn test_service() -> (tempfile::TempDir, MemoryService) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.memory.data_dir = dir.path().to_string_lossy().into_owned();
        config.memory.embedding_dim = 8;
        config.memory.arena_size = 1 << 16;
        let service = MemoryService::new(config).await.unwrap();
        (dir, service)
    }

    #[tokio::test]
    async fn rejects_wrong_jsonrpc_version() {
        let (_dir, service) = test_service().await;
        let request = JsonRpcRequest {
            jsonrpc: "1.0".to_string(),
            id: Some(json!(1)),
            method: "list_sessions".to_string(),
            params: None,
        };
        let response = dispatch(&service, request).await.unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn unknown_method_yields_method_not_found() {
        let (_dir, service) = test_service().await;
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: "bogus".to_string(),
            params: None,
        };
        let response = dispatch(&service, request).await.unwrap();
        assert_eq!(response.error.unwrap().code, crate::jsonrpc::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn notification_without_id_yields_no_response() {
        let (_dir, service) = test_service().await;
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "list_sessions".to_string(),
            params: None,
        };
        assert!(dispatch(&service, request).await.is_none());
    }

    #[tokio::test]
    async fn list_sessions_on_empty_store_is_empty() {
        let (_dir, service) = test_service().await;
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: "list_sessions".to_string(),
            params: None,
        };
        let response = dispatch(&service, request).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["sessions"].as_array().unwrap().len(), 0);
    }
}


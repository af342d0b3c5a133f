//! End-to-end scenarios through the JSON-RPC dispatcher (spec.md §8's
//! S4–S6): store via `store`, navigate via `drill_down`/`zoom_out`, and
//! confirm `get_context`'s default-inclusion behavior.

use serde_json::json;

use memory_rpc::config::ServerConfig;
use memory_rpc::dispatcher::dispatch;
use memory_rpc::jsonrpc::JsonRpcRequest;
use memory_rpc::state::MemoryService;

async fn service() -> (tempfile::TempDir, MemoryService) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::default();
    config.memory.data_dir = dir.path().to_string_lossy().into_owned();
    config.memory.embedding_dim = 8;
    config.memory.arena_size = 1 << 16;
    (dir, MemoryService::new(config).await.unwrap())
}

fn request(method: &str, params: serde_json::Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(json!(1)),
        method: method.to_string(),
        params: Some(params),
    }
}

#[tokio::test]
async fn s4_store_creates_full_tree_and_list_sessions_sees_it() {
    let (_dir, service) = service().await;

    let store_result = dispatch(
        &service,
        request(
            "store",
            json!({
                "agent_id": "agent-1",
                "session_id": "sess-1",
                "content": "Errors should be values. Use Result, not exceptions.",
            }),
        ),
    )
    .await
    .unwrap();
    let store_value = store_result.result.unwrap();
    assert!(store_value["blocks_created"].as_u64().unwrap() >= 1);

    let list_result = dispatch(&service, request("list_sessions", json!({}))).await.unwrap();
    let sessions = list_result.result.unwrap()["sessions"].as_array().unwrap().clone();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], "sess-1");
}

#[tokio::test]
async fn s5_drill_down_and_zoom_out_from_a_stored_message() {
    let (_dir, service) = service().await;
    let store_value = dispatch(
        &service,
        request(
            "store",
            json!({
                "agent_id": "agent-1",
                "session_id": "sess-1",
                "content": "First sentence here. Second sentence follows.",
            }),
        ),
    )
    .await
    .unwrap()
    .result
    .unwrap();
    let message_id = store_value["message_id"].as_u64().unwrap() as u32;

    let drill = dispatch(&service, request("drill_down", json!({ "id": message_id })))
        .await
        .unwrap()
        .result
        .unwrap();
    let block_ids = drill["ids"].as_array().unwrap();
    assert!(!block_ids.is_empty());

    let block_id = block_ids[0].as_u64().unwrap() as u32;
    let zoom = dispatch(&service, request("zoom_out", json!({ "id": block_id })))
        .await
        .unwrap()
        .result
        .unwrap();
    assert_eq!(zoom["node"]["id"], block_id);
    assert!(zoom["ancestors"].as_array().unwrap().iter().any(|a| a["id"] == message_id));
}

#[tokio::test]
async fn s6_get_context_defaults_include_everything() {
    let (_dir, service) = service().await;
    let store_value = dispatch(
        &service,
        request(
            "store",
            json!({
                "agent_id": "agent-1",
                "session_id": "sess-1",
                "content": "A lone sentence with no code.",
            }),
        ),
    )
    .await
    .unwrap()
    .result
    .unwrap();
    let message_id = store_value["message_id"].as_u64().unwrap() as u32;

    let context = dispatch(&service, request("get_context", json!({ "node_id": message_id })))
        .await
        .unwrap()
        .result
        .unwrap();
    assert!(context.get("parent").is_some());
    assert!(context.get("children").is_some());
    assert!(context.get("siblings").is_some());

    let lean = dispatch(
        &service,
        request(
            "get_context",
            json!({ "node_id": message_id, "include_children": false }),
        ),
    )
    .await
    .unwrap()
    .result
    .unwrap();
    assert!(lean.get("children").is_none());
}

#[tokio::test]
async fn unknown_node_id_yields_not_found_error() {
    let (_dir, service) = service().await;
    let response = dispatch(&service, request("zoom_out", json!({ "id": 999_999 }))).await.unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, memory_rpc::jsonrpc::SERVER_ERROR);
}

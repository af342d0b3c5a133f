//! Raw HTTP/1.1 transport: `POST /rpc`, `GET /health`, `GET /metrics`.
//! Grounded directly on the teacher's
//! `memory-core/src/monitoring/metrics/http_server.rs`: one `TcpListener`
//! accept loop, `tokio::spawn` per connection, hand-parsed request line.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::dispatcher;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::state::MemoryService;

/// Bind `addr` and serve until the process is killed. One task per
/// connection; each connection handles exactly one request (no
/// keep-alive, matching the teacher's metrics server).
///
/// # Errors
/// Returns an error if the listener can't bind.
pub async fn serve(service: Arc<MemoryService>, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "memory-rpc HTTP transport listening");

    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &service).await {
                tracing::warn!(%peer_addr, error = %e, "error handling connection");
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    service: &MemoryService,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buffer = vec![0u8; 8192];
    let n = stream.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..n]).into_owned();

    let mut lines = request.split("\r\n");
    let request_line = lines.next().unwrap_or("");
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return write_status(&mut stream, 400, "Bad Request", "text/plain", "bad request").await;
    }
    let (method, path) = (parts[0], parts[1]);

    match (method, path) {
        ("GET", "/health") => {
            let body = serde_json::json!({
                "status": "ok",
                "node_count": service.hierarchy.count(),
                "uptime_ms": service.uptime_ms(),
                "request_count": service.metrics.requests_total(),
            })
            .to_string();
            write_status(&mut stream, 200, "OK", "application/json", &body).await
        }
        ("GET", "/metrics") => {
            let node_count = u64::try_from(service.hierarchy.count()).unwrap_or(u64::MAX);
            let body = service.metrics.export(node_count);
            write_status(&mut stream, 200, "OK", "text/plain; charset=utf-8", &body).await
        }
        ("POST", "/rpc") => {
            let body = request.split("\r\n\r\n").nth(1).unwrap_or("").trim_end_matches('\0');
            handle_rpc_body(&mut stream, service, body).await
        }
        (other_method, _) if other_method != "GET" && other_method != "POST" => {
            write_status(&mut stream, 405, "Method Not Allowed", "text/plain", "method not allowed").await
        }
        _ => write_status(&mut stream, 404, "Not Found", "text/plain", "not found").await,
    }
}

async fn handle_rpc_body(
    stream: &mut TcpStream,
    service: &MemoryService,
    body: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let request: JsonRpcRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            let error = crate::jsonrpc::JsonRpcError {
                code: PARSE_ERROR,
                message: format!("invalid JSON: {e}"),
                data: None,
            };
            let response = JsonRpcResponse::err(None, error);
            let text = serde_json::to_string(&response)?;
            return write_status(stream, 200, "OK", "application/json", &text).await;
        }
    };

    let response = dispatcher::dispatch(service, request).await;
    let text = match response {
        Some(response) => serde_json::to_string(&response)?,
        None => String::new(),
    };
    write_status(stream, 200, "OK", "application/json", &text).await
}

async fn write_status(
    stream: &mut TcpStream,
    code: u16,
    reason: &str,
    content_type: &str,
    body: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let response = format!(
        "HTTP/1.1 {code} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    Ok(())
}

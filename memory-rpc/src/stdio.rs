//! Stdio JSON-RPC transport, grounded directly on the teacher's
//! `bin/server.rs::run_jsonrpc_server` — same read-parse-dispatch-write
//! loop, same framing-matches-input behavior, stripped of elicitation
//! tracking and OAuth (out of scope here).

use std::io::{self, Write};

use crate::dispatcher;
use crate::jsonrpc::{
    JsonRpcError, JsonRpcResponse, PARSE_ERROR, read_next_message, write_response_line,
    write_response_with_length,
};
use crate::state::MemoryService;

/// Read JSON-RPC requests from stdin until EOF, dispatching each one and
/// writing its response to stdout in whichever framing it arrived in.
///
/// # Errors
/// Propagates I/O errors from stdin/stdout.
pub async fn run(service: &MemoryService) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();

    loop {
        let message = match read_next_message(&mut handle) {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::info!("stdin closed, shutting down");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "error reading from stdin");
                break;
            }
        };
        let (line, is_lsp) = message;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response_str = match serde_json::from_str(line) {
            Ok(request) => match dispatcher::dispatch(service, request).await {
                Some(response) => serde_json::to_string(&response).map_err(to_io_error)?,
                None => continue,
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to parse JSON-RPC request");
                let response = JsonRpcResponse::err(
                    None,
                    JsonRpcError {
                        code: PARSE_ERROR,
                        message: "parse error".to_string(),
                        data: Some(serde_json::json!({ "details": e.to_string() })),
                    },
                );
                serde_json::to_string(&response).map_err(to_io_error)?
            }
        };

        if is_lsp {
            write_response_with_length(&mut stdout, &response_str)?;
        } else {
            write_response_line(&mut stdout, &response_str)?;
        }
        stdout.flush()?;
    }

    tracing::info!("memory-rpc stdio transport shut down");
    Ok(())
}

fn to_io_error(e: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

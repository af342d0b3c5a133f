//! Transport-level error type: wraps `memory_core::Error` plus RPC framing
//! failures, and maps either onto a JSON-RPC `(code, message)` pair per
//! spec.md §7.

use crate::jsonrpc::{INTERNAL_ERROR, INVALID_PARAMS, JsonRpcError, SERVER_ERROR};

/// Errors the RPC layer itself can raise, distinct from `memory_core::Error`.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// A request's `params` object was missing a required field or had the
    /// wrong shape.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// No handler is registered for the requested method.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// A core operation failed.
    #[error(transparent)]
    Core(#[from] memory_core::Error),
}

impl RpcError {
    /// Translate into a JSON-RPC error object per spec.md §7's table:
    /// `InvalidArg`/`InvalidLevel` → -32602, `NotFound` → -32000, others →
    /// -32603.
    #[must_use]
    pub fn to_jsonrpc(&self) -> JsonRpcError {
        match self {
            RpcError::InvalidParams(msg) => JsonRpcError {
                code: INVALID_PARAMS,
                message: msg.clone(),
                data: None,
            },
            RpcError::MethodNotFound(method) => JsonRpcError {
                code: crate::jsonrpc::METHOD_NOT_FOUND,
                message: format!("method not found: {method}"),
                data: None,
            },
            RpcError::Core(err) => {
                let code = match err {
                    memory_core::Error::InvalidArg(_) | memory_core::Error::InvalidLevel(_) => {
                        INVALID_PARAMS
                    }
                    memory_core::Error::NotFound(_) => SERVER_ERROR,
                    _ => INTERNAL_ERROR,
                };
                JsonRpcError {
                    code,
                    message: err.to_string(),
                    data: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_arg_maps_to_invalid_params_code() {
        let err = RpcError::Core(memory_core::Error::InvalidArg("bad".into()));
        assert_eq!(err.to_jsonrpc().code, INVALID_PARAMS);
    }

    #[test]
    fn not_found_maps_to_server_error_code() {
        let err = RpcError::Core(memory_core::Error::NotFound("x".into()));
        assert_eq!(err.to_jsonrpc().code, SERVER_ERROR);
    }

    #[test]
    fn internal_maps_to_internal_error_code() {
        let err = RpcError::Core(memory_core::Error::Internal("x".into()));
        assert_eq!(err.to_jsonrpc().code, INTERNAL_ERROR);
    }

    #[test]
    fn method_not_found_maps_correctly() {
        let err = RpcError::MethodNotFound("bogus".into());
        assert_eq!(err.to_jsonrpc().code, crate::jsonrpc::METHOD_NOT_FOUND);
    }
}

//! Helpers shared by every handler: params parsing, level-name parsing,
//! and byte-safe text preview truncation.

use serde::de::DeserializeOwned;
use serde_json::Value;

use memory_core::hierarchy::Level;

use crate::error::RpcError;

/// Deserialize a request's `params` into `T`, or fail with `InvalidParams`.
pub fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
    let value = params.ok_or_else(|| RpcError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(value).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

/// Parse a level name (`"session"`, `"message"`, `"block"`, `"statement"`,
/// case-insensitive) as used in `query`'s `level`/`top_level`/`bottom_level`
/// fields.
pub fn parse_level(name: &str) -> Result<Level, RpcError> {
    match name.to_ascii_lowercase().as_str() {
        "session" => Ok(Level::Session),
        "message" => Ok(Level::Message),
        "block" => Ok(Level::Block),
        "statement" => Ok(Level::Statement),
        other => Err(RpcError::InvalidParams(format!("unknown level: {other}"))),
    }
}

#[must_use]
pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::Session => "session",
        Level::Message => "message",
        Level::Block => "block",
        Level::Statement => "statement",
    }
}

/// Truncate `bytes` to at most `max_bytes`, landing on a UTF-8 char
/// boundary, and lossily decode the result for display.
#[must_use]
pub fn preview(bytes: &[u8], max_bytes: usize) -> (String, bool) {
    if bytes.len() <= max_bytes {
        return (String::from_utf8_lossy(bytes).into_owned(), false);
    }
    let mut cut = max_bytes;
    while cut > 0 && !bytes.is_char_boundary(cut) {
        cut -= 1;
    }
    (String::from_utf8_lossy(&bytes[..cut]).into_owned(), true)
}

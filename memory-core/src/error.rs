//! Error kinds shared across the hierarchy, search engine, and arenas.

/// Result type alias for memory-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds the core distinguishes.
///
/// Variants map 1:1 onto the error kinds named in the design: callers at the
/// RPC boundary translate these into JSON-RPC error codes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument was malformed (bad alignment, empty vector, etc).
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// No node, session, or index entry exists for the given key.
    #[error("not found: {0}")]
    NotFound(String),

    /// A create operation found an existing entry with the same idempotency key.
    #[error("already exists: {0}")]
    Exists(String),

    /// An index or arena is at capacity and cannot accept more entries.
    #[error("capacity exceeded: {0}")]
    Full(String),

    /// A node creation was attempted with a parent whose level doesn't match.
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// Allocation failed because the arena cannot grow further.
    #[error("out of memory: {0}")]
    Nomem(String),

    /// Underlying file or mmap I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing/serialization failed.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Catch-all for invariant violations that should never happen in practice.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable kind name, used by the RPC layer for error mapping.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArg(_) => "invalid_arg",
            Error::NotFound(_) => "not_found",
            Error::Exists(_) => "exists",
            Error::Full(_) => "full",
            Error::InvalidLevel(_) => "invalid_level",
            Error::Nomem(_) => "nomem",
            Error::Io(_) => "io",
            Error::Parse(_) => "parse",
            Error::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(Error::InvalidArg("x".into()).kind(), "invalid_arg");
        assert_eq!(Error::NotFound("x".into()).kind(), "not_found");
        assert_eq!(Error::Exists("x".into()).kind(), "exists");
        assert_eq!(Error::Full("x".into()).kind(), "full");
        assert_eq!(Error::InvalidLevel("x".into()).kind(), "invalid_level");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), "io");
    }
}

//! Server-level configuration: transport settings layered on top of
//! [`memory_core::config::MemoryConfig`] — grounded on the teacher's
//! layering of `memory-cli/src/config.rs` (process config) over
//! `memory-core`'s domain config.

use serde::{Deserialize, Serialize};

use memory_core::config::MemoryConfig;

/// Transport + domain configuration for the `memory-server` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Domain config (arena sizes, HNSW params, ranking weights, ...).
    pub memory: MemoryConfig,
    /// HTTP listener port.
    pub port: u16,
    /// Per-request timeout, milliseconds (spec.md §5 default 10s).
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            port: 8080,
            request_timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    /// Load defaults, then overlay an optional TOML file, then overlay
    /// `MEMORY_`-prefixed environment variables. CLI flags are applied by
    /// the caller afterwards (highest precedence), per spec.md §6.
    ///
    /// # Errors
    /// Returns an error if `path` is given but unreadable or not valid TOML.
    pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("MEMORY_DATA_DIR") {
            self.memory.data_dir = v;
        }
        if let Ok(v) = std::env::var("MEMORY_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = std::env::var("MEMORY_EMIT_EVENTS") {
            self.memory.emit_events = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}

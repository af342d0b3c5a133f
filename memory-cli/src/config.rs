//! Config loading for the CLI — the same defaults-file-env layering as
//! `memory-server`, grounded on the teacher's `memory-cli/src/config.rs`.
//! CLI flags are applied by `main.rs` after [`load`], per spec.md §6.

use std::path::Path;

use memory_rpc::config::ServerConfig;

/// Load a [`ServerConfig`] from an optional TOML file plus `MEMORY_`-prefixed
/// environment variables.
///
/// # Errors
/// Returns an error if `path` is given but unreadable or not valid TOML.
pub fn load(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    ServerConfig::load(path)
}

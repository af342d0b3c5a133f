//! Append-only JSONL event log.
//!
//! Grounded on the teacher's `server/audit/core.rs` `AuditLogger`: a file
//! handle behind a mutex, one JSON object appended per event, synchronous
//! from the caller's point of view.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::Result;

/// One emitted event, matching the `events/memory/events.jsonl` schema
/// from spec.md §6.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// RFC 3339 timestamp.
    pub ts: String,
    /// Which component emitted this (e.g. `"rpc"`, `"hierarchy"`).
    pub component_id: String,
    /// Log level (`"info"`, `"warn"`, `"error"`).
    pub level: String,
    /// Event name, typically the RPC method invoked.
    pub event: String,
    /// Per-request correlation id.
    pub trace_id: String,
    /// Arbitrary structured payload.
    pub data: serde_json::Value,
}

/// Appends [`Event`]s to `events/memory/events.jsonl` under a data
/// directory, one JSON object per line.
pub struct EventEmitter {
    file_handle: Mutex<Option<File>>,
    path: PathBuf,
}

impl EventEmitter {
    /// Open (creating if absent) the event log under `data_dir`.
    ///
    /// # Errors
    /// Returns [`Error::Io`](crate::error::Error::Io) if the file or its
    /// parent directories cannot be created.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref().join("events/memory");
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("events.jsonl");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            file_handle: Mutex::new(Some(file)),
            path,
        })
    }

    /// An emitter that discards every event (`emit_events = false`).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            file_handle: Mutex::new(None),
            path: PathBuf::new(),
        }
    }

    /// The path this emitter appends to (empty for [`EventEmitter::disabled`]).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a single JSON line.
    ///
    /// # Errors
    /// Returns [`Error::Parse`](crate::error::Error::Parse) if `event`
    /// can't be serialized, or [`Error::Io`](crate::error::Error::Io) if
    /// the write fails.
    pub async fn emit(&self, event: &Event) -> Result<()> {
        let mut guard = self.file_handle.lock().await;
        let Some(file) = guard.as_mut() else {
            return Ok(());
        };
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn emit_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = EventEmitter::open(dir.path()).await.unwrap();
        emitter
            .emit(&Event {
                ts: "2026-01-01T00:00:00Z".to_string(),
                component_id: "rpc".to_string(),
                level: "info".to_string(),
                event: "store".to_string(),
                trace_id: "t-1".to_string(),
                data: json!({"ok": true}),
            })
            .await
            .unwrap();
        emitter
            .emit(&Event {
                ts: "2026-01-01T00:00:01Z".to_string(),
                component_id: "rpc".to_string(),
                level: "info".to_string(),
                event: "query".to_string(),
                trace_id: "t-2".to_string(),
                data: json!({}),
            })
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(emitter.path()).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "store");
    }

    #[tokio::test]
    async fn disabled_emitter_is_a_no_op() {
        let emitter = EventEmitter::disabled();
        let result = emitter
            .emit(&Event {
                ts: "2026-01-01T00:00:00Z".to_string(),
                component_id: "rpc".to_string(),
                level: "info".to_string(),
                event: "store".to_string(),
                trace_id: "t-1".to_string(),
                data: json!({}),
            })
            .await;
        assert!(result.is_ok());
    }
}

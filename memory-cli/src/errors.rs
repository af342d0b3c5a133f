//! Helpful-suggestion error context, grounded on the teacher's
//! `memory-cli/src/errors.rs` `EnhancedError` trait — trimmed to the
//! handful of error classes this CLI actually surfaces.

use anyhow::Result;
use colored::Colorize;

pub trait EnhancedError<T> {
    fn context_with_help(self, msg: &str, help: &[&str]) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> EnhancedError<T> for Result<T, E> {
    fn context_with_help(self, msg: &str, help: &[&str]) -> Result<T> {
        self.map_err(|e| {
            let mut message = format!("{}\n\n{e}", msg.red().bold());
            if !help.is_empty() {
                message.push_str(&format!("\n\n{}", "possible fixes:".yellow().bold()));
                for (i, h) in help.iter().enumerate() {
                    message.push_str(&format!("\n  {}. {h}", i + 1));
                }
            }
            anyhow::anyhow!(message)
        })
    }
}

pub mod helpers {
    pub const DATA_DIR_HELP: &[&str] = &[
        "pass --data-dir explicitly",
        "set MEMORY_DATA_DIR in the environment",
        "check that the directory is writable",
    ];

    pub const NODE_NOT_FOUND_HELP: &[&str] = &[
        "list sessions with 'memory-cli list-sessions' to find a valid id",
        "check the id was not typo'd",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enhanced_error_includes_help() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let enhanced = result.context_with_help("failed", &["try this"]);
        let message = enhanced.unwrap_err().to_string();
        assert!(message.contains("failed"));
        assert!(message.contains("try this"));
    }
}

//! Output formatting, grounded on the teacher's `memory-cli/src/output.rs`
//! `OutputFormat`/`Output` pair — trimmed to the one shape this CLI prints
//! (a `serde_json::Value` from a dispatched RPC call) instead of a trait
//! implemented per domain type.

use clap::ValueEnum;
use colored::Colorize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, lightly colored summary.
    Human,
    /// Pretty-printed JSON for scripting.
    Json,
    /// YAML.
    Yaml,
}

/// Print a successful RPC result in the requested format.
pub fn print_result(format: OutputFormat, value: &Value) {
    match format {
        OutputFormat::Human => print_human(value),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(value).unwrap_or_default());
        }
    }
}

/// Print an RPC error in the requested format.
pub fn print_error(format: OutputFormat, message: &str) {
    match format {
        OutputFormat::Human => eprintln!("{} {message}", "error:".red().bold()),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": message }));
        }
        OutputFormat::Yaml => {
            eprintln!("error: {message}");
        }
    }
}

fn print_human(value: &Value) {
    match value.as_object() {
        Some(map) => {
            for (key, v) in map {
                println!("{}: {}", key.bold(), human_scalar(v));
            }
        }
        None => println!("{value}"),
    }
}

fn human_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! `memory-cli` binary, grounded on the teacher's `memory-cli/src/main.rs`
//! shape (parse args, init tracing, load config, dispatch one subcommand)
//! trimmed to this spec's nine operations and single storage backend.

use std::path::PathBuf;

use clap::Parser;

use memory_cli::commands::{self, Command};
use memory_cli::output::{self, OutputFormat};
use memory_rpc::state::MemoryService;

#[derive(Parser)]
#[command(name = "memory-cli", about = "Client for the hierarchical memory store", version)]
struct Cli {
    /// TOML config file path.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Override the on-disk data directory.
    #[arg(long)]
    data_dir: Option<String>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let mut config = memory_cli::config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.memory.data_dir = data_dir;
    }

    let service = MemoryService::new(config).await?;

    match commands::run(&service, &cli.command).await {
        Ok(value) => {
            output::print_result(cli.format, &value);
            Ok(())
        }
        Err(message) => {
            output::print_error(cli.format, &message);
            std::process::exit(1);
        }
    }
}

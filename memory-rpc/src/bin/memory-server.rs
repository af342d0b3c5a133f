//! `memory-server` binary: loads configuration, opens the hierarchy, and
//! serves either stdio or HTTP JSON-RPC depending on `--stdio`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use memory_rpc::config::ServerConfig;
use memory_rpc::state::MemoryService;
use memory_rpc::{http, stdio};

#[derive(Debug, Parser)]
#[command(name = "memory-server", about = "Hierarchical memory JSON-RPC server")]
struct Cli {
    /// Path to a TOML config file. Defaults and `MEMORY_`-prefixed env vars
    /// still apply; CLI flags below take precedence over all of them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serve JSON-RPC over stdin/stdout instead of HTTP.
    #[arg(long)]
    stdio: bool,

    /// Override the HTTP listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the on-disk data directory.
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.memory.data_dir = data_dir;
    }

    tracing::info!(data_dir = %config.memory.data_dir, port = config.port, "starting memory-server");

    let service = MemoryService::new(config.clone()).await?;

    if cli.stdio {
        stdio::run(&service).await?;
    } else {
        let addr = format!("0.0.0.0:{}", config.port);
        http::serve(Arc::new(service), &addr).await?;
    }

    Ok(())
}

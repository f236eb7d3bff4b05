use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;

use forge_vfs::config::CliArgs;
use forge_vfs::server::ForgeServer;
use forge_vfs::session::MemoryProjectStore;
use forge_vfs::transport::NdjsonTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Logging goes to stderr; stdout carries the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let limits = args.limits();
    tracing::debug!(?limits, "session limits");

    let mut server = ForgeServer::new(
        NdjsonTransport::new(),
        limits,
        Arc::new(MemoryProjectStore::new()),
    );

    tracing::info!("forge-vfs ready");

    server.run(BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

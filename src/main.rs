// src/main.rs
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vaultform::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries JSON, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli).await
}

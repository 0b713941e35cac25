use anyhow::{Context, Result};
use clap::Parser;
use geocast_server::{Server, ServerConfig};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geocast-server")]
#[command(about = "WebRTC session relay and recording controller")]
struct Args {
    /// Path to a JSON config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let server = Server::new(config).await?;
    let app = server.router();

    // engine notifications arrive here; holding the sender keeps the
    // event loop alive for the lifetime of the process
    let _engine_events = server.relay_events();

    let addr = server.config.bind_addr.clone();
    info!("Geocast server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown({
            let server = server.clone();
            async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
                server.shutdown().await;
            }
        })
        .await?;

    Ok(())
}

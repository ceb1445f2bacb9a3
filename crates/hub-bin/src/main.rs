// ============================
// crates/hub-bin/src/main.rs
// ============================
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use palaver_hub_lib::{config::Settings, ws_router, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Palaver presence/relay hub
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a settings file (TOML/YAML/JSON, extension optional)
    #[arg(long)]
    config: Option<String>,

    /// Override the bind address from settings
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(settings));
    let app = ws_router::create_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "palaver hub listening");

    axum::serve(listener, app).await?;

    Ok(())
}

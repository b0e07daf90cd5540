//! AppShelf server binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use appshelf_server::config::AppConfig;
use appshelf_server::gallery::Gallery;
use appshelf_server::sandbox::ProcessSandbox;
use appshelf_server::session::{SessionHandle, SessionRegistry};
use appshelf_server::store::ArtifactStore;
use appshelf_server::{create_router, AppState};

#[derive(Parser)]
#[command(name = "appshelf-server")]
#[command(about = "Artifact gallery API with sandboxed previews")]
#[command(version)]
struct Args {
    /// Path to the configuration file (defaults to ./appshelf.toml if present)
    #[arg(long, env = "APPSHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Allow cross-origin requests from any origin
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("appshelf_server=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?
        .apply_env(|key| std::env::var(key).ok())
        .context("Invalid environment configuration")?;
    if args.dev {
        config.server.dev_mode = true;
    }

    // Default identity for in-process submissions; HTTP clients use their own sessions.
    let store = ArtifactStore::initialize(&config.repository, Arc::new(SessionHandle::new())).await;
    let status = store.status().await;
    if !status.initialized_remote {
        tracing::warn!(
            reason = status.fallback_reason.as_deref().unwrap_or("unknown"),
            "Running in demo mode: artifacts are kept in memory only"
        );
    }

    let sandbox = ProcessSandbox::new(config.sandbox.clone());
    tracing::info!(
        program = %sandbox.config().program,
        timeout_ms = sandbox.config().timeout_ms,
        "Preview sandbox configured"
    );

    let gallery = Gallery::new(Arc::new(store), Arc::new(sandbox));
    gallery.list_artifacts().await;

    let mut app = create_router(AppState::new(Arc::new(gallery), Arc::new(SessionRegistry::new())))
        .layer(TraceLayer::new_for_http());
    if config.server.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("AppShelf server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutting down...");
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blog_api::config::{self, StorageBackend};
use blog_api::database::{BlogStore, MemoryStore, PgStore};
use blog_api::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "blog-api", version, about = "Blog backend API server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "BLOG_API_PORT")]
    port: Option<u16>,

    /// Keep data in memory instead of Postgres
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    let config = config::config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();
    tracing::info!("Starting blog API in {:?} mode", config.environment);

    let storage = if args.memory {
        StorageBackend::Memory
    } else {
        config.database.storage
    };
    let store: Arc<dyn BlogStore> = match storage {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Postgres => Arc::new(PgStore::from_config(config)),
    };
    if let Err(e) = store.ensure_connected().await {
        tracing::warn!("{} store unavailable at startup, retrying on first request: {}", store.backend(), e);
    }

    let app = router(AppState::from_config(Arc::clone(&store), config), config);

    let port = args.port.unwrap_or(config.api.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Blog API listening on http://{} ({} store)", addr, store.backend());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

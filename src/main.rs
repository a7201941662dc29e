use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use canvasflow::{
    AppState, GeminiClient, MemoryStore, Pipeline, TableStore, Warehouse, build_router,
    config::AppConfig,
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Business canvas, hypothesis and experiment pipeline service.
#[derive(Debug, Parser)]
#[command(name = "canvasflow", version, about)]
struct Cli {
    /// Address to bind (overrides APP_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides APP_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Warehouse dataset (overrides WAREHOUSE_DATASET)
    #[arg(long)]
    dataset: Option<String>,

    /// Snapshot file for the store (overrides WAREHOUSE_SNAPSHOT)
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load application configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dataset) = cli.dataset {
        config.dataset = dataset;
    }
    if let Some(snapshot) = cli.snapshot {
        config.snapshot_path = Some(snapshot);
    }

    let store: Arc<dyn TableStore> = match &config.snapshot_path {
        Some(path) => {
            info!(path = %path.display(), "store: snapshot-backed");
            Arc::new(
                MemoryStore::open(path)
                    .with_context(|| format!("failed to open snapshot {}", path.display()))?,
            )
        }
        None => {
            info!("store: in-memory");
            Arc::new(MemoryStore::new())
        }
    };

    let warehouse =
        Warehouse::new(store, config.dataset.as_str()).with_schema_policy(config.schema_policy);
    let model = GeminiClient::new(config.gemini()).context("failed to build model client")?;
    let pipeline = Pipeline::new(Arc::new(model), warehouse);

    let app = build_router(AppState::new(pipeline));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        address = %addr,
        dataset = %config.dataset,
        model = %config.gemini_model,
        policy = ?config.schema_policy,
        "canvasflow started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("canvasflow=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
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
}

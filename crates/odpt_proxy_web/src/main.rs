use std::sync::Arc;

use anyhow::Context;
use axum::{middleware, routing::get, Router};
use include_dir::{include_dir, Dir};
use odpt_proxy_core::{DatasetRegistry, OdptClient};
use tokio::net::TcpListener;

mod config;
mod cors;
mod error;
mod handlers;
mod query;

use config::ProxyConfig;

static DATASET_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/../../assets");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = ProxyConfig::from_env();
    tracing::info!(?config, "starting odpt proxy");
    let state = AppState::from_config(&config)?;
    if !state.client.has_consumer_key() {
        tracing::warn!("no ODPT consumer key configured; upstream requests are unauthenticated");
    }
    tracing::info!(operators = ?state.datasets.operator_names(), "bus stop datasets available");

    let app = router(state);
    let listener = TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    tracing::info!("listening on {}", config.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    client: OdptClient,
    datasets: Arc<DatasetRegistry>,
}

impl AppState {
    pub fn new(client: OdptClient, datasets: DatasetRegistry) -> Self {
        Self {
            client,
            datasets: Arc::new(datasets),
        }
    }

    fn from_config(config: &ProxyConfig) -> anyhow::Result<Self> {
        let client = OdptClient::new(
            config.api_base_url.clone(),
            config.consumer_key.clone(),
            config.timeout,
        )
        .context("build ODPT client")?;
        Ok(Self::new(client, dataset_registry(config)))
    }
}

fn dataset_registry(config: &ProxyConfig) -> DatasetRegistry {
    let registry = config
        .dataset_dirs
        .iter()
        .fold(DatasetRegistry::new(), |registry, dir| {
            registry.with_search_dir(dir.clone())
        });
    DATASET_DIR.files().fold(registry, |registry, file| {
        match file.path().file_name().and_then(|name| name.to_str()) {
            Some(name) => registry.with_embedded_file(name, file.contents()),
            None => registry,
        }
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/version", get(handlers::version))
        .route("/operators", get(handlers::operators))
        .route("/location/busvehicle", get(handlers::bus_vehicle_location))
        .route("/busstoppole", get(handlers::busstop_pole))
        .layer(middleware::from_fn(cors::cors))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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
    tracing::info!("shutting down");
}

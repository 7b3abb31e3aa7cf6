// sce-node/src/main.rs

//! `sce-node` binary.
//!
//! Stands in for the "external caller" spec.md §1 names (the UTXO engine,
//! P2P stack, and RPC layer are non-goals and not reimplemented here). It
//! embeds an [`sce::Engine`] over a pair of SQLite-backed stores and
//! exposes:
//!
//! - `POST /transactions` — admits a carrier tx's payload to the payload
//!   mempool (L9), the moral equivalent of `sendRawTransactionWithMessage`.
//! - `GET /accounts/:address/state` — `Engine::get_user_state`.
//! - `GET /health`
//! - `GET /metrics` (a separate Prometheus exporter, on its own port).
//!
//! A background task drains a queue of connected/disconnected blocks and
//! drives `Engine::index_block` / `Engine::rollback`; in a full deployment
//! that queue is fed by the host chain's block-connect notification, a
//! non-goal collaborator this crate does not implement.

mod config;
mod routes;
mod state;

use std::sync::atomic::AtomicI32;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tokio::sync::mpsc;

use sce::SceConfig;
use sce::metrics::{MetricsRegistry, run_prometheus_http_server};
use sce::storage::sqlite::{SqlitePayloadStore, SqliteRatingStore};

use config::ApiConfig;
use routes::{accounts, health, transactions};
use state::{AppState, SharedState, run_block_consumer};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "sce_node=info,sce=info".to_string()))
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::default();
    let sce_cfg = SceConfig::default();

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if sce_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = sce_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                eprintln!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Storage + embedded engine
    // ---------------------------

    if let Some(parent) = sce_cfg.storage.main_db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("failed to create data directory: {e}"))?;
    }

    let payload_store = SqlitePayloadStore::open(&sce_cfg.storage.main_db_path)
        .map_err(|e| format!("failed to open payload store at {:?}: {e}", sce_cfg.storage.main_db_path))?;
    let rating_store = SqliteRatingStore::open(&sce_cfg.storage.web_db_path)
        .map_err(|e| format!("failed to open rating store at {:?}: {e}", sce_cfg.storage.web_db_path))?;

    let engine = Arc::new(Mutex::new(sce::Engine::new(sce_cfg.clone(), payload_store, rating_store)));

    // ---------------------------
    // Shared state
    // ---------------------------

    let (block_tx, block_rx) = mpsc::unbounded_channel();
    let app_state: SharedState = Arc::new(AppState {
        engine,
        tip_height: AtomicI32::new(0),
        metrics: metrics.clone(),
        block_jobs: block_tx,
    });

    // ---------------------------
    // Background block-indexing loop
    // ---------------------------

    {
        let app_state = app_state.clone();
        tokio::spawn(async move {
            run_block_consumer(app_state, block_rx).await;
        });
    }

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/transactions", post(transactions::submit_transaction))
        .route("/accounts/{address}/state", get(accounts::get_user_state))
        .with_state(app_state);

    tracing::info!("sce-node listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("sce-node HTTP server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

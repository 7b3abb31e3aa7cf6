//! Shared application state, the embedded engine's async wiring, and the
//! background block-indexing loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use sce::engine::post_processor::PayloadSource;
use sce::storage::sqlite::{SqlitePayloadStore, SqliteRatingStore};
use sce::types::block::BlockContext;
use sce::types::payload::Payload;
use sce::types::{Height, TxHash};
use sce::Engine;
use sce::metrics::MetricsRegistry;

/// Concrete engine type this binary embeds: durable SQLite-backed Payload
/// and Rating Stores, matching spec.md §6's "two attached SQLite-style
/// databases".
pub type NodeEngine = Engine<SqlitePayloadStore, SqliteRatingStore>;

/// A unit of work for the background block-indexing loop (spec.md §2's
/// control flow for block connection/disconnection). In a full deployment
/// this channel is fed by the host chain's block-connected/disconnected
/// notification, a non-goal collaborator this crate does not implement;
/// tests and operators drive it directly via [`AppState::enqueue_block`] /
/// [`AppState::enqueue_rollback`].
pub enum BlockJob {
    Index(Box<BlockContext>),
    Rollback(Height),
}

/// Resolves payloads for a block's carrier transactions from a snapshot of
/// whatever was sitting in the engine's payload mempool (L9) when indexing
/// started, the same role the teacher's `QueuedTxPool` plays for
/// transactions. A carrier tx whose payload never reached this node's
/// mempool resolves to `None`, which the post-processor counts as
/// `unresolved` rather than a hard error (spec.md §4.8 step 2).
struct MempoolSnapshotSource(HashMap<TxHash, Payload>);

impl PayloadSource for MempoolSnapshotSource {
    fn resolve(&self, tx_hash: &TxHash) -> Option<Payload> {
        self.0.get(tx_hash).cloned()
    }
}

/// Shared state held by the API and the background block-indexing task.
///
/// `engine` is wrapped in a plain [`std::sync::Mutex`] rather than
/// `tokio::sync::Mutex`: the engine itself is synchronous top to bottom
/// (spec.md §5: "no await/cooperative yield exists in the SCE"), so every
/// access happens inside `spawn_blocking`, never while holding an `.await`
/// point, which is exactly what a sync mutex requires.
pub struct AppState {
    pub engine: Arc<Mutex<NodeEngine>>,
    /// Current chain tip height, advanced by the block-indexing loop and
    /// read by the mempool-admission path to resolve per-day rate limits
    /// and account mode (spec.md §4.5/§4.6 both key off "current height").
    pub tip_height: AtomicI32,
    pub metrics: Arc<MetricsRegistry>,
    pub block_jobs: mpsc::UnboundedSender<BlockJob>,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Enqueues a connected block for the background indexing loop.
    pub fn enqueue_block(&self, block: BlockContext) {
        let _ = self.block_jobs.send(BlockJob::Index(Box::new(block)));
    }

    /// Enqueues a disconnection down to (and including) `to_height`.
    pub fn enqueue_rollback(&self, to_height: Height) {
        let _ = self.block_jobs.send(BlockJob::Rollback(to_height));
    }
}

/// Background consumer draining `rx` and driving the embedded engine
/// (spec.md §2's block-connect/disconnect control flow, §5's "one
/// block-connect thread... observes a quiescent chain"). Takes the same
/// `Arc<AppState>` the HTTP handlers share, so the tip height it advances
/// is immediately visible to the mempool-admission path.
pub async fn run_block_consumer(state: SharedState, mut rx: mpsc::UnboundedReceiver<BlockJob>) {
    while let Some(job) = rx.recv().await {
        let engine = state.engine.clone();
        let metrics = state.metrics.clone();
        let state = state.clone();

        let result = tokio::task::spawn_blocking(move || match job {
            BlockJob::Index(block) => {
                let start = std::time::Instant::now();
                let mut guard = engine.lock().expect("engine mutex poisoned");
                let snapshot: HashMap<TxHash, Payload> =
                    guard.mempool().rows().map(|r| (r.tx_hash, r.payload.clone())).collect();
                let source = MempoolSnapshotSource(snapshot);
                let report = guard.index_block(&block, &source);
                metrics.engine.block_index_seconds.observe(start.elapsed().as_secs_f64());
                if let Ok(ref report) = report {
                    state.tip_height.store(report.height, Ordering::SeqCst);
                    metrics.engine.mempool_depth.set(guard.mempool().len() as i64);
                }
                report.map(|r| format!("indexed height {} ({} txs)", r.height, r.indexed))
            }
            BlockJob::Rollback(to_height) => {
                let start = std::time::Instant::now();
                let mut guard = engine.lock().expect("engine mutex poisoned");
                let result = guard.rollback(to_height);
                metrics.engine.rollback_seconds.observe(start.elapsed().as_secs_f64());
                if result.is_ok() {
                    state.tip_height.store(to_height, Ordering::SeqCst);
                }
                result.map(|_| format!("rolled back to height {to_height}"))
            }
        })
        .await;

        match result {
            Ok(Ok(msg)) => tracing::info!("{msg}"),
            Ok(Err(e)) => tracing::warn!(error = %e, "block job failed"),
            Err(e) => tracing::error!(error = %e, "block job task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sce::types::payload::{AccountPayload, Payload};
    use sce::types::Hash256;

    fn dummy_user(addr: &str) -> Payload {
        Payload::User(AccountPayload {
            address: sce::types::Address::from(addr),
            name: "alice".into(),
            avatar: String::new(),
            about: String::new(),
            lang: "en".into(),
            url: String::new(),
            donations: String::new(),
            pubkey: String::new(),
            referrer: None,
        })
    }

    #[test]
    fn mempool_snapshot_source_resolves_known_tx_and_none_for_unknown() {
        let tx_hash = TxHash(Hash256::sha256(b"tx-a"));
        let other = TxHash(Hash256::sha256(b"tx-b"));
        let mut snapshot = HashMap::new();
        snapshot.insert(tx_hash, dummy_user("ADDR_A"));
        let source = MempoolSnapshotSource(snapshot);

        assert_eq!(source.resolve(&tx_hash), Some(dummy_user("ADDR_A")));
        assert_eq!(source.resolve(&other), None);
    }

    #[tokio::test]
    async fn enqueue_block_and_rollback_reach_the_consumer_channel() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let state = AppState {
            engine: Arc::new(Mutex::new(test_engine(&dir))),
            tip_height: AtomicI32::new(0),
            metrics: Arc::new(MetricsRegistry::new().expect("metrics registry")),
            block_jobs: tx,
        };

        state.enqueue_rollback(7);
        match rx.recv().await.expect("job enqueued") {
            BlockJob::Rollback(height) => assert_eq!(height, 7),
            BlockJob::Index(_) => panic!("expected a rollback job"),
        }
    }

    fn test_engine(dir: &tempfile::TempDir) -> NodeEngine {
        let payload_store = SqlitePayloadStore::open(&dir.path().join("main.sqlite3")).expect("open payload store");
        let rating_store = SqliteRatingStore::open(&dir.path().join("web.sqlite3")).expect("open rating store");
        Engine::new(sce::SceConfig::default(), payload_store, rating_store)
    }
}

//! Prometheus-backed metrics and HTTP exporter for the Social Consensus
//! Engine, adapted from the teacher's ML-watermark metrics module: same
//! registry/exporter shape, SCE-specific series.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Engine-level Prometheus metrics: block indexing/rollback latency,
/// per-code rejection counts, lottery payouts, mempool depth.
#[derive(Clone)]
pub struct EngineMetrics {
    /// Latency of `Engine::index_block`, in seconds.
    pub block_index_seconds: Histogram,
    /// Latency of `Engine::rollback`, in seconds.
    pub rollback_seconds: Histogram,
    /// Rejections by `SocialConsensusResult` variant name.
    pub rejections_total: IntCounterVec,
    /// Number of reward recipients selected by the last lottery run.
    pub lottery_winners_total: IntCounter,
    /// Current number of payloads sitting in the payload mempool (L9).
    pub mempool_depth: IntGauge,
}

impl EngineMetrics {
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let block_index_seconds = Histogram::with_opts(
            HistogramOpts::new("sce_block_index_seconds", "Time to index a connected block (L6) in seconds")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(block_index_seconds.clone()))?;

        let rollback_seconds = Histogram::with_opts(
            HistogramOpts::new("sce_rollback_seconds", "Time to roll back a disconnected block in seconds")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(rollback_seconds.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("sce_rejections_total", "Rejections by SocialConsensusResult variant"),
            &["code"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let lottery_winners_total = IntCounter::with_opts(Opts::new(
            "sce_lottery_winners_total",
            "Total reward recipients selected across all lottery runs",
        ))?;
        registry.register(Box::new(lottery_winners_total.clone()))?;

        let mempool_depth = IntGauge::with_opts(Opts::new(
            "sce_mempool_depth",
            "Current number of payloads held in the payload mempool",
        ))?;
        registry.register(Box::new(mempool_depth.clone()))?;

        Ok(Self {
            block_index_seconds,
            rollback_seconds,
            rejections_total,
            lottery_winners_total,
            mempool_depth,
        })
    }
}

/// Owns a Prometheus registry and the engine metrics; clone and share via
/// `Arc` across threads.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub engine: EngineMetrics,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("sce".to_string()), None)?;
        let engine = EngineMetrics::register(&registry)?;
        Ok(Self { registry, engine })
    }

    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Serves `GET /metrics` on `addr`; all other paths return 404.
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!(%err, "metrics HTTP connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn engine_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = EngineMetrics::register(&registry).expect("register metrics");

        metrics.block_index_seconds.observe(0.01);
        metrics.rollback_seconds.observe(0.02);
        metrics.rejections_total.with_label_values(&["SelfScore"]).inc();
        metrics.lottery_winners_total.inc_by(25);
        metrics.mempool_depth.set(3);

        let families = registry.gather();
        assert!(!families.is_empty());
    }

    #[test]
    fn metrics_registry_gather_text_contains_series_name() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        registry.engine.block_index_seconds.observe(0.01);
        let text = registry.gather_text();
        assert!(text.contains("sce_block_index_seconds"));
    }
}

//! Prometheus metrics, following the teacher's `MetricsRegistry` shape.

pub mod prometheus;

pub use self::prometheus::{EngineMetrics, MetricsRegistry, run_prometheus_http_server};

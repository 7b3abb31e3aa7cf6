//! Configuration structs, following the teacher repo's per-concern
//! sub-config + `Default` convention.

use crate::types::Network;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Where the two attached SQLite databases and the read-only checkpoints
/// file live on disk (spec.md §6).
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub main_db_path: PathBuf,
    pub web_db_path: PathBuf,
    pub checkpoints_db_path: PathBuf,
    pub network: Network,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            main_db_path: PathBuf::from("data/main.sqlite3"),
            web_db_path: PathBuf::from("data/web.sqlite3"),
            checkpoints_db_path: PathBuf::from("checkpoints/main.sqlite3"),
            network: Network::Main,
        }
    }
}

/// Payload mempool bounds (spec.md §4.11).
#[derive(Clone, Copy, Debug)]
pub struct MempoolConfig {
    pub max_payloads: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self { max_payloads: 50_000 }
    }
}

/// Prometheus exporter configuration, mirroring the teacher's
/// `MetricsConfig`.
#[derive(Clone, Copy, Debug)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "127.0.0.1:9899".parse().unwrap(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default)]
pub struct SceConfig {
    pub storage: StorageConfig,
    pub mempool: MempoolConfig,
    pub metrics: MetricsConfig,
}

//! `sce-node` configuration.
//!
//! For now this only configures the HTTP listen address and the on-disk
//! paths the embedded engine opens; everything else comes from
//! `sce::SceConfig::default()`.

use std::net::SocketAddr;

/// Configuration for the node's HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the transaction/account-state HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // Safe to unwrap: fixed, valid address literal.
        let addr: SocketAddr = "0.0.0.0:8082"
            .parse()
            .expect("hard-coded API listen address should parse");
        Self { listen_addr: addr }
    }
}

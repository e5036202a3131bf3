//! Server configuration and startup.

use crate::routes;
use crate::state::AppState;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
/// Default request body limit (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Reads `BTLENS_BIND_ADDR` and `BTLENS_MAX_UPLOAD_BYTES`.
    ///
    /// # Errors
    /// Returns an error message when either value does not parse.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let bind_addr = match env::var("BTLENS_BIND_ADDR") {
            Ok(addr) => addr
                .parse()
                .map_err(|e| format!("BTLENS_BIND_ADDR {addr}: {e}"))?,
            Err(_) => defaults.bind_addr,
        };
        let max_upload_bytes = match env::var("BTLENS_MAX_UPLOAD_BYTES") {
            Ok(limit) => limit
                .parse()
                .map_err(|e| format!("BTLENS_MAX_UPLOAD_BYTES {limit}: {e}"))?,
            Err(_) => defaults.max_upload_bytes,
        };
        Ok(Self {
            bind_addr,
            max_upload_bytes,
        })
    }
}

/// HTTP server.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Binds and serves until the process is stopped.
    ///
    /// # Errors
    /// Returns an I/O error if the address cannot be bound.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %listener.local_addr()?, "Listening");
        let app = routes::router(self.state, self.config.max_upload_bytes);
        axum::serve(listener, app).await
    }
}

//! HTTP server for browsing processed documents.

pub mod routes;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::PdfHarvestError;
use crate::store::Database;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub download_dir: PathBuf,
}

pub struct WebServer {
    config: Config,
    state: AppState,
}

impl WebServer {
    pub fn new(db: Database, config: Config) -> Self {
        let state = AppState {
            db,
            download_dir: PathBuf::from(&config.download_dir),
        };
        Self { config, state }
    }

    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", get(routes::index))
            .route("/download/:filename", get(routes::download))
            .route("/api/documents", get(routes::api_documents))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    pub async fn start(self) -> Result<(), PdfHarvestError> {
        let addr = resolve_addr(&self.config.server.host, self.config.server.port)?;

        let router = self.build_router();

        tracing::info!("Serving document viewer on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| PdfHarvestError::Web(format!("failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| PdfHarvestError::Web(format!("server error: {}", e)))?;

        Ok(())
    }
}

/// Resolves the configured host, which may be an IP or a hostname like
/// `localhost`, to a bindable address.
fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr, PdfHarvestError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| PdfHarvestError::Web(format!("invalid address '{}:{}': {}", host, port, e)))?
        .next()
        .ok_or_else(|| {
            PdfHarvestError::Web(format!("address '{}:{}' resolved to nothing", host, port))
        })
}

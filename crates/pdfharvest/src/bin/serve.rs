//! Serves the document viewer over HTTP.

use pdfharvest::store::Database;
use pdfharvest::web::WebServer;
use pdfharvest::{config, logging};

#[tokio::main]
async fn main() {
    logging::init();

    let config = match config::load_config(config::CONFIG_FILENAME) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let db = match Database::open(&config.database_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            std::process::exit(1);
        }
    };

    if let Err(e) = WebServer::new(db, config).start().await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}

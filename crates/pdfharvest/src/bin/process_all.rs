//! Processes every downloaded PDF and stores the results.

use pdfharvest::pipeline::Pipeline;
use pdfharvest::store::{self, error_repo, Database};
use pdfharvest::{config, logging};

fn main() {
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

    let pipeline = Pipeline::new(db.clone(), &config);
    let run = match pipeline.run() {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!(error = %e, "Processing run failed");
            std::process::exit(1);
        }
    };

    println!(
        "Processed {} PDF(s), {} failed, {} skipped",
        run.processed, run.failed, run.skipped
    );

    match store::stats(&db) {
        Ok(totals) => println!(
            "Store now holds {} document(s): {} processed, {} failed, {} pending",
            totals.total, totals.processed, totals.failed, totals.pending
        ),
        Err(e) => tracing::warn!(error = %e, "Could not read store totals"),
    }

    match error_repo::count(&db) {
        Ok(n) if n > 0 => println!("{} error(s) in the error log", n),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Could not read error log count"),
    }

    if run.failed > 0 {
        std::process::exit(1);
    }
}

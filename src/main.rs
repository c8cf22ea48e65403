//! This file defines the projection-server binary entry point.

use projection_server::app;
use projection_server::cli;
use projection_server::metrics;
use projection_server::server;
use projection_server::tracing;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing();
    ::tracing::debug!("{:?}", args);
    metrics::register_metrics();
    let service = app::service(&args);
    server::serve(&args, service).await;
}

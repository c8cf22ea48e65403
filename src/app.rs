//! HTTP routes and handlers.

use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::error::ProjectionServerError;
use crate::json_body::JsonBody;
use crate::metrics;
use crate::models::{Catalog, ProjectionKey, Receipt, ResolvedProjection};

use axum::{
    body::BoxBody,
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::task;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Service type returned by [service].
pub type Service = NormalizePath<Router>;

/// Returns a [Router] serving the given state.
pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/projections", get(projections))
        .route("/data/:dataset/:projection", get(data))
        .route("/submit", post(submit))
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .on_request(metrics::request_counter)
                .on_response(metrics::record_response_metrics::<BoxBody>),
        )
}

/// Wrap a [Router] so that trailing slashes are ignored.
pub fn normalize(router: Router) -> Service {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Returns the service to serve, configured from command line arguments.
pub fn service(args: &CommandLineArgs) -> Service {
    normalize(router(Arc::new(AppState::new(args))))
}

/// List every dataset and its projections.
async fn projections(
    State(state): State<SharedAppState>,
) -> Result<Json<Catalog>, ProjectionServerError> {
    let catalog = task::spawn_blocking(move || state.catalog.list_projections()).await??;
    Ok(Json(catalog))
}

/// Resolve a single projection.
async fn data(
    State(state): State<SharedAppState>,
    Path(key): Path<ProjectionKey>,
) -> Result<Json<ResolvedProjection>, ProjectionServerError> {
    let resolved =
        task::spawn_blocking(move || state.resolver.resolve(&key.dataset, &key.projection))
            .await??;
    Ok(Json(resolved.document))
}

/// Forward a study result to the mail collaborator.
async fn submit(
    State(state): State<SharedAppState>,
    JsonBody(document): JsonBody<Value>,
) -> Result<Json<Receipt>, ProjectionServerError> {
    let receipt = state.submitter.submit(&document).await?;
    Ok(Json(receipt))
}

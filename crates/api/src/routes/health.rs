//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use store::Store;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health: "ok" while the store answers, 503 otherwise.
pub async fn check<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.catalog.list_categories().await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}

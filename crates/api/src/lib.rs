//! HTTP API server with observability for the restaurant system.
//!
//! Provides JSON endpoints for the catalog, order capture and the order
//! listing, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::dashboard::home::<S>))
        .route("/health", get(routes::health::check::<S>))
        .route("/categories", get(routes::categories::list::<S>))
        .route("/categories/new", post(routes::categories::create::<S>))
        .route("/categories/{id}/edit", post(routes::categories::update::<S>))
        .route(
            "/categories/{id}/delete",
            post(routes::categories::delete::<S>),
        )
        .route("/products", get(routes::products::list::<S>))
        .route("/products/new", post(routes::products::create::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}/edit", post(routes::products::update::<S>))
        .route(
            "/products/{id}/delete",
            get(routes::products::confirm_delete::<S>).post(routes::products::delete::<S>),
        )
        .route("/orders", get(routes::orders::list::<S>))
        .route(
            "/orders/new",
            get(routes::orders::new_form::<S>).post(routes::orders::create::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/orders/{id}/edit",
            get(routes::orders::edit_form::<S>).post(routes::orders::update::<S>),
        )
        .route(
            "/orders/{id}/status",
            post(routes::orders::change_status::<S>),
        )
        .route("/orders/{id}/delete", post(routes::orders::delete::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store.
pub fn create_state<S: Store + Clone + 'static>(
    store: S,
    currency: impl Into<String>,
) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, currency))
}

//! Home page summary.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::OrderStatus;
use serde::Serialize;
use store::Store;

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub categories: usize,
    pub products: usize,
    pub active_products: usize,
    pub orders: usize,
    pub orders_by_status: Vec<StatusCount>,
}

#[derive(Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub label: &'static str,
    pub count: usize,
}

/// GET /: catalog size and orders per status.
#[tracing::instrument(skip(state))]
pub async fn home<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let categories = state.catalog.list_categories().await?.len();
    let products = state.catalog.list_products(false).await?;
    let orders_by_status: Vec<StatusCount> = state
        .orders
        .status_counts()
        .await?
        .into_iter()
        .map(|(status, count)| StatusCount {
            status,
            label: status.label(),
            count,
        })
        .collect();

    Ok(Json(DashboardResponse {
        categories,
        active_products: products.iter().filter(|p| p.active).count(),
        products: products.len(),
        orders: orders_by_status.iter().map(|s| s.count).sum(),
        orders_by_status,
    }))
}

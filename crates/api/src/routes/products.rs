//! Product maintenance endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CategoryId, Money, Product, ProductId};
use domain::{ProductDeletion, ProductForm};
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use super::categories::MessageResponse;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ProductListParams {
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub price: Money,
    pub active: bool,
    pub label: String,
}

impl ProductResponse {
    pub fn new(product: Product, currency: &str) -> Self {
        Self {
            label: product.label(currency),
            id: product.id,
            name: product.name,
            category_id: product.category_id,
            price: product.price,
            active: product.active,
        }
    }
}

#[derive(Serialize)]
pub struct ProductSavedResponse {
    pub product: ProductResponse,
    pub message: String,
}

#[derive(Serialize)]
pub struct DeleteConfirmationResponse {
    pub product: ProductResponse,
    pub line_item_count: u64,
    pub can_delete: bool,
}

/// GET /products: all products, or only active ones with `?active=true`.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .catalog
        .list_products(params.active.unwrap_or(false))
        .await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductResponse::new(p, &state.currency))
            .collect(),
    ))
}

/// POST /products/new
#[tracing::instrument(skip(state, form))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<ProductSavedResponse>), ApiError> {
    let product = state
        .catalog
        .create_product(&form)
        .await
        .map_err(|e| ApiError::from(e).with_form(&form))?;

    Ok((
        StatusCode::CREATED,
        Json(ProductSavedResponse {
            product: ProductResponse::new(product, &state.currency),
            message: "Product created successfully".to_string(),
        }),
    ))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get_product(ProductId::new(id)).await?;
    Ok(Json(ProductResponse::new(product, &state.currency)))
}

/// POST /products/{id}/edit
#[tracing::instrument(skip(state, form))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(form): Json<ProductForm>,
) -> Result<Json<ProductSavedResponse>, ApiError> {
    let product = state
        .catalog
        .update_product(ProductId::new(id), &form)
        .await
        .map_err(|e| ApiError::from(e).with_form(&form))?;

    Ok(Json(ProductSavedResponse {
        product: ProductResponse::new(product, &state.currency),
        message: "Product updated successfully".to_string(),
    }))
}

/// GET /products/{id}/delete: what deleting the product would affect.
#[tracing::instrument(skip(state))]
pub async fn confirm_delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteConfirmationResponse>, ApiError> {
    let deletion: ProductDeletion = state
        .catalog
        .delete_confirmation(ProductId::new(id))
        .await?;

    Ok(Json(DeleteConfirmationResponse {
        can_delete: deletion.can_delete(),
        line_item_count: deletion.line_item_count,
        product: ProductResponse::new(deletion.product, &state.currency),
    }))
}

/// POST /products/{id}/delete: refused while order line items use it.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.catalog.delete_product(ProductId::new(id)).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted".to_string(),
    }))
}

//! Category maintenance endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Category, CategoryId};
use domain::CategoryForm;
use serde::Serialize;
use store::Store;

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CategoryResponse {
    pub category: Category,
    pub message: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /categories: all categories by name.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.catalog.list_categories().await?))
}

/// POST /categories/new
#[tracing::instrument(skip(state, form))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = state
        .catalog
        .create_category(&form)
        .await
        .map_err(|e| ApiError::from(e).with_form(&form))?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            category,
            message: "Category created successfully".to_string(),
        }),
    ))
}

/// POST /categories/{id}/edit
#[tracing::instrument(skip(state, form))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .catalog
        .update_category(CategoryId::new(id), &form)
        .await
        .map_err(|e| ApiError::from(e).with_form(&form))?;

    Ok(Json(CategoryResponse {
        category,
        message: "Category updated successfully".to_string(),
    }))
}

/// POST /categories/{id}/delete: refused while products belong to it.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.catalog.delete_category(CategoryId::new(id)).await?;
    Ok(Json(MessageResponse {
        message: "Category deleted".to_string(),
    }))
}

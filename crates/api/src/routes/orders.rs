//! Order capture, detail, listing and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use common::{LineItem, LineItemId, Money, Order, OrderId, OrderStatus, OrderType, ProductId};
use domain::{OrderForm, OrderReceipt, StatusFilter};
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use super::categories::MessageResponse;
use super::products::ProductResponse;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub new_status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub type_label: &'static str,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub items: Vec<LineItemResponse>,
    pub total: Money,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub label: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            label: item.label(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            title: order.title(),
            total: order.total(),
            items: order.items.iter().map(LineItemResponse::from).collect(),
            id: order.id,
            created_at: order.created_at,
            order_type: order.order_type,
            type_label: order.order_type.label(),
            status: order.status,
            status_label: order.status.label(),
            table_number: order.table_number,
            customer_name: order.customer_name,
        }
    }
}

#[derive(Serialize)]
pub struct OrderFormResponse {
    pub form: OrderForm,
    pub products: Vec<ProductResponse>,
}

#[derive(Serialize)]
pub struct OrderSavedResponse {
    pub order_id: OrderId,
    pub total: Money,
    pub item_count: usize,
    pub message: String,
}

impl OrderSavedResponse {
    fn new(receipt: OrderReceipt, currency: &str) -> Self {
        Self {
            message: receipt.notice(currency),
            order_id: receipt.order_id,
            total: receipt.total,
            item_count: receipt.item_count,
        }
    }
}

#[derive(Serialize)]
pub struct OrderListResponse {
    pub filter: StatusFilter,
    pub statuses: Vec<StatusChoice>,
    pub count: usize,
    pub revenue: Money,
    pub orders: Vec<OrderResponse>,
}

#[derive(Serialize)]
pub struct StatusChoice {
    pub code: &'static str,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct StatusChangedResponse {
    pub status: OrderStatus,
    pub message: String,
}

// -- Handlers --

/// GET /orders/new: a blank form and the products that can be ordered.
#[tracing::instrument(skip(state))]
pub async fn new_form<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<OrderFormResponse>, ApiError> {
    form_response(&state, OrderForm::blank()).await
}

/// POST /orders/new: runs the submission workflow.
#[tracing::instrument(skip(state, form))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(form): Json<OrderForm>,
) -> Result<Response, ApiError> {
    let receipt = state
        .orders
        .submit(&form)
        .await
        .map_err(|e| ApiError::from(e).with_form(&form))?;

    let location = format!("/orders/{}", receipt.order_id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(OrderSavedResponse::new(receipt, &state.currency)),
    )
        .into_response())
}

/// GET /orders: newest first, filtered by `?status=` (default `ALL`).
#[tracing::instrument(skip(state, params))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let filter: StatusFilter = params
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|e: common::ParseChoiceError| ApiError::BadRequest(e.to_string()))?;

    let listing = state.orders.list(filter).await?;

    Ok(Json(OrderListResponse {
        filter: listing.filter,
        statuses: OrderStatus::ALL
            .into_iter()
            .map(|s| StatusChoice {
                code: s.as_str(),
                label: s.label(),
            })
            .collect(),
        count: listing.count,
        revenue: listing.revenue,
        orders: listing.orders.into_iter().map(OrderResponse::from).collect(),
    }))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get(OrderId::new(id)).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// GET /orders/{id}/edit: the stored order as a pre-filled form.
#[tracing::instrument(skip(state))]
pub async fn edit_form<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderFormResponse>, ApiError> {
    let form = state.orders.edit_form(OrderId::new(id)).await?;
    form_response(&state, form).await
}

/// POST /orders/{id}/edit: the submission workflow against a stored order.
#[tracing::instrument(skip(state, form))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(form): Json<OrderForm>,
) -> Result<Json<OrderSavedResponse>, ApiError> {
    let receipt = state
        .orders
        .resubmit(OrderId::new(id), &form)
        .await
        .map_err(|e| ApiError::from(e).with_form(&form))?;

    Ok(Json(OrderSavedResponse::new(receipt, &state.currency)))
}

/// POST /orders/{id}/status: only `DELIVERED` and `CANCELLED` are accepted.
#[tracing::instrument(skip(state, req))]
pub async fn change_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusChangedResponse>, ApiError> {
    let requested = req.new_status.unwrap_or_default();
    let status = state
        .orders
        .change_status(OrderId::new(id), &requested)
        .await?;

    Ok(Json(StatusChangedResponse {
        status,
        message: format!("Status updated to {}", status.label()),
    }))
}

/// POST /orders/{id}/delete: removes the order and its line items.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let order_id = OrderId::new(id);
    state.orders.delete(order_id).await?;
    Ok(Json(MessageResponse {
        message: format!("Order #{order_id} deleted"),
    }))
}

async fn form_response<S: Store + Clone + 'static>(
    state: &AppState<S>,
    form: OrderForm,
) -> Result<Json<OrderFormResponse>, ApiError> {
    let products = state
        .orders
        .product_picker()
        .await?
        .into_iter()
        .map(|p| ProductResponse::new(p, &state.currency))
        .collect();

    Ok(Json(OrderFormResponse { form, products }))
}

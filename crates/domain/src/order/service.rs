//! Order service: submission workflow, status transitions and reporting.

use std::collections::BTreeSet;
use std::time::Instant;

use common::{Money, Order, OrderId, OrderStatus, Product, ProductId};
use serde::Serialize;
use store::{OrderQuery, OrderWrite, ProductQuery, Store, StoreError};

use super::forms::OrderForm;
use super::listing::{OrderListing, StatusFilter};
use super::validation::{
    LineItemContext, MUST_ADD_PRODUCT, ValidationErrors, validate_header, validate_line_items,
};
use super::OrderError;
use crate::error::DomainError;

/// Outcome of a committed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub total: Money,
    pub item_count: usize,

    /// True for a new order, false for an edit.
    pub created: bool,
}

impl OrderReceipt {
    /// The confirmation shown to staff, e.g.
    /// `"Order #12 created successfully. Total: 31.00 Bs"`.
    pub fn notice(&self, currency: &str) -> String {
        let verb = if self.created { "created" } else { "updated" };
        format!(
            "Order #{} {verb} successfully. Total: {} {currency}",
            self.order_id, self.total
        )
    }
}

/// Service for taking and managing orders.
///
/// Validates submitted forms and writes each order with its line items as a
/// single atomic store write.
#[derive(Debug, Clone)]
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Products offered for new line items: active ones only.
    pub async fn product_picker(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products(ProductQuery::active_only()).await?)
    }

    /// Validates and stores a new order.
    #[tracing::instrument(skip(self, form), fields(rows = form.items.len()))]
    pub async fn submit(&self, form: &OrderForm) -> Result<OrderReceipt, DomainError> {
        self.run_submission(None, form).await
    }

    /// Validates and stores changes to an existing order.
    ///
    /// The header is replaced and the creation time kept. Rows carrying an id
    /// update that line item, rows without one are inserted, and rows marked
    /// for deletion remove their line item.
    #[tracing::instrument(skip(self, form), fields(rows = form.items.len()))]
    pub async fn resubmit(
        &self,
        order_id: OrderId,
        form: &OrderForm,
    ) -> Result<OrderReceipt, DomainError> {
        self.run_submission(Some(order_id), form).await
    }

    async fn run_submission(
        &self,
        order_id: Option<OrderId>,
        form: &OrderForm,
    ) -> Result<OrderReceipt, DomainError> {
        let start = Instant::now();

        let existing = match order_id {
            Some(id) => Some(self.get(id).await?),
            None => None,
        };

        let result = self.validate_and_write(existing.as_ref(), form).await;
        metrics::histogram!("order_submission_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(receipt) => {
                metrics::counter!("orders_submitted_total").increment(1);
                tracing::info!(
                    order_id = %receipt.order_id,
                    total = %receipt.total,
                    created = receipt.created,
                    "order committed"
                );
            }
            Err(DomainError::Order(err)) => {
                metrics::counter!("orders_rejected_total", "reason" => err.reason()).increment(1);
                tracing::warn!(reason = err.reason(), "order submission rejected");
            }
            Err(_) => {}
        }

        result
    }

    async fn validate_and_write(
        &self,
        existing: Option<&Order>,
        form: &OrderForm,
    ) -> Result<OrderReceipt, DomainError> {
        let product_ids: Vec<ProductId> = form
            .items
            .iter()
            .filter(|row| !row.delete)
            .filter_map(|row| row.product)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let products = self
            .store
            .get_products(&product_ids)
            .await
            .map_err(save_failed)?;

        let mut context = LineItemContext::new(products);
        if let Some(order) = existing {
            context = context.with_existing(order.items.iter().map(|item| item.id));
        }

        let header = validate_header(&form.header);
        let lines = validate_line_items(&form.items, &context);

        let (header, lines) = match (header, lines) {
            (Ok(header), Ok(lines)) => (header, lines),
            (header, lines) => {
                let mut errors = lines.err().unwrap_or_else(|| ValidationErrors {
                    rows: vec![Default::default(); form.items.len()],
                    ..Default::default()
                });
                if let Err(header_errors) = header {
                    errors.header = header_errors;
                }
                return Err(OrderError::Invalid(Box::new(errors)).into());
            }
        };

        let write = match existing {
            Some(order) => OrderWrite::update(order.id, header, lines.items, lines.deletions),
            None => OrderWrite::create(header, lines.items),
        };

        let order_id = match self.store.write_order(write).await {
            Ok(id) => id,
            Err(StoreError::EmptyOrder(_)) => {
                return Err(OrderError::Invalid(Box::new(ValidationErrors::collection(
                    MUST_ADD_PRODUCT,
                )))
                .into());
            }
            Err(e) => return Err(save_failed(e)),
        };

        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        Ok(OrderReceipt {
            order_id,
            total: order.total(),
            item_count: order.item_count(),
            created: existing.is_none(),
        })
    }

    /// Applies a status requested by staff.
    ///
    /// Only `DELIVERED` and `CANCELLED` can be requested; anything else is
    /// rejected without touching the order.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        order_id: OrderId,
        requested: &str,
    ) -> Result<OrderStatus, DomainError> {
        let order = self.get(order_id).await?;

        let status = match requested.parse::<OrderStatus>() {
            Ok(status) if status.is_requestable() => status,
            _ => {
                tracing::warn!(%order_id, requested, "invalid status requested");
                return Err(OrderError::InvalidStatus(requested.to_string()).into());
            }
        };

        self.store.update_order_status(order_id, status).await?;

        metrics::counter!("order_status_changes_total", "status" => status.as_str()).increment(1);
        tracing::info!(%order_id, from = %order.status, to = %status, "order status changed");

        Ok(status)
    }

    /// Loads an order with its line items.
    pub async fn get(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id).into())
    }

    /// The stored order as a pre-filled form.
    pub async fn edit_form(&self, order_id: OrderId) -> Result<OrderForm, DomainError> {
        let order = self.get(order_id).await?;
        Ok(OrderForm::from_order(&order))
    }

    /// Deletes an order together with its line items.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, order_id: OrderId) -> Result<(), DomainError> {
        match self.store.delete_order(order_id).await {
            Ok(()) => {
                tracing::info!(%order_id, "order deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(OrderError::NotFound(order_id).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists orders newest first, restricted to the filter.
    pub async fn list(&self, filter: StatusFilter) -> Result<OrderListing, DomainError> {
        let query = match filter.status() {
            Some(status) => OrderQuery::for_status(status),
            None => OrderQuery::new(),
        };
        let orders = self.store.query_orders(query).await?;
        Ok(OrderListing::new(filter, orders))
    }

    /// Number of orders in each status, in lifecycle order.
    pub async fn status_counts(&self) -> Result<Vec<(OrderStatus, usize)>, DomainError> {
        let orders = self.store.query_orders(OrderQuery::new()).await?;
        Ok(OrderStatus::ALL
            .into_iter()
            .map(|status| {
                let count = orders.iter().filter(|o| o.status == status).count();
                (status, count)
            })
            .collect())
    }
}

fn save_failed(err: StoreError) -> DomainError {
    tracing::error!(error = %err, "order write failed");
    OrderError::SaveFailed.into()
}

use std::collections::HashSet;

use async_trait::async_trait;
use common::{
    Category, CategoryDraft, CategoryId, LineItemDraft, LineItemId, Order, OrderHeader, OrderId,
    OrderStatus, Product, ProductDraft, ProductId,
};

use crate::{OrderQuery, ProductQuery, Result, StoreError};

/// Everything one order submission writes, applied as a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWrite {
    /// The order being edited, or `None` to create a new one.
    pub order_id: Option<OrderId>,

    /// Header fields to store.
    pub header: OrderHeader,

    /// Line items to insert (no id) or update (with id).
    pub items: Vec<LineItemDraft>,

    /// Existing line items to remove.
    pub deletions: Vec<LineItemId>,
}

impl OrderWrite {
    /// Creates a write for a new order.
    pub fn create(header: OrderHeader, items: Vec<LineItemDraft>) -> Self {
        Self {
            order_id: None,
            header,
            items,
            deletions: Vec::new(),
        }
    }

    /// Creates a write against an existing order.
    pub fn update(
        order_id: OrderId,
        header: OrderHeader,
        items: Vec<LineItemDraft>,
        deletions: Vec<LineItemId>,
    ) -> Self {
        Self {
            order_id: Some(order_id),
            header,
            items,
            deletions,
        }
    }
}

/// Core trait for storage backends.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Lists all categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Gets a category by id.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Finds a category by exact name.
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Inserts a category. Fails with `DuplicateName` if the name is taken.
    async fn insert_category(&self, draft: CategoryDraft) -> Result<Category>;

    /// Replaces a category's fields.
    async fn update_category(&self, id: CategoryId, draft: CategoryDraft) -> Result<Category>;

    /// Deletes a category. Fails with `Referenced` while products use it.
    async fn delete_category(&self, id: CategoryId) -> Result<()>;

    /// Lists products matching a query, ordered by name.
    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>>;

    /// Gets a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Gets every product whose id is in `ids`. Unknown ids are skipped.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Inserts a product.
    async fn insert_product(&self, draft: ProductDraft) -> Result<Product>;

    /// Replaces a product's fields.
    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> Result<Product>;

    /// Deletes a product. Fails with `Referenced` while line items use it.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// Counts the line items that reference a product.
    async fn count_line_items_for_product(&self, id: ProductId) -> Result<u64>;

    /// Applies an [`OrderWrite`] atomically.
    ///
    /// Either the header, every item and every deletion are stored, or
    /// nothing is. The write is rolled back with `EmptyOrder` if the order
    /// would end up with no line items. Returns the order id.
    async fn write_order(&self, write: OrderWrite) -> Result<OrderId>;

    /// Loads an order with its line items.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders with their line items, newest first.
    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>>;

    /// Sets an order's status as a single-field update.
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()>;

    /// Deletes an order together with its line items.
    async fn delete_order(&self, id: OrderId) -> Result<()>;
}

/// Checks an [`OrderWrite`] before it reaches a backend.
pub fn validate_order_write(write: &OrderWrite) -> Result<()> {
    if write.items.is_empty() {
        return Err(StoreError::EmptyOrder(write.order_id));
    }

    if let Some(item) = write.items.iter().find(|i| i.quantity == 0) {
        return Err(StoreError::InvalidRow(format!(
            "line item for product {} has zero quantity",
            item.product_id
        )));
    }

    if write.order_id.is_none()
        && (write.items.iter().any(|i| i.id.is_some()) || !write.deletions.is_empty())
    {
        return Err(StoreError::InvalidRow(
            "a new order cannot reference existing line items".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for id in write.items.iter().filter_map(|i| i.id) {
        if !seen.insert(id) || write.deletions.contains(&id) {
            return Err(StoreError::InvalidRow(format!(
                "line item {id} is written more than once"
            )));
        }
    }

    Ok(())
}

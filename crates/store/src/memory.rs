use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    Category, CategoryDraft, CategoryId, LineItem, LineItemId, Money, Order, OrderHeader, OrderId,
    OrderStatus, Product, ProductDraft, ProductId,
};
use tokio::sync::RwLock;

use crate::{
    OrderQuery, ProductQuery, Result, StoreError,
    store::{OrderWrite, Store, validate_order_write},
};

#[derive(Debug, Clone)]
struct OrderRow {
    id: OrderId,
    created_at: DateTime<Utc>,
    header: OrderHeader,
}

#[derive(Debug, Clone)]
struct LineItemRow {
    id: LineItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: u32,
    unit_price: Money,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    category: i64,
    product: i64,
    order: i64,
    line_item: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, OrderRow>,
    line_items: BTreeMap<LineItemId, LineItemRow>,
    seq: Sequences,
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| c.name == name && Some(c.id) != except)
    }

    fn build_order(&self, row: &OrderRow) -> Order {
        let items = self
            .line_items
            .values()
            .filter(|li| li.order_id == row.id)
            .map(|li| LineItem {
                id: li.id,
                order_id: li.order_id,
                product_id: li.product_id,
                product_name: self
                    .products
                    .get(&li.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                quantity: li.quantity,
                unit_price: li.unit_price,
            })
            .collect();

        Order {
            id: row.id,
            created_at: row.created_at,
            order_type: row.header.order_type,
            status: row.header.status,
            table_number: row.header.table_number.clone(),
            customer_name: row.header.customer_name.clone(),
            items,
        }
    }

    /// Applies a write to this (staged) copy of the tables.
    fn apply_order_write(&mut self, write: OrderWrite, inject_failure: bool) -> Result<OrderId> {
        let order_id = match write.order_id {
            Some(id) => {
                let row = self
                    .orders
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::not_found("order", id))?;
                row.header = write.header;
                id
            }
            None => {
                let id = OrderId::new(next(&mut self.seq.order));
                self.orders.insert(
                    id,
                    OrderRow {
                        id,
                        created_at: Utc::now(),
                        header: write.header,
                    },
                );
                id
            }
        };

        for (index, item) in write.items.into_iter().enumerate() {
            if inject_failure && index == 1 {
                return Err(StoreError::Unavailable("injected write failure".to_string()));
            }

            if !self.products.contains_key(&item.product_id) {
                return Err(StoreError::not_found("product", item.product_id));
            }

            match item.id {
                Some(line_id) => {
                    let row = self
                        .line_items
                        .get_mut(&line_id)
                        .filter(|li| li.order_id == order_id)
                        .ok_or_else(|| StoreError::not_found("line item", line_id))?;
                    row.product_id = item.product_id;
                    row.quantity = item.quantity;
                    row.unit_price = item.unit_price;
                }
                None => {
                    let id = LineItemId::new(next(&mut self.seq.line_item));
                    self.line_items.insert(
                        id,
                        LineItemRow {
                            id,
                            order_id,
                            product_id: item.product_id,
                            quantity: item.quantity,
                            unit_price: item.unit_price,
                        },
                    );
                }
            }
        }

        for line_id in write.deletions {
            if self
                .line_items
                .get(&line_id)
                .is_some_and(|li| li.order_id == order_id)
            {
                self.line_items.remove(&line_id);
            }
        }

        let remaining = self
            .line_items
            .values()
            .filter(|li| li.order_id == order_id)
            .count();
        if remaining == 0 {
            return Err(StoreError::EmptyOrder(write.order_id));
        }

        Ok(order_id)
    }
}

/// In-memory store implementation for testing.
///
/// Provides the same interface and referential rules as the PostgreSQL
/// implementation. Order writes are staged on a copy of the tables and only
/// swapped in once every step succeeded.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    fail_next_write: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next [`Store::write_order`] fail part-way through, after the
    /// header and the first line item have been staged.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the total number of line items stored.
    pub async fn line_item_count(&self) -> usize {
        self.tables.read().await.line_items.len()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<_> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.name == name).cloned())
    }

    async fn insert_category(&self, draft: CategoryDraft) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&draft.name, None) {
            return Err(StoreError::DuplicateName(draft.name));
        }
        let id = CategoryId::new(next(&mut tables.seq.category));
        let category = Category {
            id,
            name: draft.name,
            description: draft.description,
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: CategoryId, draft: CategoryDraft) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&draft.name, Some(id)) {
            return Err(StoreError::DuplicateName(draft.name));
        }
        let category = tables
            .categories
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("category", id))?;
        category.name = draft.name;
        category.description = draft.description;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(StoreError::not_found("category", id));
        }
        if tables.products.values().any(|p| p.category_id == id) {
            return Err(StoreError::Referenced {
                entity: "category",
                id: id.as_i64(),
                referenced_by: "products",
            });
        }
        tables.categories.remove(&id);
        Ok(())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<_> = tables
            .products
            .values()
            .filter(|p| query.active.is_none_or(|active| p.active == active))
            .filter(|p| query.category_id.is_none_or(|c| p.category_id == c))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert_product(&self, draft: ProductDraft) -> Result<Product> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&draft.category_id) {
            return Err(StoreError::not_found("category", draft.category_id));
        }
        let id = ProductId::new(next(&mut tables.seq.product));
        let product = Product {
            id,
            name: draft.name,
            category_id: draft.category_id,
            price: draft.price,
            active: draft.active,
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> Result<Product> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&draft.category_id) {
            return Err(StoreError::not_found("category", draft.category_id));
        }
        let product = tables
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        product.name = draft.name;
        product.category_id = draft.category_id;
        product.price = draft.price;
        product.active = draft.active;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Err(StoreError::not_found("product", id));
        }
        if tables.line_items.values().any(|li| li.product_id == id) {
            return Err(StoreError::Referenced {
                entity: "product",
                id: id.as_i64(),
                referenced_by: "order line items",
            });
        }
        tables.products.remove(&id);
        Ok(())
    }

    async fn count_line_items_for_product(&self, id: ProductId) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .line_items
            .values()
            .filter(|li| li.product_id == id)
            .count() as u64)
    }

    async fn write_order(&self, write: OrderWrite) -> Result<OrderId> {
        validate_order_write(&write)?;

        let inject_failure = self.fail_next_write.swap(false, Ordering::SeqCst);
        let mut tables = self.tables.write().await;

        // Stage on a copy so a failure anywhere leaves the tables untouched.
        let mut staged = tables.clone();
        let order_id = staged.apply_order_write(write, inject_failure)?;
        *tables = staged;

        Ok(order_id)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).map(|row| tables.build_order(row)))
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .orders
            .values()
            .filter(|row| query.status.is_none_or(|s| row.header.status == s))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|row| tables.build_order(row))
            .collect())
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let mut tables = self.tables.write().await;
        let row = tables
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("order", id))?;
        row.header.status = status;
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.orders.remove(&id).is_none() {
            return Err(StoreError::not_found("order", id));
        }
        tables.line_items.retain(|_, li| li.order_id != id);
        Ok(())
    }
}

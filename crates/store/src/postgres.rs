use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    Category, CategoryDraft, CategoryId, LineItem, LineItemId, Money, Order, OrderId,
    OrderStatus, Product, ProductDraft, ProductId,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    OrderQuery, ProductQuery, Result, StoreError,
    store::{OrderWrite, Store, validate_order_write},
};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// Maps a constraint violation to the matching store error.
fn map_constraint(
    err: sqlx::Error,
    on_violation: impl FnOnce(&str) -> Option<StoreError>,
) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && let Some(constraint) = db_err.constraint()
        && let Some(mapped) = on_violation(constraint)
    {
        return mapped;
    }
    StoreError::Database(err)
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            category_id: CategoryId::new(row.try_get("category_id")?),
            price: Money::from_decimal(row.try_get::<Decimal, _>("price")?),
            active: row.try_get("active")?,
        })
    }

    fn row_to_line_item(row: PgRow) -> Result<LineItem> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(LineItem {
            id: LineItemId::new(row.try_get("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::InvalidRow(format!("negative quantity {quantity}")))?,
            unit_price: Money::from_decimal(row.try_get::<Decimal, _>("unit_price")?),
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let order_type: String = row.try_get("order_type")?;
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            order_type: order_type
                .parse()
                .map_err(|e: common::ParseChoiceError| StoreError::InvalidRow(e.to_string()))?,
            status: status
                .parse()
                .map_err(|e: common::ParseChoiceError| StoreError::InvalidRow(e.to_string()))?,
            table_number: row.try_get("table_number")?,
            customer_name: row.try_get("customer_name")?,
            items: Vec::new(),
        })
    }

    /// Loads the line items of the given orders and attaches them.
    async fn attach_items(&self, mut orders: Vec<Order>) -> Result<Vec<Order>> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let rows = sqlx::query(
            r#"
            SELECT li.id, li.order_id, li.product_id, p.name AS product_name, li.quantity, li.unit_price
            FROM order_line_items li
            JOIN products p ON p.id = li.product_id
            WHERE li.order_id = ANY($1)
            ORDER BY li.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<LineItem>> = HashMap::new();
        for row in rows {
            let item = Self::row_to_line_item(row)?;
            by_order.entry(item.order_id).or_default().push(item);
        }
        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn apply_order_write(
        tx: &mut Transaction<'_, Postgres>,
        write: OrderWrite,
    ) -> Result<OrderId> {
        let header = &write.header;

        let order_id = match write.order_id {
            Some(id) => {
                // created_at is left untouched on edit
                let updated = sqlx::query(
                    r#"
                    UPDATE orders
                    SET order_type = $2, status = $3, table_number = $4, customer_name = $5
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_i64())
                .bind(header.order_type.as_str())
                .bind(header.status.as_str())
                .bind(&header.table_number)
                .bind(&header.customer_name)
                .execute(&mut **tx)
                .await?;

                if updated.rows_affected() == 0 {
                    return Err(StoreError::not_found("order", id));
                }
                id
            }
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO orders (order_type, status, table_number, customer_name)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(header.order_type.as_str())
                .bind(header.status.as_str())
                .bind(&header.table_number)
                .bind(&header.customer_name)
                .fetch_one(&mut **tx)
                .await?;
                OrderId::new(id)
            }
        };

        for item in &write.items {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                StoreError::InvalidRow(format!("quantity {} too large", item.quantity))
            })?;

            let result = match item.id {
                Some(line_id) => sqlx::query(
                    r#"
                    UPDATE order_line_items
                    SET product_id = $3, quantity = $4, unit_price = $5
                    WHERE id = $1 AND order_id = $2
                    "#,
                )
                .bind(line_id.as_i64())
                .bind(order_id.as_i64())
                .bind(item.product_id.as_i64())
                .bind(quantity)
                .bind(item.unit_price.amount())
                .execute(&mut **tx)
                .await
                .map(|r| (r.rows_affected(), Some(line_id))),
                None => sqlx::query(
                    r#"
                    INSERT INTO order_line_items (order_id, product_id, quantity, unit_price)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(order_id.as_i64())
                .bind(item.product_id.as_i64())
                .bind(quantity)
                .bind(item.unit_price.amount())
                .execute(&mut **tx)
                .await
                .map(|r| (r.rows_affected(), None)),
            };

            let (affected, line_id) = result.map_err(|e| {
                map_constraint(e, |constraint| {
                    (constraint == "fk_line_items_product")
                        .then(|| StoreError::not_found("product", item.product_id))
                })
            })?;

            if let Some(line_id) = line_id
                && affected == 0
            {
                return Err(StoreError::not_found("line item", line_id));
            }
        }

        if !write.deletions.is_empty() {
            let ids: Vec<i64> = write.deletions.iter().map(|id| id.as_i64()).collect();
            sqlx::query("DELETE FROM order_line_items WHERE order_id = $1 AND id = ANY($2)")
                .bind(order_id.as_i64())
                .bind(&ids)
                .execute(&mut **tx)
                .await?;
        }

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_line_items WHERE order_id = $1")
                .bind(order_id.as_i64())
                .fetch_one(&mut **tx)
                .await?;

        if remaining == 0 {
            return Err(StoreError::EmptyOrder(write.order_id));
        }

        Ok(order_id)
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_category).collect()
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_category)
            .transpose()
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        sqlx::query("SELECT id, name, description FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_category)
            .transpose()
    }

    async fn insert_category(&self, draft: CategoryDraft) -> Result<Category> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_constraint(e, |constraint| {
                (constraint == "unique_category_name")
                    .then(|| StoreError::DuplicateName(draft.name.clone()))
            })
        })?;

        Self::row_to_category(row)
    }

    async fn update_category(&self, id: CategoryId, draft: CategoryDraft) -> Result<Category> {
        let row = sqlx::query(
            r#"
            UPDATE categories SET name = $2, description = $3
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(id.as_i64())
        .bind(&draft.name)
        .bind(&draft.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_constraint(e, |constraint| {
                (constraint == "unique_category_name")
                    .then(|| StoreError::DuplicateName(draft.name.clone()))
            })
        })?
        .ok_or_else(|| StoreError::not_found("category", id))?;

        Self::row_to_category(row)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_constraint(e, |constraint| {
                    (constraint == "fk_products_category").then(|| StoreError::Referenced {
                        entity: "category",
                        id: id.as_i64(),
                        referenced_by: "products",
                    })
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("category", id));
        }
        Ok(())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category_id, price, active
            FROM products
            WHERE ($1::BOOLEAN IS NULL OR active = $1)
              AND ($2::BIGINT IS NULL OR category_id = $2)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(query.active)
        .bind(query.category_id.map(|c| c.as_i64()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        sqlx::query("SELECT id, name, category_id, price, active FROM products WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_product)
            .transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let rows = sqlx::query(
            "SELECT id, name, category_id, price, active FROM products WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn insert_product(&self, draft: ProductDraft) -> Result<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, category_id, price, active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, category_id, price, active
            "#,
        )
        .bind(&draft.name)
        .bind(draft.category_id.as_i64())
        .bind(draft.price.amount())
        .bind(draft.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_constraint(e, |constraint| {
                (constraint == "fk_products_category")
                    .then(|| StoreError::not_found("category", draft.category_id))
            })
        })?;

        Self::row_to_product(row)
    }

    async fn update_product(&self, id: ProductId, draft: ProductDraft) -> Result<Product> {
        let row = sqlx::query(
            r#"
            UPDATE products SET name = $2, category_id = $3, price = $4, active = $5
            WHERE id = $1
            RETURNING id, name, category_id, price, active
            "#,
        )
        .bind(id.as_i64())
        .bind(&draft.name)
        .bind(draft.category_id.as_i64())
        .bind(draft.price.amount())
        .bind(draft.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_constraint(e, |constraint| {
                (constraint == "fk_products_category")
                    .then(|| StoreError::not_found("category", draft.category_id))
            })
        })?
        .ok_or_else(|| StoreError::not_found("product", id))?;

        Self::row_to_product(row)
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_constraint(e, |constraint| {
                    (constraint == "fk_line_items_product").then(|| StoreError::Referenced {
                        entity: "product",
                        id: id.as_i64(),
                        referenced_by: "order line items",
                    })
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        Ok(())
    }

    async fn count_line_items_for_product(&self, id: ProductId) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_line_items WHERE product_id = $1")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }

    async fn write_order(&self, write: OrderWrite) -> Result<OrderId> {
        validate_order_write(&write)?;

        // Dropping the transaction without commit rolls everything back.
        let mut tx = self.pool.begin().await?;
        let order_id = Self::apply_order_write(&mut tx, write).await?;
        tx.commit().await?;

        tracing::debug!(%order_id, "order write committed");

        Ok(order_id)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, created_at, order_type, status, table_number, customer_name
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let order = Self::row_to_order(row)?;
                Ok(self.attach_items(vec![order]).await?.pop())
            }
            None => Ok(None),
        }
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, created_at, order_type, status, table_number, customer_name
            FROM orders
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.limit.map(|l| l as i64))
        .bind(query.offset.unwrap_or(0) as i64)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        self.attach_items(orders).await
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", id));
        }
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", id));
        }
        Ok(())
    }
}

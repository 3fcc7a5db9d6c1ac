//! Catalog and order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CategoryId, LineItemId, Money, OrderId, ProductId};

/// A value that is not one of the allowed choices of an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {field}")]
pub struct ParseChoiceError {
    pub field: &'static str,
    pub value: String,
}

/// How the order is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Served at a table.
    #[default]
    InStore,

    /// Packed for the customer to take away.
    Takeaway,
}

impl OrderType {
    pub const ALL: [OrderType; 2] = [OrderType::InStore, OrderType::Takeaway];

    /// Returns the stored code.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::InStore => "IN_STORE",
            OrderType::Takeaway => "TAKEAWAY",
        }
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            OrderType::InStore => "In store",
            OrderType::Takeaway => "Takeaway",
        }
    }

    /// Returns true if a table number is meaningful for this order type.
    pub fn uses_table(&self) -> bool {
        matches!(self, OrderType::InStore)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderType {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| ParseChoiceError {
                field: "order type",
                value: s.to_string(),
            })
    }
}

/// The status of an order in its lifecycle.
///
/// ```text
/// Pending ──► Preparing ──► Delivered
///    │            │
///    └────────────┴──► Cancelled
/// ```
///
/// Staff may only move an order to `Delivered` or `Cancelled` from the order
/// list; `Pending` and `Preparing` are set through the order form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order taken, not started.
    #[default]
    Pending,

    /// Kitchen is working on it.
    Preparing,

    /// Handed to the customer.
    Delivered,

    /// Order was cancelled.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if staff may request this status directly.
    pub fn is_requestable(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the stored code.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| ParseChoiceError {
                field: "order status",
                value: s.to_string(),
            })
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Validated fields for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub price: Money,
    pub active: bool,
}

impl Product {
    /// Picker label, e.g. `"Soup (15.50 Bs)"`.
    pub fn label(&self, currency: &str) -> String {
        format!("{} ({} {})", self.name, self.price, currency)
    }
}

/// Validated fields for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub category_id: CategoryId,
    pub price: Money,
    pub active: bool,
}

/// The non-line-item fields of an order, after validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderHeader {
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
}

/// A persisted customer order with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub items: Vec<LineItem>,
}

impl Order {
    /// Sum of all line-item subtotals.
    pub fn total(&self) -> Money {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Display title, e.g. `"Order #12 - 2026-10-18 13:05"`.
    pub fn title(&self) -> String {
        format!(
            "Order #{} - {}",
            self.id,
            self.created_at.format("%Y-%m-%d %H:%M")
        )
    }
}

/// One product-quantity-price row of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    /// `quantity × unit_price`.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Display label, e.g. `"2 x Soup"`.
    pub fn label(&self) -> String {
        format!("{} x {}", self.quantity, self.product_name)
    }
}

/// A validated line item ready to be written.
///
/// `id` is set when the row updates a line item that already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemDraft {
    pub id: Option<LineItemId>,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItemDraft {
    /// `quantity × unit_price`.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(quantity: u32, cents: i64) -> LineItem {
        LineItem {
            id: LineItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            product_name: "Soup".to_string(),
            quantity,
            unit_price: Money::from_cents(cents),
        }
    }

    #[test]
    fn order_type_codes_roundtrip() {
        for t in OrderType::ALL {
            assert_eq!(t.as_str().parse::<OrderType>().unwrap(), t);
        }
        assert!("MESA".parse::<OrderType>().is_err());
    }

    #[test]
    fn order_status_codes_roundtrip() {
        for st in OrderStatus::ALL {
            assert_eq!(st.as_str().parse::<OrderStatus>().unwrap(), st);
        }
        let err = "DONE".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "'DONE' is not a valid order status");
    }

    #[test]
    fn only_delivered_and_cancelled_are_requestable() {
        assert!(!OrderStatus::Pending.is_requestable());
        assert!(!OrderStatus::Preparing.is_requestable());
        assert!(OrderStatus::Delivered.is_requestable());
        assert!(OrderStatus::Cancelled.is_requestable());
    }

    #[test]
    fn defaults_match_new_order_form() {
        assert_eq!(OrderType::default(), OrderType::InStore);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn enums_serialize_as_codes() {
        assert_eq!(
            serde_json::to_string(&OrderType::Takeaway).unwrap(),
            "\"TAKEAWAY\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
    }

    #[test]
    fn order_total_sums_subtotals() {
        let order = Order {
            id: OrderId::new(12),
            created_at: Utc.with_ymd_and_hms(2026, 10, 18, 13, 5, 0).unwrap(),
            order_type: OrderType::InStore,
            status: OrderStatus::Pending,
            table_number: Some("5".to_string()),
            customer_name: None,
            items: vec![item(2, 1550), item(1, 300)],
        };
        assert_eq!(order.total(), Money::from_cents(3400));
        assert_eq!(order.title(), "Order #12 - 2026-10-18 13:05");
        assert_eq!(order.items[0].label(), "2 x Soup");
    }

    #[test]
    fn product_label_includes_price() {
        let product = Product {
            id: ProductId::new(1),
            name: "Soup".to_string(),
            category_id: CategoryId::new(1),
            price: Money::from_cents(1550),
            active: true,
        };
        assert_eq!(product.label("Bs"), "Soup (15.50 Bs)");
    }
}

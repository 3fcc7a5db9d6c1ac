//! Raw order form input, as submitted by staff.
//!
//! Every field is optional and untyped enough to carry whatever was typed in,
//! so a rejected submission can be echoed back unchanged.

use common::{LineItemId, Order, OrderStatus, OrderType, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The order header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderForm {
    /// `IN_STORE` or `TAKEAWAY`; defaults to `IN_STORE` when absent.
    #[serde(rename = "type", default)]
    pub order_type: Option<String>,

    /// One of the status codes; defaults to `PENDING` when absent.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub table_number: Option<String>,

    #[serde(default)]
    pub customer_name: Option<String>,
}

/// One line-item row of the order form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemForm {
    /// Set when the row edits a line item that already exists.
    #[serde(default)]
    pub id: Option<LineItemId>,

    #[serde(default)]
    pub product: Option<ProductId>,

    #[serde(default)]
    pub quantity: Option<i64>,

    #[serde(default)]
    pub unit_price: Option<Decimal>,

    /// Marks the row for removal.
    #[serde(default)]
    pub delete: bool,
}

impl LineItemForm {
    /// A row for a product with the given quantity and no price override.
    pub fn for_product(product: ProductId, quantity: i64) -> Self {
        Self {
            product: Some(product),
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    /// Returns true if nothing was entered in the row.
    pub fn is_blank(&self) -> bool {
        self.product.is_none() && self.quantity.is_none() && self.unit_price.is_none()
    }
}

/// A complete order form: header plus line-item rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderForm {
    #[serde(flatten)]
    pub header: HeaderForm,

    #[serde(default)]
    pub items: Vec<LineItemForm>,
}

impl OrderForm {
    /// Number of empty rows offered for new line items.
    pub const EXTRA_ROWS: usize = 1;

    /// The form shown for a new order: default header and one empty row.
    pub fn blank() -> Self {
        Self {
            header: HeaderForm {
                order_type: Some(OrderType::default().as_str().to_string()),
                status: Some(OrderStatus::default().as_str().to_string()),
                table_number: None,
                customer_name: None,
            },
            items: vec![LineItemForm::default(); Self::EXTRA_ROWS],
        }
    }

    /// The form for editing a stored order, one row per line item plus an
    /// empty row.
    pub fn from_order(order: &Order) -> Self {
        let mut items: Vec<LineItemForm> = order
            .items
            .iter()
            .map(|item| LineItemForm {
                id: Some(item.id),
                product: Some(item.product_id),
                quantity: Some(i64::from(item.quantity)),
                unit_price: Some(item.unit_price.amount()),
                delete: false,
            })
            .collect();
        items.extend(std::iter::repeat_n(LineItemForm::default(), Self::EXTRA_ROWS));

        Self {
            header: HeaderForm {
                order_type: Some(order.order_type.as_str().to_string()),
                status: Some(order.status.as_str().to_string()),
                table_number: order.table_number.clone(),
                customer_name: order.customer_name.clone(),
            },
            items,
        }
    }

    /// Sets the order type code.
    pub fn order_type(mut self, order_type: OrderType) -> Self {
        self.header.order_type = Some(order_type.as_str().to_string());
        self
    }

    /// Sets the table number.
    pub fn table(mut self, table_number: impl Into<String>) -> Self {
        self.header.table_number = Some(table_number.into());
        self
    }

    /// Sets the customer name.
    pub fn customer(mut self, customer_name: impl Into<String>) -> Self {
        self.header.customer_name = Some(customer_name.into());
        self
    }

    /// Appends a row.
    pub fn item(mut self, row: LineItemForm) -> Self {
        self.items.push(row);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{LineItem, Money, OrderId};

    #[test]
    fn blank_form_has_defaults_and_one_empty_row() {
        let form = OrderForm::blank();
        assert_eq!(form.header.order_type.as_deref(), Some("IN_STORE"));
        assert_eq!(form.header.status.as_deref(), Some("PENDING"));
        assert_eq!(form.items.len(), 1);
        assert!(form.items[0].is_blank());
    }

    #[test]
    fn deserializes_flat_json() {
        let form: OrderForm = serde_json::from_value(serde_json::json!({
            "type": "TAKEAWAY",
            "table_number": "5",
            "items": [
                { "product": 1, "quantity": 2, "unit_price": "0" },
                { "quantity": 3 },
                { "id": 4, "product": 1, "quantity": 1, "delete": true }
            ]
        }))
        .unwrap();

        assert_eq!(form.header.order_type.as_deref(), Some("TAKEAWAY"));
        assert_eq!(form.header.status, None);
        assert_eq!(form.items.len(), 3);
        assert_eq!(form.items[0].product, Some(ProductId::new(1)));
        assert_eq!(form.items[1].product, None);
        assert!(form.items[2].delete);
        assert_eq!(form.items[2].id, Some(LineItemId::new(4)));
    }

    #[test]
    fn from_order_prefills_rows() {
        let order = Order {
            id: OrderId::new(3),
            created_at: Utc::now(),
            order_type: OrderType::Takeaway,
            status: OrderStatus::Preparing,
            table_number: None,
            customer_name: Some("Luis".to_string()),
            items: vec![LineItem {
                id: LineItemId::new(8),
                order_id: OrderId::new(3),
                product_id: ProductId::new(2),
                product_name: "Tea".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(450),
            }],
        };

        let form = OrderForm::from_order(&order);
        assert_eq!(form.header.order_type.as_deref(), Some("TAKEAWAY"));
        assert_eq!(form.header.status.as_deref(), Some("PREPARING"));
        assert_eq!(form.items.len(), 2);
        assert_eq!(form.items[0].id, Some(LineItemId::new(8)));
        assert_eq!(form.items[0].quantity, Some(2));
        assert!(form.items[1].is_blank());
    }
}

//! Header, line-item and collection validators for the order form.

use std::collections::{HashMap, HashSet};

use common::{LineItemDraft, LineItemId, Money, OrderHeader, OrderStatus, OrderType, Product, ProductId};
use serde::Serialize;

use super::forms::{HeaderForm, LineItemForm};
use crate::validation::{FieldErrors, RowErrors, check_amount, check_max_length, clean_text};

/// Row error for quantity or price entered without a product.
pub const MUST_SELECT_PRODUCT: &str = "must select a product";

/// Collection error for an order without any product row.
pub const MUST_ADD_PRODUCT: &str = "must add at least one product to the order";

const TABLE_NUMBER_MAX: usize = 20;
const CUSTOMER_NAME_MAX: usize = 100;
const QUANTITY_MAX: i64 = i32::MAX as i64;

/// Everything wrong with one order submission.
///
/// `rows` runs parallel to the submitted rows; rows without errors are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub header: FieldErrors,
    pub rows: Vec<RowErrors>,
    pub collection: Vec<String>,
}

impl ValidationErrors {
    /// Returns true if the submission has no error at any level.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
            && self.rows.iter().all(RowErrors::is_empty)
            && self.collection.is_empty()
    }

    /// Errors for a collection-level message only.
    pub fn collection(message: impl Into<String>) -> Self {
        Self {
            collection: vec![message.into()],
            ..Default::default()
        }
    }
}

/// Validates the header fields and returns the cleaned header.
///
/// A takeaway order never keeps a table number.
pub fn validate_header(form: &HeaderForm) -> Result<OrderHeader, FieldErrors> {
    let mut errors = FieldErrors::new();

    let order_type = match clean_text(form.order_type.as_deref()) {
        None => Some(OrderType::default()),
        Some(code) => code
            .parse::<OrderType>()
            .map_err(|e| errors.add("type", e.to_string()))
            .ok(),
    };

    let status = match clean_text(form.status.as_deref()) {
        None => Some(OrderStatus::default()),
        Some(code) => code
            .parse::<OrderStatus>()
            .map_err(|e| errors.add("status", e.to_string()))
            .ok(),
    };

    let table_number = clean_text(form.table_number.as_deref());
    check_max_length(
        &mut errors,
        "table_number",
        table_number.as_deref(),
        TABLE_NUMBER_MAX,
    );

    let customer_name = clean_text(form.customer_name.as_deref());
    check_max_length(
        &mut errors,
        "customer_name",
        customer_name.as_deref(),
        CUSTOMER_NAME_MAX,
    );

    match (order_type, status) {
        (Some(order_type), Some(status)) if errors.is_empty() => Ok(OrderHeader {
            order_type,
            status,
            table_number: table_number.filter(|_| order_type.uses_table()),
            customer_name,
        }),
        _ => Err(errors),
    }
}

/// Validates one row against the product it references.
///
/// Returns `Ok(None)` for an empty row. A missing or zero unit price is
/// replaced by the product's current price.
pub fn validate_line_item(
    row: &LineItemForm,
    product: Option<&Product>,
) -> Result<Option<LineItemDraft>, RowErrors> {
    let mut errors = RowErrors::default();

    let Some(product_id) = row.product else {
        if row.quantity.is_some() || row.unit_price.is_some() {
            errors.row.push(MUST_SELECT_PRODUCT.to_string());
            return Err(errors);
        }
        return Ok(None);
    };

    let product = match product {
        Some(product) if product.id == product_id => Some(product),
        _ => {
            errors.fields.add(
                "product",
                format!("product {product_id} is not one of the available choices"),
            );
            None
        }
    };

    let quantity = match row.quantity {
        None => {
            errors.fields.add("quantity", "this field is required");
            None
        }
        Some(q) if q < 1 => {
            errors
                .fields
                .add("quantity", "ensure this value is greater than or equal to 1");
            None
        }
        Some(q) if q > QUANTITY_MAX => {
            errors.fields.add(
                "quantity",
                format!("ensure this value is less than or equal to {QUANTITY_MAX}"),
            );
            None
        }
        Some(q) => u32::try_from(q).ok(),
    };

    let supplied_price = row.unit_price.filter(|price| !price.is_zero());
    if let Some(price) = supplied_price {
        check_amount(&mut errors.fields, "unit_price", price);
    }

    match (product, quantity) {
        (Some(product), Some(quantity)) if errors.is_empty() => Ok(Some(LineItemDraft {
            id: row.id,
            product_id,
            quantity,
            unit_price: supplied_price
                .map(Money::from_decimal)
                .unwrap_or(product.price),
        })),
        _ => Err(errors),
    }
}

/// Lookup data the collection validator needs.
#[derive(Debug, Clone, Default)]
pub struct LineItemContext {
    /// Products referenced by the submitted rows.
    pub products: HashMap<ProductId, Product>,

    /// Line items of the order being edited; empty for a new order.
    pub existing_items: HashSet<LineItemId>,
}

impl LineItemContext {
    /// Builds a context from the referenced products.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            existing_items: HashSet::new(),
        }
    }

    /// Sets the line items the edited order already has.
    pub fn with_existing(mut self, ids: impl IntoIterator<Item = LineItemId>) -> Self {
        self.existing_items = ids.into_iter().collect();
        self
    }
}

/// The rows to write and the existing rows to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedLines {
    pub items: Vec<LineItemDraft>,
    pub deletions: Vec<LineItemId>,
}

/// Validates every row and the collection as a whole.
///
/// Rows marked for deletion are not validated; their ids are collected when
/// they belong to the edited order. A row id may appear only once. At least
/// one row that is not marked for deletion must carry a product.
pub fn validate_line_items(
    rows: &[LineItemForm],
    context: &LineItemContext,
) -> Result<ValidatedLines, ValidationErrors> {
    let mut errors = ValidationErrors {
        rows: vec![RowErrors::default(); rows.len()],
        ..Default::default()
    };
    let mut lines = ValidatedLines::default();
    let mut seen = HashSet::new();

    for (row, row_errors) in rows.iter().zip(errors.rows.iter_mut()) {
        if let Some(id) = row.id
            && !seen.insert(id)
        {
            row_errors
                .row
                .push(format!("line item {id} appears more than once"));
            continue;
        }

        if row.delete {
            if let Some(id) = row.id
                && context.existing_items.contains(&id)
            {
                lines.deletions.push(id);
            }
            continue;
        }

        if let Some(id) = row.id
            && !context.existing_items.contains(&id)
        {
            row_errors
                .row
                .push(format!("line item {id} does not belong to this order"));
        }

        let product = row.product.and_then(|id| context.products.get(&id));
        match validate_line_item(row, product) {
            Ok(Some(draft)) if row_errors.is_empty() => lines.items.push(draft),
            Ok(_) => {}
            Err(e) => {
                row_errors.fields = e.fields;
                row_errors.row.extend(e.row);
            }
        }
    }

    let valid_count = rows
        .iter()
        .filter(|row| !row.delete && row.product.is_some())
        .count();
    if valid_count < 1 {
        errors.collection.push(MUST_ADD_PRODUCT.to_string());
    }

    if errors.is_empty() {
        Ok(lines)
    } else {
        Err(errors)
    }
}

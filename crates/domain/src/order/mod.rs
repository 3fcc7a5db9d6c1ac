//! Order capture, validation and reporting.

mod forms;
mod listing;
mod service;
mod validation;

pub use forms::{HeaderForm, LineItemForm, OrderForm};
pub use listing::{OrderListing, StatusFilter};
pub use service::{OrderReceipt, OrderService};
pub use validation::{
    LineItemContext, MUST_ADD_PRODUCT, MUST_SELECT_PRODUCT, ValidatedLines, ValidationErrors,
    validate_header, validate_line_item, validate_line_items,
};

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The submitted form failed validation.
    #[error("Order form is invalid")]
    Invalid(Box<ValidationErrors>),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The requested status is unknown or cannot be requested directly.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Storing the order failed; details are logged, not returned.
    #[error("The order could not be saved, please try again")]
    SaveFailed,
}

impl OrderError {
    /// Short label used when counting rejected submissions.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::Invalid(_) => "invalid",
            OrderError::NotFound(_) => "not_found",
            OrderError::InvalidStatus(_) => "invalid_status",
            OrderError::SaveFailed => "save_failed",
        }
    }
}

use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The record is still referenced and cannot be deleted.
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    Referenced {
        entity: &'static str,
        id: i64,
        referenced_by: &'static str,
    },

    /// A category with the same name already exists.
    #[error("Category name already exists: {0}")]
    DuplicateName(String),

    /// The order write would leave the order without line items.
    #[error("Order {0:?} would have no line items")]
    EmptyOrder(Option<OrderId>),

    /// A stored row could not be mapped back to a record.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// The backend refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

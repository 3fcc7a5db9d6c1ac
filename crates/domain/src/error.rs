//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An order operation was rejected.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A catalog operation was rejected.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

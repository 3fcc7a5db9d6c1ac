//! Category and product maintenance.

mod forms;
mod service;

pub use forms::{CategoryForm, ProductForm, validate_category, validate_product};
pub use service::{CatalogService, ProductDeletion};

use common::{CategoryId, ProductId};
use thiserror::Error;

use crate::validation::FieldErrors;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Form is invalid: {0}")]
    Invalid(FieldErrors),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Products still belong to the category.
    #[error("Category {0} still has products and cannot be deleted")]
    CategoryInUse(CategoryId),

    /// Order line items still reference the product.
    #[error("Product {id} is used by {line_items} order line items and cannot be deleted")]
    ProductInUse { id: ProductId, line_items: u64 },
}

//! Domain layer for the restaurant system.
//!
//! This crate provides:
//! - Form input types for categories, products and orders
//! - Validators returning structured field, row and collection errors
//! - [`CatalogService`] for category and product maintenance
//! - [`OrderService`] with the order submission workflow, status
//!   transitions and the order listing

pub mod catalog;
pub mod error;
pub mod order;
pub mod validation;

pub use catalog::{
    CatalogError, CatalogService, CategoryForm, ProductDeletion, ProductForm, validate_category,
    validate_product,
};
pub use error::DomainError;
pub use order::{
    HeaderForm, LineItemContext, LineItemForm, MUST_ADD_PRODUCT, MUST_SELECT_PRODUCT, OrderError,
    OrderForm, OrderListing, OrderReceipt, OrderService, StatusFilter, ValidatedLines,
    ValidationErrors, validate_header, validate_line_item, validate_line_items,
};
pub use validation::{FieldErrors, RowErrors};

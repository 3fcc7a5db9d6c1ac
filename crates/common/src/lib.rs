//! Shared types for the restaurant order-management system.
//!
//! Everything that more than one layer needs to agree on lives here:
//! typed identifiers, [`Money`], the catalog and order records, and the
//! closed [`OrderType`] / [`OrderStatus`] enumerations.

pub mod model;
pub mod money;
pub mod types;

pub use model::{
    Category, CategoryDraft, LineItem, LineItemDraft, Order, OrderHeader, OrderStatus, OrderType,
    ParseChoiceError, Product, ProductDraft,
};
pub use money::Money;
pub use types::{CategoryId, LineItemId, OrderId, ProductId};

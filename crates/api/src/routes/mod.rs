//! HTTP handlers, grouped by resource.

pub mod categories;
pub mod dashboard;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use domain::{CatalogService, OrderService};
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub catalog: CatalogService<S>,

    /// Currency symbol used in labels and notices.
    pub currency: String,
}

impl<S: Store + Clone> AppState<S> {
    pub fn new(store: S, currency: impl Into<String>) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            catalog: CatalogService::new(store),
            currency: currency.into(),
        }
    }
}

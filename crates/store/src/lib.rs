//! Persistence layer for the restaurant system.
//!
//! The [`Store`] trait is the single seam between the domain services and the
//! database. [`PostgresStore`] is the production implementation and
//! [`InMemoryStore`] backs tests and database-less runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{OrderQuery, ProductQuery};
pub use store::{OrderWrite, Store, validate_order_write};

//! Infrastructure layer: product storage and catalog orchestration.

pub mod catalog_service;
pub mod product_store;

pub use catalog_service::{CatalogError, CatalogService};
pub use product_store::{InMemoryProductStore, ProductStore, SqliteProductStore, StoreError};

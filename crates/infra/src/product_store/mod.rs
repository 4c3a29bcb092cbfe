//! Product persistence boundary.
//!
//! This module defines an infrastructure-facing abstraction for storing products keyed
//! by id, with an in-memory backend for tests/dev and a SQLite backend for durable use.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryProductStore;
pub use sqlite::SqliteProductStore;
pub use r#trait::{ProductStore, StoreError};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::ProductId;
use catalog_products::{NewProduct, Product};

/// Product store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors (missing products,
/// rejected bundles). They are never retried by callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Durable mapping from product id to product record.
///
/// ## Id Assignment
///
/// `insert()` assigns ids from a monotonically increasing sequence starting at 1.
/// Ids are never reused, including after `delete()` or `clear()`.
///
/// ## Ordering
///
/// `list()` returns products in ascending id order, which is insertion order.
///
/// ## Referential Integrity
///
/// None. A product's `sources` are stored as given; deleting a product never touches
/// the `sources` of other products.
///
/// ## Implementation Requirements
///
/// Each create/update/delete must be atomic per record. No cross-call locking is
/// expected from implementations.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a new product and return it with its assigned id.
    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Overwrite the stored record with the same id.
    ///
    /// Returns `None` when no record exists at that id.
    async fn update(&self, product: Product) -> Result<Option<Product>, StoreError>;

    /// Remove a record. Returns `false` when there was nothing to remove.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;

    async fn exists(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self.get(id).await?.is_some())
    }

    /// Remove every record without resetting the id sequence.
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        (**self).insert(product).await
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list().await
    }

    async fn update(&self, product: Product) -> Result<Option<Product>, StoreError> {
        (**self).update(product).await
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }

    async fn exists(&self, id: ProductId) -> Result<bool, StoreError> {
        (**self).exists(id).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}

//! Catalog operations (application-level orchestration).
//!
//! `CatalogService` is the single entry point the API layer talks to. It owns a
//! `ProductStore` and combines store round-trips with the pure rules from
//! `catalog-products`.
//!
//! ## Bundle Flow
//!
//! ```text
//! requested ids
//!   ↓
//! 1. bundle::validate_request   (no IO)
//!   ↓
//! 2. resolve each id in request order   (store reads)
//!   ↓
//! 3. bundle::ensure_no_recursion   (no IO)
//!   ↓
//! 4. bundle::compose, then insert   (store write)
//! ```
//!
//! Nothing is written unless every check passes. Store failures are never retried;
//! they surface as `CatalogError::Store`.

use thiserror::Error;

use catalog_core::ProductId;
use catalog_products::{BundleError, NewProduct, Product, ProductUpdate, bundle};

use crate::product_store::{ProductStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    /// No record at the given id.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// The bundle request was rejected.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// The store failed; callers report this as an internal error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Product catalog facade over a `ProductStore`.
#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S> CatalogService<S>
where
    S: ProductStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All products in store order.
    pub async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self.store.list().await?;
        tracing::debug!(count = products.len(), "listed products");
        Ok(products)
    }

    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .get(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Persist a caller-supplied product as-is.
    ///
    /// `sources` are stored without the bundle checks; only `create_bundle` applies them.
    pub async fn create(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let created = self.store.insert(product).await?;
        tracing::info!(product_id = %created.id, name = %created.name, "product created");
        Ok(created)
    }

    /// Copy a product under a new id, with the copy suffix and no sources.
    pub async fn duplicate(&self, id: ProductId) -> Result<Product, CatalogError> {
        let original = self.get(id).await?;
        let copy = self.store.insert(original.duplicate()).await?;
        tracing::info!(product_id = %copy.id, source_id = %id, "product duplicated");
        Ok(copy)
    }

    /// Overwrite name and price of an existing product.
    pub async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        let mut product = self.get(id).await?;
        product.apply_update(update);

        let updated = self
            .store
            .update(product)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        tracing::info!(product_id = %id, "product updated");
        Ok(updated)
    }

    /// Remove a product. Bundles referencing it keep their (now dangling) source link.
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        if !self.store.delete(id).await? {
            return Err(CatalogError::NotFound(id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Compose and persist a bundle from the requested products, in request order.
    pub async fn create_bundle(&self, ids: &[ProductId]) -> Result<Product, CatalogError> {
        match self.try_create_bundle(ids).await {
            Ok(created) => {
                tracing::info!(
                    product_id = %created.id,
                    sources = created.sources.len(),
                    "bundle created"
                );
                Ok(created)
            }
            Err(CatalogError::Bundle(reason)) => {
                tracing::warn!(requested = ?ids, error = ?reason, "bundle rejected");
                Err(CatalogError::Bundle(reason))
            }
            Err(other) => {
                tracing::error!(requested = ?ids, error = %other, "bundle creation failed");
                Err(other)
            }
        }
    }

    async fn try_create_bundle(&self, ids: &[ProductId]) -> Result<Product, CatalogError> {
        bundle::validate_request(ids)?;

        let mut resolved = Vec::with_capacity(ids.len());
        for &id in ids {
            let product = self
                .store
                .get(id)
                .await?
                .ok_or(BundleError::UnknownProductId(id))?;
            resolved.push(product);
        }

        bundle::ensure_no_recursion(&resolved)?;

        let created = self.store.insert(bundle::compose(&resolved)).await?;
        Ok(created)
    }
}

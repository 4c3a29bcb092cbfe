use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use catalog_core::ProductId;
use catalog_products::{NewProduct, Product};

use super::r#trait::{ProductStore, StoreError};

/// In-memory product store.
///
/// Intended for tests/dev. Records are kept in id order so `list()` matches insertion
/// order without sorting.
#[derive(Debug)]
pub struct InMemoryProductStore {
    products: RwLock<BTreeMap<ProductId, Product>>,
    next_id: AtomicI64,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut products = self.products.write().map_err(|_| StoreError::Poisoned)?;
        let id = ProductId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let product = product.into_product(id);
        products.insert(id, product.clone());
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::Poisoned)?;
        Ok(products.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::Poisoned)?;
        Ok(products.values().cloned().collect())
    }

    async fn update(&self, product: Product) -> Result<Option<Product>, StoreError> {
        let mut products = self.products.write().map_err(|_| StoreError::Poisoned)?;
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut products = self.products.write().map_err(|_| StoreError::Poisoned)?;
        Ok(products.remove(&id).is_some())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut products = self.products.write().map_err(|_| StoreError::Poisoned)?;
        products.clear();
        Ok(())
    }
}

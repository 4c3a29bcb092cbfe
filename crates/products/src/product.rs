use serde::{Deserialize, Serialize};

use catalog_core::ProductId;

/// Suffix appended to the name of a duplicated product.
pub const COPY_SUFFIX: &str = " (Copy)";

/// A catalog product.
///
/// A product whose `sources` list is non-empty is a bundle. `sources` holds the ids
/// of the products it was composed from, one level deep: the sources of a source are
/// never copied in. References are not re-checked after creation, so a source may
/// point at a product that has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub sources: Vec<ProductId>,
}

impl Product {
    pub fn is_bundle(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Build the payload for a copy of this product.
    ///
    /// The copy keeps the price, gets the `" (Copy)"` suffix, and never carries over
    /// source links.
    pub fn duplicate(&self) -> NewProduct {
        NewProduct {
            name: format!("{}{}", self.name, COPY_SUFFIX),
            price: self.price,
            sources: Vec::new(),
        }
    }

    /// Overwrite name and price. `id` and `sources` are left untouched.
    pub fn apply_update(&mut self, update: ProductUpdate) {
        self.name = update.name;
        self.price = update.price;
    }
}

/// A product that has not been persisted yet (no id assigned).
///
/// Deserializing from a full product payload is accepted; an `id` field, if present,
/// is ignored since the store assigns ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub sources: Vec<ProductId>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<ProductId>) -> Self {
        self.sources = sources;
        self
    }

    /// Attach the id assigned by the store.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            sources: self.sources,
        }
    }
}

/// Update payload: only name and price are mutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub price: f64,
}

//! Bundle composition rules.
//!
//! A bundle is built from an ordered list of requested product ids. The checks run in a
//! fixed order so the reported error is deterministic when several apply at once:
//!
//! ```text
//! requested ids
//!   ↓
//! 1. validate_request      (count >= 2, no repeated id)
//!   ↓
//! 2. resolve against store (caller's job; unknown id → UnknownProductId)
//!   ↓
//! 3. ensure_no_recursion   (flattened one-level id set must be duplicate-free)
//!   ↓
//! 4. compose               (joined name, summed price, sources = resolved ids)
//! ```
//!
//! Resolution and persistence need IO and live in the infrastructure layer; everything
//! here is pure.

use std::collections::HashSet;

use thiserror::Error;

use catalog_core::ProductId;

use crate::product::{NewProduct, Product};

/// Minimum number of products in a bundle request.
pub const MIN_BUNDLE_SIZE: usize = 2;

/// Separator between source names in a bundle name.
pub const NAME_SEPARATOR: &str = "+";

/// Why a bundle request was rejected.
///
/// The display text is part of the external contract: callers match on it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BundleError {
    #[error("At least 2 products are required to create a bundle")]
    InsufficientInputs,

    #[error("Duplicate product IDs are not allowed")]
    DuplicateRequestedIds,

    /// Carries the first requested id that did not resolve.
    #[error("One of the product id given does not correspond to any product")]
    UnknownProductId(ProductId),

    /// Carries the first id seen twice in the flattened id set.
    #[error(
        "The products given for the new bundle have at least one of them also being a bundle and causing dupplicate products"
    )]
    RecursiveComposition(ProductId),
}

/// Checks that only need the raw request.
///
/// The count check runs first, so a single id is rejected as insufficient even if it
/// does not exist. The repeat check runs before any lookup, so a request with both a
/// repeated id and an unknown id is reported as a duplicate.
pub fn validate_request(ids: &[ProductId]) -> Result<(), BundleError> {
    if ids.len() < MIN_BUNDLE_SIZE {
        return Err(BundleError::InsufficientInputs);
    }

    let unique: HashSet<&ProductId> = ids.iter().collect();
    if unique.len() != ids.len() {
        return Err(BundleError::DuplicateRequestedIds);
    }

    Ok(())
}

/// Flattened effective id set: each product's own id followed by its direct sources.
///
/// Only one level is expanded; the sources of a source are not visited.
pub fn effective_ids(products: &[Product]) -> Vec<ProductId> {
    let mut ids = Vec::with_capacity(products.len());
    for product in products {
        ids.push(product.id);
        ids.extend(product.sources.iter().copied());
    }
    ids
}

/// Reject a set of resolved products whose flattened ids collide.
///
/// Two bundles sharing a source collide, and so does a product listed next to a bundle
/// that already contains it.
pub fn ensure_no_recursion(products: &[Product]) -> Result<(), BundleError> {
    let mut seen = HashSet::new();
    for id in effective_ids(products) {
        if !seen.insert(id) {
            return Err(BundleError::RecursiveComposition(id));
        }
    }
    Ok(())
}

/// Build the bundle payload from resolved products, in request order.
pub fn compose(products: &[Product]) -> NewProduct {
    let name = products
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR);
    let price = products.iter().map(|p| p.price).sum();
    let sources = products.iter().map(|p| p.id).collect();

    NewProduct {
        name,
        price,
        sources,
    }
}

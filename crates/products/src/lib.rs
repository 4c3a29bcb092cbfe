//! Products domain module.
//!
//! This crate contains business rules for the product catalog, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod bundle;
pub mod product;

pub use bundle::{BundleError, compose, ensure_no_recursion, validate_request};
pub use product::{COPY_SUFFIX, NewProduct, Product, ProductUpdate};

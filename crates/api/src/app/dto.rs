use serde::Deserialize;

use catalog_core::ProductId;
use catalog_products::{NewProduct, ProductUpdate};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /api/products`.
///
/// Accepts a full product payload; an `id` field is ignored since the store
/// assigns it.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub sources: Vec<ProductId>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(body: CreateProductRequest) -> Self {
        NewProduct::new(body.name, body.price).with_sources(body.sources)
    }
}

/// Body of `PUT /api/products/:id`. Other fields (id, sources) are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub price: f64,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(body: UpdateProductRequest) -> Self {
        ProductUpdate {
            name: body.name,
            price: body.price,
        }
    }
}

/// Body of `POST /api/products/bundle`: ordered product ids.
pub type CreateBundleRequest = Vec<ProductId>;

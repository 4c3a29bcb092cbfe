use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use catalog_core::ProductId;
use catalog_infra::CatalogError;
use catalog_products::BundleError;

/// Not-found texts, one per operation. Callers match on them verbatim.
pub const GET_NOT_FOUND: &str = "No corresponding product found";
pub const DUPLICATE_NOT_FOUND: &str = "No product found with given ID to dupplicate";
pub const DELETE_NOT_FOUND: &str = "No product to delete found at this id";

/// Map errors of operations that look up a product by id.
///
/// `not_found_message` is the operation's own not-found text.
pub fn lookup_error_to_response(
    err: CatalogError,
    not_found_message: &'static str,
) -> axum::response::Response {
    match err {
        CatalogError::NotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", not_found_message)
        }
        other => catalog_error_to_response(other),
    }
}

/// Map errors of operations that never look up a single product (list, create, bundle).
pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::NotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("product {id} not found"),
        ),
        CatalogError::Bundle(reason) => bundle_error_to_response(reason),
        CatalogError::Store(e) => {
            tracing::error!(error = %e, "product store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn bundle_error_to_response(err: BundleError) -> axum::response::Response {
    let code = match err {
        BundleError::InsufficientInputs => "insufficient_inputs",
        BundleError::DuplicateRequestedIds => "duplicate_requested_ids",
        BundleError::UnknownProductId(_) => "unknown_product_id",
        BundleError::RecursiveComposition(_) => "recursive_composition",
    };
    json_error(StatusCode::BAD_REQUEST, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Malformed JSON bodies are request errors, reported in the same shape as the rest.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), "invalid_body", rejection.body_text())
}

pub fn parse_product_id(s: &str) -> Result<ProductId, axum::response::Response> {
    s.parse().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid product id: {s}"),
        )
    })
}

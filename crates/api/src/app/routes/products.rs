use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use catalog_products::{NewProduct, ProductUpdate};

use crate::app::dto;
use crate::app::errors::{self, DELETE_NOT_FOUND, DUPLICATE_NOT_FOUND, GET_NOT_FOUND};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/bundle", post(create_bundle))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/duplicate", post(duplicate_product))
}

pub async fn list_products(
    Extension(services): Extension<AppServices>,
) -> axum::response::Response {
    match services.list().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.get(id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::lookup_error_to_response(e, GET_NOT_FOUND),
    }
}

pub async fn create_product(
    Extension(services): Extension<AppServices>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.create(NewProduct::from(body)).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn duplicate_product(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.duplicate(id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::lookup_error_to_response(e, DUPLICATE_NOT_FOUND),
    }
}

pub async fn update_product(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.update(id, ProductUpdate::from(body)).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::lookup_error_to_response(e, GET_NOT_FOUND),
    }
}

pub async fn delete_product(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::lookup_error_to_response(e, DELETE_NOT_FOUND),
    }
}

pub async fn create_bundle(
    Extension(services): Extension<AppServices>,
    body: Result<Json<dto::CreateBundleRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(ids) = match body {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.create_bundle(&ids).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use catalog_api::app::{build_app, router_with};
use catalog_api::config::ApiConfig;
use catalog_core::ProductId;
use catalog_infra::{CatalogService, ProductStore, StoreError};
use catalog_products::{NewProduct, Product};

const RECURSION_MESSAGE: &str = "The products given for the new bundle have at least one of them also being a bundle and causing dupplicate products";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same wiring as prod with a fresh in-memory store, on an ephemeral port.
        let config = ApiConfig::in_memory();
        let app = build_app(&config).await.expect("failed to build app");
        Self::serve(app, &config).await
    }

    async fn serve(app: axum::Router, config: &ApiConfig) -> Self {
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api/products", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}", self.base_url, suffix)
    }

    async fn seed(&self, name: &str, price: f64) -> Value {
        self.seed_with_sources(name, price, &[]).await
    }

    async fn seed_with_sources(&self, name: &str, price: f64, sources: &[&Value]) -> Value {
        let sources: Vec<i64> = sources.iter().map(|p| id_of(p)).collect();
        let res = self
            .client
            .post(self.url(""))
            .json(&json!({ "id": null, "name": name, "price": price, "sources": sources }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }

    async fn seed_bundle(&self, parts: &[&Value]) -> Value {
        let name = parts
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect::<Vec<_>>()
            .join("+");
        let price: f64 = parts.iter().map(|p| p["price"].as_f64().unwrap()).sum();
        self.seed_with_sources(&name, price, parts).await
    }

    async fn post_bundle(&self, body: String) -> reqwest::Response {
        self.client
            .post(self.url("/bundle"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    async fn get_status(&self, id: i64) -> StatusCode {
        self.client
            .get(self.url(&format!("/{id}")))
            .send()
            .await
            .unwrap()
            .status()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn id_of(product: &Value) -> i64 {
    product["id"].as_i64().unwrap()
}

async fn error_message(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let health = srv.base_url.replace("/api/products", "/health");
    let res = srv.client.get(health).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_returns_product_with_assigned_id() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url(""))
        .json(&json!({ "id": null, "name": "pen", "price": 2.5, "sources": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "pen");
    assert_eq!(body["price"], 2.5);
    assert_eq!(body["id"], 1);
    assert_eq!(body["sources"], json!([]));
}

#[tokio::test]
async fn create_rejects_malformed_body() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url(""))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(r#"{"name": 12}"#)
        .send()
        .await
        .unwrap();

    assert!(res.status().is_client_error());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn get_by_valid_id_returns_product() {
    let srv = TestServer::spawn().await;
    let pen = srv.seed("pen", 2.5).await;

    let res = srv.client.get(srv.url(&format!("/{}", id_of(&pen)))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, pen);
}

#[tokio::test]
async fn get_by_unknown_id_is_not_found() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/1")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(res).await, "No corresponding product found");
}

#[tokio::test]
async fn get_all_keeps_insertion_order() {
    let srv = TestServer::spawn().await;
    srv.seed("pen", 1.0).await;
    srv.seed("pencil", 0.5).await;
    srv.seed("notebook", 2.5).await;

    let res = srv.client.get(srv.url("")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["name"], "pen");
    assert_eq!(items[1]["name"], "pencil");
    assert_eq!(items[2]["name"], "notebook");
}

#[tokio::test]
async fn update_changes_price_but_not_id_or_sources() {
    let srv = TestServer::spawn().await;
    let pen = srv.seed("pen", 1.0).await;
    let pencil = srv.seed("pencil", 0.5).await;
    let kit = srv.seed_bundle(&[&pen, &pencil]).await;

    let res = srv
        .client
        .put(srv.url(&format!("/{}", id_of(&kit))))
        .json(&json!({ "id": 99, "name": "school kit", "price": 3.0, "sources": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], kit["id"]);
    assert_eq!(body["price"], 3.0);
    assert_eq!(body["name"], "school kit");
    assert_eq!(body["sources"], kit["sources"]);
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .put(srv.url("/5"))
        .json(&json!({ "name": "pen", "price": 3.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_valid_id_removes_product() {
    let srv = TestServer::spawn().await;
    let pen = srv.seed("pen", 2.5).await;

    let res = srv
        .client
        .delete(srv.url(&format!("/{}", id_of(&pen))))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(srv.get_status(id_of(&pen)).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_null_id_is_bad_request() {
    let srv = TestServer::spawn().await;
    let res = srv.client.delete(srv.url("/null")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let srv = TestServer::spawn().await;
    let res = srv.client.delete(srv.url("/1")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(res).await, "No product to delete found at this id");
}

#[tokio::test]
async fn duplicate_valid_id_creates_copy() {
    let srv = TestServer::spawn().await;
    let pen = srv.seed("pen", 2.5).await;

    let res = srv
        .client
        .post(srv.url(&format!("/{}/duplicate", id_of(&pen))))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], id_of(&pen) + 1);
    assert_eq!(body["name"], "pen (Copy)");
    assert_eq!(body["price"], 2.5);
}

#[tokio::test]
async fn duplicate_of_bundle_drops_sources() {
    let srv = TestServer::spawn().await;
    let pen = srv.seed("pen", 1.0).await;
    let pencil = srv.seed("pencil", 0.5).await;
    let kit = srv.seed_bundle(&[&pen, &pencil]).await;

    let res = srv
        .client
        .post(srv.url(&format!("/{}/duplicate", id_of(&kit))))
        .send()
        .await
        .unwrap();

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "pen+pencil (Copy)");
    assert_eq!(body["sources"], json!([]));
}

#[tokio::test]
async fn duplicate_unknown_id_is_not_found() {
    let srv = TestServer::spawn().await;
    let res = srv.client.post(srv.url("/1/duplicate")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        error_message(res).await,
        "No product found with given ID to dupplicate"
    );
}

#[tokio::test]
async fn bundle_of_valid_inputs_creates_bundle() {
    let srv = TestServer::spawn().await;
    let p1 = srv.seed("pen", 1.0).await;
    let p2 = srv.seed("pencil", 0.5).await;
    let p3 = srv.seed("notebook", 2.5).await;
    let p4 = srv.seed("mouse", 30.0).await;

    let res = srv
        .post_bundle(format!("[{},{},{}]", id_of(&p1), id_of(&p2), id_of(&p3)))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], id_of(&p4) + 1);
    assert_eq!(body["name"], "pen+pencil+notebook");
    assert_eq!(body["price"], 1.0 + 0.5 + 2.5);
    assert_eq!(body["sources"], json!([id_of(&p1), id_of(&p2), id_of(&p3)]));
}

#[tokio::test]
async fn bundle_with_less_than_two_ids_is_bad_request() {
    let srv = TestServer::spawn().await;
    let p1 = srv.seed("pen", 1.0).await;

    let res = srv.post_bundle(format!("[{}]", id_of(&p1))).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(res).await,
        "At least 2 products are required to create a bundle"
    );
}

#[tokio::test]
async fn bundle_with_unknown_id_is_bad_request() {
    let srv = TestServer::spawn().await;
    let p1 = srv.seed("pen", 1.0).await;
    let p2 = srv.seed("pencil", 0.5).await;

    let res = srv
        .post_bundle(format!("[{},{}, 1000]", id_of(&p1), id_of(&p2)))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(res).await,
        "One of the product id given does not correspond to any product"
    );
}

#[tokio::test]
async fn bundle_with_repeated_id_is_bad_request_and_writes_nothing() {
    let srv = TestServer::spawn().await;
    let p1 = srv.seed("pen", 1.0).await;
    let p2 = srv.seed("pencil", 0.5).await;

    let res = srv
        .post_bundle(format!("[{},{},{}]", id_of(&p1), id_of(&p1), id_of(&p2)))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(res).await, "Duplicate product IDs are not allowed");
    assert_eq!(srv.get_status(id_of(&p2) + 1).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bundle_of_non_overlapping_bundles_is_created() {
    let srv = TestServer::spawn().await;
    let p1 = srv.seed("pen", 1.0).await;
    let p2 = srv.seed("pencil", 0.5).await;
    let p3 = srv.seed("notebook", 2.5).await;
    let p4 = srv.seed("mouse", 30.0).await;
    let p5 = srv.seed("keyboard", 25.0).await;
    let bundle1 = srv.seed_bundle(&[&p1, &p2]).await;
    let bundle2 = srv.seed_bundle(&[&p4, &p5]).await;

    let res = srv
        .post_bundle(format!(
            "[{},{},{}]",
            id_of(&p3),
            id_of(&bundle1),
            id_of(&bundle2)
        ))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let expected_price = p3["price"].as_f64().unwrap()
        + bundle1["price"].as_f64().unwrap()
        + bundle2["price"].as_f64().unwrap();
    assert_eq!(body["id"], id_of(&bundle2) + 1);
    assert_eq!(body["name"], "notebook+pen+pencil+mouse+keyboard");
    assert_eq!(body["price"], expected_price);
}

#[tokio::test]
async fn bundle_of_overlapping_bundles_is_bad_request_and_writes_nothing() {
    let srv = TestServer::spawn().await;
    let p1 = srv.seed("pen", 1.0).await;
    let p2 = srv.seed("pencil", 0.5).await;
    let p3 = srv.seed("notebook", 2.5).await;
    let bundle1 = srv.seed_bundle(&[&p1, &p2]).await;
    let bundle2 = srv.seed_bundle(&[&p2, &p3]).await;

    let res = srv
        .post_bundle(format!("[{},{}]", id_of(&bundle1), id_of(&bundle2)))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(res).await, RECURSION_MESSAGE);
    assert_eq!(srv.get_status(id_of(&bundle2) + 1).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bundle_with_malformed_body_is_request_error() {
    let srv = TestServer::spawn().await;
    let res = srv.post_bundle("[1, \"two\"]".to_string()).await;

    assert!(res.status().is_client_error());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

/// Store whose every operation fails, counting how often it is called.
#[derive(Default)]
struct UnavailableStore {
    calls: AtomicUsize,
}

impl UnavailableStore {
    fn fail(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Poisoned
    }
}

#[async_trait]
impl ProductStore for UnavailableStore {
    async fn insert(&self, _product: NewProduct) -> Result<Product, StoreError> {
        Err(self.fail())
    }

    async fn get(&self, _id: ProductId) -> Result<Option<Product>, StoreError> {
        Err(self.fail())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        Err(self.fail())
    }

    async fn update(&self, _product: Product) -> Result<Option<Product>, StoreError> {
        Err(self.fail())
    }

    async fn delete(&self, _id: ProductId) -> Result<bool, StoreError> {
        Err(self.fail())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(self.fail())
    }
}

#[tokio::test]
async fn store_failures_are_internal_errors_and_not_retried() {
    let store = Arc::new(UnavailableStore::default());
    let shared: Arc<dyn ProductStore> = store.clone();
    let app = router_with(Arc::new(CatalogService::new(shared)));
    let srv = TestServer::serve(app, &ApiConfig::in_memory()).await;

    let res = srv.client.get(srv.url("")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_error");
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);

    // A lookup failure is a 500, never a 404.
    let res = srv.client.get(srv.url("/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_error");

    // Bundle resolution stops at the first failing read.
    let res = srv.post_bundle("[1, 2]".to_string()).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_error");
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);
}

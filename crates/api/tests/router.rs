//! In-process router tests driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use pricedb_api::app::{AppServices, build_app};
use pricedb_core::Money;
use pricedb_infra::{InventoryStore, LocalStore, StoreError, StoreResult};
use pricedb_inventory::Item;

/// Every call fails with the configured error.
struct FailingStore(StoreError);

#[async_trait]
impl InventoryStore for FailingStore {
    async fn get(&self, _: &str) -> StoreResult<Item> {
        Err(self.0.clone())
    }
    async fn list(&self) -> StoreResult<Vec<Item>> {
        Err(self.0.clone())
    }
    async fn create(&self, _: &str, _: Money) -> StoreResult<()> {
        Err(self.0.clone())
    }
    async fn update(&self, _: &str, _: Money) -> StoreResult<()> {
        Err(self.0.clone())
    }
    async fn delete(&self, _: &str) -> StoreResult<()> {
        Err(self.0.clone())
    }
}

async fn call(store: Arc<dyn InventoryStore>, uri: &str) -> (StatusCode, String) {
    let app = build_app(Arc::new(AppServices::new(store)));
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn backend_failures_name_the_operation() {
    let store: Arc<dyn InventoryStore> =
        Arc::new(FailingStore(StoreError::backend("transport error: connection reset")));

    let cases = [
        ("/list", "listing"),
        ("/price?item=shoes", "finding"),
        ("/create?item=shoes&price=1", "creating"),
        ("/update?item=shoes&price=1", "updating"),
        ("/remove?item=shoes", "deleting"),
    ];

    for (uri, verb) in cases {
        let (status, body) = call(store.clone(), uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(
            body,
            format!("error {verb} item: transport error: connection reset\n"),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn timeouts_are_server_errors() {
    let store: Arc<dyn InventoryStore> =
        Arc::new(FailingStore(StoreError::Timeout(Duration::from_millis(20))));

    let (status, body) = call(store, "/price?item=shoes").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("error finding item: request timed out"), "{body}");
}

#[tokio::test]
async fn invalid_input_never_reaches_the_store() {
    // A failing store would turn any store call into a 500.
    let store: Arc<dyn InventoryStore> = Arc::new(FailingStore(StoreError::backend("unreachable")));

    assert_eq!(call(store.clone(), "/create?item=shoes&price=x").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(call(store.clone(), "/update?item=shoes&price=-1").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(call(store, "/remove").await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (status, _) = call(Arc::new(LocalStore::new()), "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn percent_encoded_names_round_trip() {
    let store: Arc<dyn InventoryStore> = Arc::new(LocalStore::new());

    let (status, body) = call(store.clone(), "/create?item=red%20shoes&price=19.999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Created item: red shoes at $20.00 price\n");

    assert_eq!(call(store, "/price?item=red+shoes").await.1, "$20.00\n");
}

#[tokio::test]
async fn repeated_query_keys_use_the_first_value() {
    let store: Arc<dyn InventoryStore> = Arc::new(LocalStore::new());

    let (status, body) = call(store.clone(), "/create?item=socks&price=5&price=6").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Created item: socks at $5.00 price\n");

    assert_eq!(
        call(store.clone(), "/price?item=socks&item=socks").await,
        (StatusCode::OK, "$5.00\n".to_string())
    );
    assert_eq!(
        call(store, "/update?item=socks&price=4.25&item=hats").await,
        (StatusCode::OK, "Updated socks to 4.25\n".to_string())
    );
}

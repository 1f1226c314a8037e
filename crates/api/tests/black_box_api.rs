use std::sync::Arc;
use std::time::Duration;

use pricedb_api::app::{self, AppServices};
use pricedb_core::Money;
use pricedb_infra::collection::InMemoryCollection;
use pricedb_infra::{InventoryStore, LocalStore, RemoteStore};
use reqwest::StatusCode;
use tokio::sync::oneshot;

struct TestServer {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Same router as prod, bound to an ephemeral port.
    async fn spawn(store: Arc<dyn InventoryStore>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let (tx, rx) = oneshot::channel::<()>();
        let services = Arc::new(AppServices::new(store));
        let handle = tokio::spawn(app::serve(listener, services, async move {
            let _ = rx.await;
        }));

        Self {
            base_url,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn local() -> Self {
        Self::spawn(Arc::new(LocalStore::new())).await
    }

    async fn get(&self, path_and_query: &str) -> (StatusCode, String) {
        let res = reqwest::get(format!("{}{}", self.base_url, path_and_query))
            .await
            .unwrap();
        let status = res.status();
        (status, res.text().await.unwrap())
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.handle).await.unwrap().unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn create_price_remove_lifecycle() {
    let srv = TestServer::local().await;

    let (status, body) = srv.get("/create?item=shoes&price=50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Created item: shoes at $50.00 price\n");

    let (status, body) = srv.get("/price?item=shoes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "$50.00\n");

    let (status, body) = srv.get("/remove?item=shoes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Deleted item: shoes\n");

    let (status, body) = srv.get("/price?item=shoes").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "no such item: \"shoes\"\n");
}

#[tokio::test]
async fn update_changes_the_listed_price() {
    let srv = TestServer::local().await;
    srv.get("/create?item=socks&price=5").await;
    srv.get("/create?item=hats&price=12.5").await;

    let (status, body) = srv.get("/update?item=socks&price=4.25").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Updated socks to 4.25\n");

    let (status, body) = srv.get("/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hats: $12.50\nsocks: $4.25\n");
}

#[tokio::test]
async fn empty_list_has_empty_body() {
    let srv = TestServer::local().await;
    let (status, body) = srv.get("/list").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn client_errors_have_plain_text_bodies() {
    let srv = TestServer::local().await;
    srv.get("/create?item=shoes&price=50").await;

    let cases = [
        ("/create?item=shoes&price=1", StatusCode::CONFLICT, "item already exists: \"shoes\"\n"),
        ("/update?item=hats&price=1", StatusCode::NOT_FOUND, "no such item: \"hats\"\n"),
        ("/remove?item=hats", StatusCode::NOT_FOUND, "no such item: \"hats\"\n"),
        ("/create?item=hats&price=abc", StatusCode::BAD_REQUEST, "could not convert price: \"hats\"\n"),
        ("/update?item=shoes", StatusCode::BAD_REQUEST, "could not convert price: \"shoes\"\n"),
        ("/create?item=hats&price=-3", StatusCode::BAD_REQUEST, "price cannot be negative: \"hats\"\n"),
        ("/price", StatusCode::BAD_REQUEST, "missing item name\n"),
        ("/remove?item=", StatusCode::BAD_REQUEST, "missing item name\n"),
    ];

    for (path, status, body) in cases {
        assert_eq!(srv.get(path).await, (status, body.to_string()), "{path}");
    }

    // Rejected create left the original price alone.
    assert_eq!(srv.get("/price?item=shoes").await.1, "$50.00\n");
}

#[tokio::test]
async fn health_and_request_id() {
    let srv = TestServer::local().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn graceful_shutdown_closes_the_store() {
    let collection = Arc::new(InMemoryCollection::new());
    let store = RemoteStore::new(collection.clone(), Duration::from_secs(1));
    store.create("shoes", Money::from_cents(5000)).await.unwrap();

    let srv = TestServer::spawn(Arc::new(store)).await;
    assert_eq!(srv.get("/price?item=shoes").await.1, "$50.00\n");
    assert!(!collection.is_closed());

    srv.stop().await;
    assert!(collection.is_closed());
}

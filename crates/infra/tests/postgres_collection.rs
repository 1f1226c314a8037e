//! Runs against a live database. Set `DATABASE_URL` and pass `--ignored`.

use std::time::Duration;

use pricedb_core::Money;
use pricedb_infra::collection::PostgresCollection;
use pricedb_infra::{InventoryStore, RemoteStore, StoreError};

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn postgres_backed_store_round_trip() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let collection_name = format!("test_{}", uuid::Uuid::now_v7().simple());
    let collection = PostgresCollection::connect(&url, &collection_name, Duration::from_secs(5))
        .await
        .expect("connect");
    let store = RemoteStore::new(collection, Duration::from_secs(5));

    store.create("shoes", Money::from_cents(5000)).await.unwrap();
    assert_eq!(
        store.create("shoes", Money::from_cents(1)).await.unwrap_err(),
        StoreError::AlreadyExists("shoes".into())
    );
    assert_eq!(store.get("shoes").await.unwrap().price, Money::from_cents(5000));

    store.update("shoes", Money::from_cents(4200)).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);
    assert_eq!(store.get("shoes").await.unwrap().price, Money::from_cents(4200));

    store.delete("shoes").await.unwrap();
    assert!(matches!(store.delete("shoes").await, Err(StoreError::NotFound(_))));
    assert!(matches!(store.update("shoes", Money::ZERO).await, Err(StoreError::NotFound(_))));

    sqlx::query("DELETE FROM documents WHERE collection = $1")
        .bind(&collection_name)
        .execute(store.collection().pool())
        .await
        .unwrap();
    store.shutdown().await;
}

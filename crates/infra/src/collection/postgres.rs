//! Postgres-backed document collection.
//!
//! Documents are stored as JSONB rows in a single `documents` table, keyed by
//! their `_id` and scoped by a collection name. Item filters are evaluated on
//! `body->>'item'`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | CollectionError | Transient |
//! |------------|-----------------|-----------|
//! | PoolClosed | `Closed` | no |
//! | PoolTimedOut, Io, Tls, Protocol | `Transport` | yes |
//! | Database (any code) | `Transport` | yes |
//! | ColumnDecode, Decode | `Decode` | no |
//! | Other | `Transport` | yes |
//!
//! ## Thread Safety
//!
//! `PostgresCollection` is `Send + Sync`; the SQLx pool handles connection
//! management.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::instrument;

use pricedb_core::DocumentId;

use super::r#trait::{
    CollectionError, DeleteOutcome, DocumentCollection, Filter, ItemDocument, PriceUpdate,
    UpdateOutcome,
};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id UUID PRIMARY KEY,
        collection TEXT NOT NULL,
        body JSONB NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS documents_collection_item_idx
        ON documents (collection, (body->>'item'))
    "#,
];

/// A named document collection stored in Postgres.
#[derive(Debug, Clone)]
pub struct PostgresCollection {
    pool: PgPool,
    collection: String,
}

impl PostgresCollection {
    pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }

    /// Open a pool against `database_url` and make sure the table exists.
    ///
    /// This is a single attempt; callers wrap it in a `Retrier`.
    #[instrument(skip_all, fields(collection = %collection), err)]
    pub async fn connect(
        database_url: &str,
        collection: &str,
        acquire_timeout: Duration,
    ) -> Result<Self, CollectionError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let this = Self::new(pool, collection);
        this.ensure_schema().await?;
        Ok(this)
    }

    pub async fn ensure_schema(&self) -> Result<(), CollectionError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_row(row: &PgRow) -> Result<ItemDocument, CollectionError> {
    let Json(doc) = row
        .try_get::<Json<ItemDocument>, _>("body")
        .map_err(|e| CollectionError::Decode(format!("failed to decode document: {e}")))?;
    Ok(doc)
}

#[async_trait]
impl DocumentCollection for PostgresCollection {
    #[instrument(skip(self), fields(collection = %self.collection), err)]
    async fn find_one(&self, filter: &Filter) -> Result<Option<ItemDocument>, CollectionError> {
        let row = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1
                AND body->>'item' IS NOT NULL
                AND ($2::text IS NULL OR body->>'item' = $2)
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(&self.collection)
        .bind(filter.item_name())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_one", e))?;

        row.as_ref().map(decode_row).transpose()
    }

    #[instrument(skip(self), fields(collection = %self.collection), err)]
    async fn find_many(&self, filter: &Filter) -> Result<Vec<ItemDocument>, CollectionError> {
        let rows = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1
                AND body->>'item' IS NOT NULL
                AND ($2::text IS NULL OR body->>'item' = $2)
            ORDER BY id ASC
            "#,
        )
        .bind(&self.collection)
        .bind(filter.item_name())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_many", e))?;

        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, doc), fields(collection = %self.collection, item = %doc.item), err)]
    async fn insert_one(&self, doc: ItemDocument) -> Result<DocumentId, CollectionError> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(doc.id.as_uuid())
        .bind(&self.collection)
        .bind(Json(&doc))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_one", e))?;

        Ok(doc.id)
    }

    #[instrument(skip(self, update), fields(collection = %self.collection), err)]
    async fn update_one(
        &self,
        filter: &Filter,
        update: PriceUpdate,
    ) -> Result<UpdateOutcome, CollectionError> {
        let patch = serde_json::json!({
            "price_cents": update.price,
            "updated_at": update.updated_at,
        });

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = body || $3::jsonb
            WHERE id = (
                SELECT id
                FROM documents
                WHERE collection = $1
                    AND body->>'item' IS NOT NULL
                    AND ($2::text IS NULL OR body->>'item' = $2)
                ORDER BY id ASC
                LIMIT 1
            )
            "#,
        )
        .bind(&self.collection)
        .bind(filter.item_name())
        .bind(Json(patch))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_one", e))?;

        Ok(UpdateOutcome {
            matched: result.rows_affected(),
        })
    }

    #[instrument(skip(self), fields(collection = %self.collection), err)]
    async fn delete_one(&self, filter: &Filter) -> Result<DeleteOutcome, CollectionError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE id = (
                SELECT id
                FROM documents
                WHERE collection = $1
                    AND body->>'item' IS NOT NULL
                    AND ($2::text IS NULL OR body->>'item' = $2)
                ORDER BY id ASC
                LIMIT 1
            )
            "#,
        )
        .bind(&self.collection)
        .bind(filter.item_name())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_one", e))?;

        Ok(DeleteOutcome {
            deleted: result.rows_affected(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> CollectionError {
    match err {
        sqlx::Error::PoolClosed => CollectionError::Closed,
        sqlx::Error::PoolTimedOut => {
            CollectionError::Transport(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            CollectionError::Transport(format!(
                "database error in {operation} ({code}): {}",
                db_err.message()
            ))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            CollectionError::Decode(format!("{operation}: {err}"))
        }
        other => CollectionError::Transport(format!("sqlx error in {operation}: {other}")),
    }
}

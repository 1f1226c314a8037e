use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
};

use crate::app::dto::ItemQuery;
use crate::app::errors::{self, Operation};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/list", get(list))
        .route("/price", get(price))
        .route("/create", get(create))
        .route("/update", get(update))
        .route("/remove", get(remove))
}

/// One `<name>: $<price>` line per item, sorted by name.
pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let mut items = match services.store().list().await {
        Ok(items) => items,
        Err(e) => return errors::store_error_to_response(Operation::List, e),
    };
    items.sort_by(|a, b| a.name.cmp(&b.name));

    let mut body = String::new();
    for item in &items {
        let _ = writeln!(body, "{item}");
    }
    errors::text_body(StatusCode::OK, body)
}

pub async fn price(
    Extension(services): Extension<Arc<AppServices>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = ItemQuery::from_pairs(pairs);
    let name = match query.item() {
        Ok(name) => name,
        Err(e) => return errors::input_error_to_response(e),
    };

    match services.store().get(name).await {
        Ok(item) => errors::text_response(StatusCode::OK, item.price),
        Err(e) => errors::store_error_to_response(Operation::Find, e),
    }
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = ItemQuery::from_pairs(pairs);
    let (name, price) = match query.item_and_price() {
        Ok(parsed) => parsed,
        Err(e) => return errors::input_error_to_response(e),
    };

    match services.store().create(name, price).await {
        Ok(()) => {
            tracing::info!(item = name, %price, "item created");
            errors::text_response(
                StatusCode::OK,
                format_args!("Created item: {name} at {price} price"),
            )
        }
        Err(e) => errors::store_error_to_response(Operation::Create, e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = ItemQuery::from_pairs(pairs);
    let (name, price) = match query.item_and_price() {
        Ok(parsed) => parsed,
        Err(e) => return errors::input_error_to_response(e),
    };

    match services.store().update(name, price).await {
        Ok(()) => {
            tracing::info!(item = name, %price, "item updated");
            errors::text_response(
                StatusCode::OK,
                format_args!("Updated {name} to {}", price.amount()),
            )
        }
        Err(e) => errors::store_error_to_response(Operation::Update, e),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = ItemQuery::from_pairs(pairs);
    let name = match query.item() {
        Ok(name) => name,
        Err(e) => return errors::input_error_to_response(e),
    };

    match services.store().delete(name).await {
        Ok(()) => {
            tracing::info!(item = name, "item deleted");
            errors::text_response(StatusCode::OK, format_args!("Deleted item: {name}"))
        }
        Err(e) => errors::store_error_to_response(Operation::Delete, e),
    }
}

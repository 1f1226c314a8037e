//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store construction and seeding
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: query parameters and input validation
//! - `errors.rs`: plain-text responses and status mapping

use std::future::Future;
use std::sync::Arc;

use axum::{Extension, Router};
use tokio::net::TcpListener;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router.
pub fn build_app(services: Arc<AppServices>) -> Router {
    routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::request_span))
}

/// Serve until `shutdown` resolves, then drain in-flight requests and close
/// the store.
pub async fn serve<S>(
    listener: TcpListener,
    services: Arc<AppServices>,
    shutdown: S,
) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let app = build_app(services.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("server drained; closing store");
    services.shutdown().await;
    Ok(())
}

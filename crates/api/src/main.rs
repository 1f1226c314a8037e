use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use pricedb_api::app;
use pricedb_infra::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pricedb_observability::init();

    let config = Config::from_env().inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let services = app::services::build_services(&config.store, &shutdown)
        .await
        .inspect_err(|e| tracing::error!(error = %format!("{e:#}"), "start-up failed"))?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        backend = %config.store.backend,
        "listening"
    );

    let token = shutdown.clone();
    app::serve(listener, Arc::new(services), async move { token.cancelled().await }).await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
    token.cancel();
}

//! `rpindex serve`: follow the chain and answer lookups.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::Request;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;

use rpindex_core::{ChainClient, LookupService, SyncDriver, SyncEngine};
use rpindex_server::{router, AppState};

use crate::GlobalArgs;

pub async fn run(args: &GlobalArgs, port: u16, poll_interval_ms: u64) -> Result<()> {
    let config = args.sync_config()?;
    let store = args.open_store().await?;
    let client = Arc::new(
        args.connect_chain()
            .await?
            .with_poll_interval(Duration::from_millis(poll_interval_ms)),
    );

    let engine = Arc::new(SyncEngine::new(config.clone(), client.clone(), store.clone())?);
    let cursor = engine.cursor().await?;
    tracing::info!(cursor, "index opened");

    let driver = Arc::new(SyncDriver::new(engine.clone(), config.retry));
    let heads = client.new_heads().await?;
    tokio::spawn(driver.run(heads));

    let lookup = LookupService::new(client, store);
    let app = router(AppState::new(lookup, engine))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

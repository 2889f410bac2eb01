//! HTTP server hosting the API.
//!
//! Builds the axum router around a [`ReviewService`] and serves it until the
//! cancellation token fires, then drains in-flight requests.

use crate::services::api::api_routes;
use crate::services::review_service::ReviewService;
use axum::Router;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full router with tracing and permissive CORS.
pub fn build_router(service: ReviewService) -> Router {
    api_routes()
        .with_state(service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on `port` until `shutdown` is cancelled.
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(
    port: u16,
    service: ReviewService,
    shutdown: CancellationToken,
) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    log::info!("[server] Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;

    log::info!("[server] Stopped");
    Ok(())
}

//! Static file and health endpoints.

use axum::Router;
use axum::http::Uri;
use axum::routing::get;
use std::path::Path;
use tokio::sync::watch;
use tower_http::services::ServeDir;
use tracing::info;

/// Builds the router: placeholder and health routes, static files for the rest.
pub fn router(static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/sentiment", get(greet))
        .route("/healthz", get(healthz))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
}

/// Placeholder endpoint that echoes the request path.
async fn greet(uri: Uri) -> String {
    format!("Hello, {}!", uri.path().trim_start_matches('/'))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serves until `shutdown` turns true.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(
    port: u16,
    static_dir: &Path,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, static_dir = %static_dir.display(), "http server listening");

    axum::serve(listener, router(static_dir).into_make_service())
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}

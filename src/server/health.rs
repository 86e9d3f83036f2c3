use anyhow::{Context as _, Result};
use axum::{routing::get, Router};
use tracing::info;

use crate::constants::HEALTH_RESPONSE;

async fn health_check() -> &'static str {
    HEALTH_RESPONSE
}

pub fn router() -> Router {
    Router::new().route("/", get(health_check))
}

/// Serve the liveness endpoint until the process exits. Runs beside the
/// polling loop as an independent service; it never touches session state.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind liveness endpoint on {addr}"))?;

    info!("liveness endpoint listening on http://{addr}");

    axum::serve(listener, router().into_make_service())
        .await
        .context("liveness server error")
}

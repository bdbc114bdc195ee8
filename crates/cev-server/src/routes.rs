//! HTTP surface: health probe and the evaluation endpoint.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use cev_core::{BasicResponse, Sample};

use crate::dispatch;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/evaluations", post(evaluate))
}

async fn health() -> Json<BasicResponse> {
    Json(BasicResponse::healthy())
}

async fn evaluate(Json(sample): Json<Sample>) -> Json<BasicResponse> {
    Json(dispatch::evaluate_sample(&sample).await)
}

/// Bind and serve until ctrl-c.
pub async fn serve(addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind evaluation service at {addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve local address")?;
    info!(addr = %local_addr, "evaluation service listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server stopped with error")
}

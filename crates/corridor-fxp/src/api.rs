//! HTTP API for the liquidity provider.
//!
//! Transport-level schema validation and origin authentication happen
//! upstream of these handlers; here the protocol errors map to statuses:
//! classification and gate failures are the caller's fault (4xx), ledger
//! and relay failures are not (5xx).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use corridor_core::messages::{
    CompletionRequest, CompletionResponse, LockedRequest, SetupRequest, SetupResponse,
};

use crate::error::FxpError;
use crate::service::FxProvider;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn status_for(error: &FxpError) -> StatusCode {
    match error {
        FxpError::Core(_) => StatusCode::BAD_REQUEST,
        FxpError::LockMismatch { .. } => StatusCode::BAD_REQUEST,
        FxpError::SecretMismatch(_) => StatusCode::BAD_REQUEST,
        FxpError::Duplicate(_) => StatusCode::CONFLICT,
        FxpError::UnknownPayment(_) => StatusCode::NOT_FOUND,
        FxpError::InsufficientFunds { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        FxpError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FxpError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FxpError::Relay(_) => StatusCode::BAD_GATEWAY,
    }
}

fn reject(error: FxpError) -> (StatusCode, Json<ErrorResponse>) {
    (
        status_for(&error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

async fn handle_setup(
    State(provider): State<Arc<FxProvider>>,
    Json(request): Json<SetupRequest>,
) -> Result<Json<SetupResponse>, (StatusCode, Json<ErrorResponse>)> {
    provider.handle_setup(request).await.map(Json).map_err(reject)
}

async fn handle_locked(
    State(provider): State<Arc<FxProvider>>,
    Json(request): Json<LockedRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    provider
        .handle_locked(request)
        .await
        .map(|()| StatusCode::CREATED)
        .map_err(reject)
}

async fn handle_completion(
    State(provider): State<Arc<FxProvider>>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>, (StatusCode, Json<ErrorResponse>)> {
    provider
        .handle_completion(request)
        .await
        .map(Json)
        .map_err(reject)
}

pub fn build_router(provider: Arc<FxProvider>) -> Router {
    Router::new()
        .route("/payment/setup", post(handle_setup))
        .route("/payment/locked", post(handle_locked))
        .route("/payment/completion", post(handle_completion))
        .with_state(provider)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    provider: Arc<FxProvider>,
) -> std::io::Result<()> {
    let app = build_router(provider);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "liquidity provider API started");
    axum::serve(listener, app).await
}

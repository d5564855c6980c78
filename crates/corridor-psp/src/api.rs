//! HTTP API for the originating service.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use corridor_core::messages::{DiscoveryRequest, DiscoveryResponse};
use corridor_core::{Currency, HashLock, LockId, PaymentId, Secret, WalletAddress};
use corridor_store::SecretRecord;

use crate::error::PspError;
use crate::service::Psp;

/// Bearer credential required on the secrets-by-address endpoint.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

pub struct PspState {
    pub psp: Arc<Psp>,
    /// Shared token guarding the sender-visible settlement records.
    pub secrets_token: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wire shape of one sender-visible settlement record.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRecordView {
    pub target_address: WalletAddress,
    pub source_address: WalletAddress,
    pub source_currency: Currency,
    pub amount: u128,
    pub hash: HashLock,
    pub secret: Secret,
    pub payment_id: PaymentId,
    pub created_at: DateTime<Utc>,
    pub lock_id: Option<LockId>,
}

impl From<SecretRecord> for SecretRecordView {
    fn from(record: SecretRecord) -> Self {
        Self {
            target_address: record.recipient,
            source_address: record.sender,
            source_currency: record.source_currency,
            amount: record.amount,
            hash: record.hash,
            secret: record.secret,
            payment_id: record.payment_id,
            created_at: record.created_at,
            lock_id: record.lock_id,
        }
    }
}

fn reject(error: PspError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        PspError::Forbidden => StatusCode::FORBIDDEN,
        PspError::Core(_) | PspError::Validation(_) => StatusCode::BAD_REQUEST,
        PspError::Store(corridor_store::StoreError::DuplicatePayment(_)) => StatusCode::CONFLICT,
        PspError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

async fn handle_discovery(
    State(state): State<Arc<PspState>>,
    Json(request): Json<DiscoveryRequest>,
) -> Result<Json<DiscoveryResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.psp.handle_discovery(request).map(Json).map_err(reject)
}

async fn handle_secrets_by_address(
    State(state): State<Arc<PspState>>,
    Path(address): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<SecretRecordView>>, (StatusCode, Json<ErrorResponse>)> {
    let authorized = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == state.secrets_token)
        .unwrap_or(false);
    if !authorized {
        return Err(reject(PspError::Forbidden));
    }

    let records = state
        .psp
        .secrets_by_address(&WalletAddress::new(address))
        .map_err(reject)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

pub fn build_router(state: Arc<PspState>) -> Router {
    Router::new()
        .route("/payment/discovery", post(handle_discovery))
        .route("/secret/{address}", get(handle_secrets_by_address))
        .with_state(state)
}

pub async fn start_api_server(listen_addr: SocketAddr, state: Arc<PspState>) -> std::io::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "originating service API started");
    axum::serve(listener, app).await
}

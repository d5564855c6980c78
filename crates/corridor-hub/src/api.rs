//! Hub HTTP surface: quoting plus authenticated forwarding.
//!
//! Every endpoint requires the shared-secret corridor header; the
//! forwarding endpoints additionally resolve the forward-to-host header
//! through the directory. Forwarded Setup and Completion responses must
//! echo the instruction's payment id before the hub passes them back.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use corridor_core::messages::{
    CompletionRequest, CompletionResponse, DiscoveryRequest, DiscoveryResponse, QuoteRequest,
    QuoteResponse, SetupRequest, SetupResponse, CORRIDOR_HEADER, FORWARD_TO_HOST_HEADER,
};
use corridor_core::HostName;

use crate::config::HubConfig;
use crate::directory::HostDirectory;
use crate::error::HubError;
use crate::quote::QuoteEngine;

pub struct HubState {
    request_token: String,
    response_token: String,
    directory: HostDirectory,
    engine: QuoteEngine,
    client: reqwest::Client,
}

impl HubState {
    pub fn new(config: HubConfig) -> Self {
        let engine = QuoteEngine::from_config(&config);
        let directory = HostDirectory::new(config.hosts.clone());
        Self {
            request_token: config.request_token,
            response_token: config.response_token,
            directory,
            engine,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = match &self {
            HubError::MissingAuthHeader | HubError::InvalidAuthHeader => StatusCode::FORBIDDEN,
            HubError::MissingForwardHost
            | HubError::UnknownHost(_)
            | HubError::UnsupportedPair { .. }
            | HubError::InvalidQuote(_) => StatusCode::BAD_REQUEST,
            HubError::Upstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            HubError::PaymentIdMismatch | HubError::InvalidUpstreamResponse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            HubError::Transport(_) => StatusCode::BAD_GATEWAY,
        };
        tracing::warn!(%status, error = %self, "hub request rejected");
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

fn authorize(state: &HubState, headers: &HeaderMap) -> Result<(), HubError> {
    let value = headers
        .get(CORRIDOR_HEADER)
        .ok_or(HubError::MissingAuthHeader)?;
    if value.to_str().map_err(|_| HubError::InvalidAuthHeader)? != state.request_token {
        return Err(HubError::InvalidAuthHeader);
    }
    Ok(())
}

fn forward_host(headers: &HeaderMap) -> Result<HostName, HubError> {
    let value = headers
        .get(FORWARD_TO_HOST_HEADER)
        .ok_or(HubError::MissingForwardHost)?;
    let raw = value.to_str().map_err(|_| HubError::MissingForwardHost)?;
    if raw.is_empty() {
        return Err(HubError::MissingForwardHost);
    }
    Ok(HostName::new(raw))
}

async fn forward<Req, Resp>(
    state: &HubState,
    host: &HostName,
    path: &str,
    body: &Req,
) -> Result<Resp, HubError>
where
    Req: serde::Serialize,
    Resp: serde::de::DeserializeOwned,
{
    let base = state
        .directory
        .lookup(host)
        .ok_or_else(|| HubError::UnknownHost(host.to_string()))?;
    let url = format!("{base}{path}");
    tracing::info!(%url, %host, "forwarding message");

    let response = state
        .client
        .post(&url)
        .json(body)
        .send()
        .await
        .map_err(|e| HubError::Transport(e.to_string()))?;
    if !response.status().is_success() {
        return Err(HubError::Upstream {
            status: response.status().as_u16(),
        });
    }
    response
        .json()
        .await
        .map_err(|e| HubError::InvalidUpstreamResponse(e.to_string()))
}

async fn handle_quote(
    State(state): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, HubError> {
    authorize(&state, &headers)?;
    state.engine.quote(&request).map(Json)
}

async fn handle_discovery(
    State(state): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(request): Json<DiscoveryRequest>,
) -> Result<Json<DiscoveryResponse>, HubError> {
    authorize(&state, &headers)?;
    let host = forward_host(&headers)?;
    let response: DiscoveryResponse =
        forward(&state, &host, "/payment/discovery", &request).await?;
    Ok(Json(response))
}

async fn handle_setup(
    State(state): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(request): Json<SetupRequest>,
) -> Result<Json<SetupResponse>, HubError> {
    authorize(&state, &headers)?;
    let host = forward_host(&headers)?;
    let response: SetupResponse = forward(&state, &host, "/payment/setup", &request).await?;
    if response.payment_id != request.payment_instruction.payment_id {
        return Err(HubError::PaymentIdMismatch);
    }
    Ok(Json(response))
}

async fn handle_completion(
    State(state): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>, HubError> {
    authorize(&state, &headers)?;
    let host = forward_host(&headers)?;
    let response: CompletionResponse =
        forward(&state, &host, "/payment/completion", &request).await?;
    if response.payment_id != request.payment_instruction.payment_id {
        return Err(HubError::PaymentIdMismatch);
    }
    Ok(Json(response))
}

async fn stamp_response(
    State(state): State<Arc<HubState>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&state.response_token) {
        response.headers_mut().insert(CORRIDOR_HEADER, value);
    }
    response
}

pub fn build_router(state: Arc<HubState>) -> Router {
    Router::new()
        .route("/quote", post(handle_quote))
        .route("/payment/discovery", post(handle_discovery))
        .route("/payment/setup", post(handle_setup))
        .route("/payment/completion", post(handle_completion))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            stamp_response,
        ))
        .with_state(state)
}

pub async fn start_api_server(listen_addr: SocketAddr, state: Arc<HubState>) -> std::io::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "hub API started");
    axum::serve(listener, app).await
}

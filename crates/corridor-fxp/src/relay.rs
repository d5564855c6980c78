//! Outbound protocol delivery.
//!
//! Setup and Completion travel through the hub with a forward-to-host
//! header; Locked is delivered provider-to-provider under the peer base
//! URL. The trait seam lets tests wire providers to each other directly.

use async_trait::async_trait;
use reqwest::StatusCode;

use corridor_core::messages::{
    CompletionRequest, CompletionResponse, LockedRequest, SetupRequest, SetupResponse,
    CORRIDOR_HEADER, FORWARD_TO_HOST_HEADER,
};
use corridor_core::HostName;

/// Relay-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay transport error: {0}")]
    Transport(String),

    #[error("relay rejected with status {status}")]
    Rejected { status: u16 },

    #[error("invalid relay response: {0}")]
    InvalidResponse(String),
}

/// Delivery of protocol messages to the hub and to peer providers.
#[async_trait]
pub trait ProtocolRelay: Send + Sync {
    /// Relay a Setup message through the hub toward `forward_to`.
    async fn relay_setup(
        &self,
        forward_to: &HostName,
        request: &SetupRequest,
    ) -> Result<SetupResponse, RelayError>;

    /// Relay a Completion message through the hub toward `forward_to`.
    async fn relay_completion(
        &self,
        forward_to: &HostName,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, RelayError>;

    /// Deliver a Locked notification directly to a peer provider.
    async fn send_locked(&self, peer: &HostName, request: &LockedRequest)
        -> Result<(), RelayError>;
}

/// HTTP relay used in production wiring.
pub struct HttpRelay {
    hub_url: String,
    peer_base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl HttpRelay {
    pub fn new(
        hub_url: impl Into<String>,
        peer_base_url: impl Into<String>,
        auth_header: impl Into<String>,
    ) -> Self {
        Self {
            hub_url: hub_url.into().trim_end_matches('/').to_string(),
            peer_base_url: peer_base_url.into().trim_end_matches('/').to_string(),
            auth_header: auth_header.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_via_hub<Req: serde::Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        forward_to: &HostName,
        request: &Req,
    ) -> Result<Resp, RelayError> {
        let url = format!("{}{}", self.hub_url, path);
        let response = self
            .client
            .post(&url)
            .header(CORRIDOR_HEADER, &self.auth_header)
            .header(FORWARD_TO_HOST_HEADER, forward_to.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        if response.status() != StatusCode::OK {
            return Err(RelayError::Rejected {
                status: response.status().as_u16(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ProtocolRelay for HttpRelay {
    async fn relay_setup(
        &self,
        forward_to: &HostName,
        request: &SetupRequest,
    ) -> Result<SetupResponse, RelayError> {
        self.post_via_hub("/payment/setup", forward_to, request)
            .await
    }

    async fn relay_completion(
        &self,
        forward_to: &HostName,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, RelayError> {
        self.post_via_hub("/payment/completion", forward_to, request)
            .await
    }

    async fn send_locked(
        &self,
        peer: &HostName,
        request: &LockedRequest,
    ) -> Result<(), RelayError> {
        let url = format!(
            "{}/{}/payment/locked",
            self.peer_base_url,
            peer.instance()
        );
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        if response.status() != StatusCode::CREATED {
            return Err(RelayError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

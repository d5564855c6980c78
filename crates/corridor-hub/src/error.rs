use corridor_core::Currency;

/// Hub errors.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("missing required corridor header")]
    MissingAuthHeader,

    #[error("invalid corridor header")]
    InvalidAuthHeader,

    #[error("missing required forward-to-host header")]
    MissingForwardHost,

    #[error("unknown forward host: {0}")]
    UnknownHost(String),

    #[error("currency pair not supported: {src}/{target}")]
    UnsupportedPair { src: Currency, target: Currency },

    #[error("invalid quote request: {0}")]
    InvalidQuote(String),

    #[error("upstream service rejected the request with status {status}")]
    Upstream { status: u16 },

    #[error("upstream response names a different payment")]
    PaymentIdMismatch,

    #[error("invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),

    #[error("relay transport error: {0}")]
    Transport(String),
}

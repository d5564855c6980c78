/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unsupported route: {0}")]
    UnsupportedRoute(String),

    #[error("instruction validation failed: {0}")]
    Validation(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("unknown currency code: {0}")]
    InvalidCurrency(String),

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),
}

use corridor_core::CoreError;
use corridor_store::StoreError;

/// Originating-service errors.
#[derive(Debug, thiserror::Error)]
pub enum PspError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("missing or invalid auth credential")]
    Forbidden,

    #[error("record store failure: {0}")]
    Store(#[from] StoreError),
}

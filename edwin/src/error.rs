//! Unified error types for the edwin toolkit.

pub use crate::wallet::WalletError;

/// Result type alias for edwin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the edwin toolkit.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Wallet construction, signing, submission or query error.
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

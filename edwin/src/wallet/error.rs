//! Error types for wallet operations.

/// The error type for wallet construction, signing, submission and
/// balance-query operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WalletError {
    /// The supplied secret key could not be decoded.
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// The supplied address or account id could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// An external signing provider was supplied without an active session.
    #[error("provider not connected")]
    ProviderNotConnected,

    /// The external signing provider lost its session after construction.
    #[error("provider disconnected")]
    ProviderDisconnected,

    /// The operation is not available on this wallet variant.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// The wallet's address does not appear in the transaction's account
    /// list, so no balance delta can be attributed to it.
    #[error("account {address} not present in transaction {signature}")]
    AccountNotInTransaction {
        /// The wallet address that was looked up.
        address: String,
        /// The transaction that was inspected.
        signature: String,
    },

    /// The transaction could not be fetched after bounded retries.
    #[error("transaction {0} not found")]
    TransactionNotFound(String),

    /// The relay rejected the submission.
    #[error("relay submission failed: {0}")]
    RelaySubmission(String),

    /// The transaction executed on chain and failed.
    #[error("transaction {signature} failed on chain: {reason}")]
    TransactionFailed {
        /// The submitted transaction signature.
        signature: String,
        /// The chain-reported failure reason.
        reason: String,
    },

    /// No terminal confirmation status was observed within the poll budget.
    #[error("confirmation timed out after {elapsed_ms} ms for {signature}")]
    ConfirmationTimedOut {
        /// The polled transaction signature.
        signature: String,
        /// Elapsed time when the budget ran out.
        elapsed_ms: u64,
    },

    /// The transaction payload could not be signed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// RPC transport or node error.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WalletError {
    /// Create an invalid key format error.
    #[must_use]
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKeyFormat(msg.into())
    }

    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a relay submission error.
    #[must_use]
    pub fn relay(msg: impl Into<String>) -> Self {
        Self::RelaySubmission(msg.into())
    }

    /// Create a signing error.
    #[must_use]
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create an RPC error.
    #[must_use]
    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::Rpc(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error is worth retrying at the caller's discretion.
    ///
    /// Construction-time validation errors and contract violations are
    /// permanent; transport errors and lookup misses may be transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::TransactionNotFound(_))
    }
}

impl From<solana_client::client_error::ClientError> for WalletError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Self::Rpc(err.to_string())
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Rpc("request timed out".into())
        } else {
            Self::Rpc(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(WalletError::rpc("connection reset").is_retryable());
        assert!(WalletError::TransactionNotFound("sig".into()).is_retryable());
        assert!(!WalletError::invalid_key("bad base58").is_retryable());
        assert!(!WalletError::UnsupportedOperation("read-only wallet").is_retryable());
    }

    #[test]
    fn test_display_carries_context() {
        let err = WalletError::AccountNotInTransaction {
            address: "abc".into(),
            signature: "sig".into(),
        };
        let text = err.to_string();
        assert!(text.contains("abc"));
        assert!(text.contains("sig"));
    }
}

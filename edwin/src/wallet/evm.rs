//! EVM-compatible wallet client.
//!
//! Key-backed wallet for EVM chains (Base by default), built on [`alloy`]'s
//! local signer and HTTP provider. Balances are returned in wei; message
//! signing follows EIP-191 `personal_sign`.

use alloy::network::Ethereum;
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signer, SignerSync};
use std::sync::Arc;
use tracing::info;

use super::error::WalletError;
use crate::config::EvmConfig;

/// Builder for constructing an [`EvmWallet`].
///
/// Created by [`EvmWallet::builder`]. `private_key` and `rpc_url` are
/// required; the chain id defaults to Base and is committed into every
/// signature rather than detected over the network.
#[derive(Debug, Default)]
pub struct EvmWalletBuilder {
    /// Raw private key hex string.
    private_key: Option<String>,
    /// JSON-RPC endpoint URL.
    rpc_url: Option<String>,
    /// Chain id (Base when not set).
    chain_id: Option<u64>,
}

impl EvmWalletBuilder {
    /// Set the private key (hex string, with or without 0x prefix).
    #[must_use]
    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Set the JSON-RPC endpoint URL.
    #[must_use]
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set the chain id explicitly.
    #[must_use]
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Apply endpoint and chain id from a config object.
    #[must_use]
    pub fn config(self, config: &EvmConfig) -> Self {
        self.rpc_url(config.rpc_url.clone()).chain_id(config.chain_id)
    }

    /// Build the [`EvmWallet`].
    pub async fn build(self) -> Result<EvmWallet, WalletError> {
        let rpc_url = self
            .rpc_url
            .ok_or_else(|| WalletError::config("rpc_url is required"))?;
        let key = self
            .private_key
            .ok_or_else(|| WalletError::config("private_key is required"))?;

        let mut signer = signer_from_private_key(&key)?;
        let chain_id = self.chain_id.unwrap_or_else(|| EvmConfig::default().chain_id);
        signer.set_chain_id(Some(chain_id));

        let address = signer.address();

        let provider: DynProvider<Ethereum> = ProviderBuilder::new()
            .wallet(signer.clone())
            .connect(&rpc_url)
            .await
            .map_err(|e| WalletError::rpc(format!("failed to connect to '{rpc_url}': {e}")))?
            .erased();

        info!(address = %address, chain_id = chain_id, "EVM wallet initialized");

        Ok(EvmWallet {
            signer,
            provider: Arc::new(provider),
            address,
            chain_id,
        })
    }
}

/// Create a signer from a raw private key hex string.
fn signer_from_private_key(key: &str) -> Result<PrivateKeySigner, WalletError> {
    let key = key.strip_prefix("0x").unwrap_or(key);
    key.parse::<PrivateKeySigner>()
        .map_err(|e| WalletError::invalid_key(format!("invalid private key: {e}")))
}

/// An EVM wallet client.
///
/// # Construction
///
/// ```rust,ignore
/// let wallet = EvmWallet::builder()
///     .private_key("0xabc...")
///     .config(&EvmConfig::from_env())
///     .build()
///     .await?;
/// let balance = wallet.balance().await?;
/// ```
pub struct EvmWallet {
    /// Local signer for transaction and message signing.
    signer: PrivateKeySigner,
    /// Type-erased provider for RPC calls.
    provider: Arc<DynProvider<Ethereum>>,
    /// The wallet's address.
    address: Address,
    /// The chain id committed into signatures.
    chain_id: u64,
}

impl std::fmt::Debug for EvmWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWallet")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl EvmWallet {
    /// Create a builder for constructing an [`EvmWallet`].
    #[must_use]
    pub fn builder() -> EvmWalletBuilder {
        EvmWalletBuilder::default()
    }

    /// Construct from a private key and config object.
    pub async fn from_config(key: &str, config: &EvmConfig) -> Result<Self, WalletError> {
        Self::builder().private_key(key).config(config).build().await
    }

    /// Get the wallet's address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Get the checksummed address string.
    #[must_use]
    pub fn address_string(&self) -> String {
        self.address.to_checksum(None)
    }

    /// Get the chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get the native token balance for the wallet's address, in wei.
    pub async fn balance(&self) -> Result<U256, WalletError> {
        self.balance_of(self.address).await
    }

    /// Get the native token balance for any address, in wei.
    pub async fn balance_of(&self, address: Address) -> Result<U256, WalletError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| WalletError::rpc(format!("failed to get balance: {e}")))
    }

    /// Get the current block number.
    pub async fn block_number(&self) -> Result<u64, WalletError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| WalletError::rpc(format!("failed to get block number: {e}")))
    }

    /// Sign an arbitrary message (EIP-191 `personal_sign`).
    pub async fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
        let sig = self
            .signer
            .sign_message(message)
            .await
            .map_err(|e| WalletError::signing(format!("message signing failed: {e}")))?;
        Ok(format!(
            "0x{}",
            alloy::primitives::hex::encode(sig.as_bytes())
        ))
    }

    /// Sign an arbitrary message synchronously.
    pub fn sign_message_sync(&self, message: &[u8]) -> Result<String, WalletError> {
        let sig = self
            .signer
            .sign_message_sync(message)
            .map_err(|e| WalletError::signing(format!("message signing failed: {e}")))?;
        Ok(format!(
            "0x{}",
            alloy::primitives::hex::encode(sig.as_bytes())
        ))
    }

    /// Send native token to an address. Returns the transaction hash once
    /// the transaction lands.
    pub async fn transfer(&self, to: Address, value: U256) -> Result<String, WalletError> {
        use alloy::network::TransactionBuilder;
        use alloy::rpc::types::TransactionRequest;

        let tx = TransactionRequest::default().with_to(to).with_value(value);

        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| WalletError::rpc(format!("send failed: {e}")))?
            .get_receipt()
            .await
            .map_err(|e| WalletError::rpc(format!("receipt failed: {e}")))?;

        Ok(format!("{:#x}", receipt.transaction_hash))
    }

    /// Get a reference to the underlying signer.
    #[must_use]
    pub const fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Get a reference to the underlying provider.
    #[must_use]
    pub fn provider(&self) -> &DynProvider<Ethereum> {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder_requires_credentials() {
        let err = EvmWallet::builder()
            .rpc_url("http://localhost:8545")
            .build()
            .await
            .expect_err("missing key");
        assert!(matches!(err, WalletError::Config(_)));

        let err = EvmWallet::builder()
            .private_key("0x01")
            .build()
            .await
            .expect_err("missing rpc url");
        assert!(matches!(err, WalletError::Config(_)));
    }

    #[tokio::test]
    async fn test_builder_rejects_malformed_key() {
        let err = EvmWallet::builder()
            .private_key("not-a-key")
            .rpc_url("http://localhost:8545")
            .build()
            .await
            .expect_err("bad key");
        assert!(matches!(err, WalletError::InvalidKeyFormat(_)));
    }

    #[tokio::test]
    async fn test_derived_address_matches_signer() {
        let signer = PrivateKeySigner::random();
        let key_hex = alloy::primitives::hex::encode(signer.to_bytes());

        let wallet = EvmWallet::builder()
            .private_key(key_hex)
            .rpc_url("http://localhost:8545")
            .build()
            .await
            .expect("wallet builds without network access");

        assert_eq!(wallet.address(), signer.address());
        // Chain id defaults to Base.
        assert_eq!(wallet.chain_id(), 8453);
    }

    #[tokio::test]
    async fn test_sign_message_sync_shape() {
        let signer = PrivateKeySigner::random();
        let key_hex = alloy::primitives::hex::encode(signer.to_bytes());
        let wallet = EvmWallet::builder()
            .private_key(key_hex)
            .rpc_url("http://localhost:8545")
            .build()
            .await
            .expect("wallet");

        let signature = wallet.sign_message_sync(b"edwin").expect("signing succeeds");
        assert!(signature.starts_with("0x"));
        // 65 signature bytes, hex-encoded, plus the prefix.
        assert_eq!(signature.len(), 132);
    }
}

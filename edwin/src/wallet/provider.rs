//! Capability handle for externally-managed signers.
//!
//! Browser-extension wallets (Phantom and friends) keep key material inside
//! the host environment; the toolkit only ever holds a handle and delegates
//! every operation through it. The host owns the provider's lifecycle — a
//! session can disappear at any time, which is why every delegated call is
//! preceded by an [`ExternalSigner::is_connected`] check.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use super::error::WalletError;
use super::solana::SolanaTransaction;

/// An externally-managed signing provider.
///
/// Implementations bridge to a host wallet (browser extension, hardware
/// device, remote signer). All methods may be called concurrently; the
/// provider is expected to serialize access to its session internally.
#[async_trait]
pub trait ExternalSigner: Send + Sync {
    /// Whether the provider currently holds an active session.
    fn is_connected(&self) -> bool;

    /// The public identity of the active session, if any.
    fn public_key(&self) -> Option<Pubkey>;

    /// Sign the transaction in place with the provider's key.
    async fn sign_transaction(&self, tx: &mut SolanaTransaction) -> Result<(), WalletError>;

    /// Sign an arbitrary message.
    async fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError>;

    /// Sign and submit the transaction, returning its signature.
    async fn send_transaction(&self, tx: &mut SolanaTransaction) -> Result<Signature, WalletError>;
}

//! Solana wallet client.
//!
//! [`SolanaWallet`] unifies three signing capabilities behind one surface,
//! fixed at construction:
//!
//! ```text
//! SolanaWallet
//!   ├── Keypair   — owns a decoded ed25519 secret; signs locally, submits
//!   │               through the low-latency relay
//!   ├── External  — delegates every operation to a host-managed provider
//!   │               (browser extension, hardware device)
//!   └── ReadOnly  — public identity only; every mutating operation fails
//!                   with `UnsupportedOperation` before any network call
//! ```
//!
//! Callers branch on [`SolanaWallet::can_sign`] before attempting mutating
//! operations; the read-only variant failing fast is a contract, not a
//! degraded fallback.

mod balance;

use std::sync::Arc;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};
use tracing::info;

use crate::config::{PollConfig, RelayConfig, RetryConfig, SolanaConfig};
use crate::confirm::{ConfirmationOutcome, ConfirmationPoller, StatusSource, TxStatus};
use crate::registry::TokenRegistry;
use crate::relay::JitoRelay;

use super::error::WalletError;
use super::provider::ExternalSigner;

use async_trait::async_trait;

/// A transaction payload accepted by the wallet's signing and sending
/// surface. The two encodings are distinguished structurally; the legacy
/// form is still open to relay enrichment (tip, blockhash, fee payer)
/// while the versioned form arrives fully compiled.
#[derive(Debug, Clone)]
pub enum SolanaTransaction {
    /// Single-payer transaction in the original wire encoding.
    Legacy(Transaction),
    /// v0 transaction with address-lookup support.
    Versioned(VersionedTransaction),
}

impl SolanaTransaction {
    /// Whether this payload uses the versioned encoding.
    #[must_use]
    pub const fn is_versioned(&self) -> bool {
        matches!(self, Self::Versioned(_))
    }
}

impl From<Transaction> for SolanaTransaction {
    fn from(tx: Transaction) -> Self {
        Self::Legacy(tx)
    }
}

impl From<VersionedTransaction> for SolanaTransaction {
    fn from(tx: VersionedTransaction) -> Self {
        Self::Versioned(tx)
    }
}

/// The signing capability fixed at wallet construction.
enum SolanaSigner {
    /// Exclusively owned secret key material.
    Keypair(Keypair),
    /// Capability handle to a host-managed provider.
    External(Arc<dyn ExternalSigner>),
    /// Public identity only.
    ReadOnly,
}

impl std::fmt::Debug for SolanaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never reach logs.
        match self {
            Self::Keypair(_) => f.write_str("Keypair"),
            Self::External(_) => f.write_str("External"),
            Self::ReadOnly => f.write_str("ReadOnly"),
        }
    }
}

/// Builder for constructing a [`SolanaWallet`].
///
/// Exactly one credential — `private_key`, `provider` or `read_only` —
/// must be supplied. Configuration defaults to mainnet endpoints; no
/// network call happens at construction time.
#[derive(Default)]
pub struct SolanaWalletBuilder {
    private_key: Option<String>,
    provider: Option<Arc<dyn ExternalSigner>>,
    read_only: Option<Pubkey>,
    config: Option<SolanaConfig>,
    relay: Option<RelayConfig>,
    poll: Option<PollConfig>,
    retry: Option<RetryConfig>,
    registry: Option<TokenRegistry>,
}

impl std::fmt::Debug for SolanaWalletBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaWalletBuilder")
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl SolanaWalletBuilder {
    /// Set a base58-encoded 64-byte secret key.
    #[must_use]
    pub fn private_key(mut self, encoded: impl Into<String>) -> Self {
        self.private_key = Some(encoded.into());
        self
    }

    /// Set an externally-managed signing provider.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn ExternalSigner>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set a public identity for a read-only wallet.
    #[must_use]
    pub const fn read_only(mut self, pubkey: Pubkey) -> Self {
        self.read_only = Some(pubkey);
        self
    }

    /// Set the RPC connection configuration.
    #[must_use]
    pub fn config(mut self, config: SolanaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the relay submission configuration.
    #[must_use]
    pub fn relay(mut self, relay: RelayConfig) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Set the confirmation poll cadence and budget.
    #[must_use]
    pub const fn poll(mut self, poll: PollConfig) -> Self {
        self.poll = Some(poll);
        self
    }

    /// Set the retry policy for transaction lookups.
    #[must_use]
    pub const fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the token symbol registry.
    #[must_use]
    pub fn registry(mut self, registry: TokenRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the [`SolanaWallet`].
    pub fn build(self) -> Result<SolanaWallet, WalletError> {
        let credentials = usize::from(self.private_key.is_some())
            + usize::from(self.provider.is_some())
            + usize::from(self.read_only.is_some());
        if credentials != 1 {
            return Err(WalletError::config(
                "exactly one of private_key, provider or read_only is required",
            ));
        }

        let (pubkey, signer) = if let Some(encoded) = self.private_key {
            let keypair = decode_keypair(&encoded)?;
            (keypair.pubkey(), SolanaSigner::Keypair(keypair))
        } else if let Some(provider) = self.provider {
            let pubkey = provider
                .is_connected()
                .then(|| provider.public_key())
                .flatten()
                .ok_or(WalletError::ProviderNotConnected)?;
            (pubkey, SolanaSigner::External(provider))
        } else if let Some(pubkey) = self.read_only {
            (pubkey, SolanaSigner::ReadOnly)
        } else {
            unreachable!("credential count checked above")
        };

        let wallet = SolanaWallet {
            pubkey,
            signer,
            config: self.config.unwrap_or_default(),
            relay: JitoRelay::new(self.relay.unwrap_or_default()),
            poll: self.poll.unwrap_or_default(),
            retry: self.retry.unwrap_or_default(),
            registry: self.registry.unwrap_or_else(TokenRegistry::mainnet),
        };
        info!(address = %wallet.pubkey, signer = ?wallet.signer, "Solana wallet initialized");
        Ok(wallet)
    }
}

/// A Solana wallet client.
pub struct SolanaWallet {
    pubkey: Pubkey,
    signer: SolanaSigner,
    config: SolanaConfig,
    relay: JitoRelay,
    poll: PollConfig,
    retry: RetryConfig,
    registry: TokenRegistry,
}

impl std::fmt::Debug for SolanaWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaWallet")
            .field("address", &self.pubkey)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl SolanaWallet {
    /// Create a builder for constructing a [`SolanaWallet`].
    #[must_use]
    pub fn builder() -> SolanaWalletBuilder {
        SolanaWalletBuilder::default()
    }

    /// Construct a keypair-backed wallet from a base58-encoded 64-byte
    /// secret, with default configuration.
    pub fn from_private_key(encoded: &str) -> Result<Self, WalletError> {
        Self::builder().private_key(encoded).build()
    }

    /// Construct a read-only wallet for the given public identity, with
    /// default configuration. Never fails: the typed `Pubkey` carries no
    /// malformed states, and every mutating operation on the resulting
    /// wallet fails by contract.
    #[must_use]
    pub fn read_only(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            signer: SolanaSigner::ReadOnly,
            config: SolanaConfig::default(),
            relay: JitoRelay::new(RelayConfig::default()),
            poll: PollConfig::default(),
            retry: RetryConfig::default(),
            registry: TokenRegistry::mainnet(),
        }
    }

    /// Construct a wallet backed by an externally-managed provider, with
    /// default configuration. Fails with `ProviderNotConnected` if the
    /// handle reports no active session or no public identity.
    pub fn from_external(provider: Arc<dyn ExternalSigner>) -> Result<Self, WalletError> {
        Self::builder().provider(provider).build()
    }

    /// Parse a base58 address. Unlike [`Self::read_only`], this validates
    /// eagerly and fails on malformed input.
    pub fn parse_pubkey(address: &str) -> Result<Pubkey, WalletError> {
        address
            .parse::<Pubkey>()
            .map_err(|e| WalletError::invalid_address(format!("'{address}': {e}")))
    }

    /// The wallet's public key.
    #[must_use]
    pub const fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    /// The wallet's base58 address string.
    #[must_use]
    pub fn address(&self) -> String {
        self.pubkey.to_string()
    }

    /// Whether this wallet can sign. `false` exactly for read-only wallets.
    #[must_use]
    pub const fn can_sign(&self) -> bool {
        !matches!(self.signer, SolanaSigner::ReadOnly)
    }

    /// An RPC connection using the wallet's configured endpoint and
    /// commitment level.
    #[must_use]
    pub fn connection(&self) -> RpcClient {
        self.connection_with(None, None)
    }

    /// An RPC connection with optional per-call endpoint and commitment
    /// overrides, falling back to the wallet's configuration.
    #[must_use]
    pub fn connection_with(
        &self,
        endpoint: Option<&str>,
        commitment: Option<CommitmentConfig>,
    ) -> RpcClient {
        RpcClient::new_with_commitment(
            endpoint.unwrap_or(&self.config.rpc_url).to_string(),
            commitment.unwrap_or(self.config.commitment),
        )
    }

    /// Look up a token mint by symbol. Best-effort; `None` on a miss.
    #[must_use]
    pub fn token_address(&self, symbol: &str) -> Option<Pubkey> {
        self.registry.get(symbol)
    }

    /// Sign the transaction in place, appending or replacing this wallet's
    /// signature over the existing payload. Supports both encodings.
    pub async fn sign_transaction(&self, tx: &mut SolanaTransaction) -> Result<(), WalletError> {
        match &self.signer {
            SolanaSigner::Keypair(keypair) => sign_in_place(keypair, tx),
            SolanaSigner::External(provider) => {
                ensure_connected(provider.as_ref())?;
                provider.sign_transaction(tx).await
            }
            SolanaSigner::ReadOnly => Err(WalletError::UnsupportedOperation("read-only wallet")),
        }
    }

    /// Sign a batch sequentially. The first failure aborts the call and no
    /// later transaction in the batch is attempted; earlier entries keep
    /// their signatures.
    pub async fn sign_all_transactions(
        &self,
        txs: &mut [SolanaTransaction],
    ) -> Result<(), WalletError> {
        for tx in txs.iter_mut() {
            self.sign_transaction(tx).await?;
        }
        Ok(())
    }

    /// Sign an arbitrary message with the wallet's key.
    pub async fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        match &self.signer {
            SolanaSigner::Keypair(keypair) => Ok(keypair.sign_message(message)),
            SolanaSigner::External(provider) => {
                ensure_connected(provider.as_ref())?;
                provider.sign_message(message).await
            }
            SolanaSigner::ReadOnly => Err(WalletError::UnsupportedOperation("read-only wallet")),
        }
    }

    /// Sign and submit the transaction, returning its signature string.
    ///
    /// Keypair wallets submit through the configured low-latency relay,
    /// which enriches legacy payloads (tip, fresh blockhash, fee payer)
    /// before signing with the wallet key and any supplied co-signers.
    /// Provider-backed wallets delegate submission to the host.
    pub async fn send_transaction(
        &self,
        tx: &mut SolanaTransaction,
        co_signers: &[&Keypair],
    ) -> Result<String, WalletError> {
        match &self.signer {
            SolanaSigner::Keypair(keypair) => {
                let rpc = self.connection();
                self.relay.send(&rpc, tx, keypair, co_signers).await
            }
            SolanaSigner::External(provider) => {
                ensure_connected(provider.as_ref())?;
                provider.send_transaction(tx).await.map(|sig| sig.to_string())
            }
            SolanaSigner::ReadOnly => Err(WalletError::UnsupportedOperation("read-only wallet")),
        }
    }

    /// Poll the submitted transaction to a terminal outcome using the
    /// wallet's configured cadence and budget.
    pub async fn wait_for_confirmation(
        &self,
        signature: &str,
    ) -> Result<ConfirmationOutcome, WalletError> {
        self.wait_for_confirmation_with(signature, self.poll).await
    }

    /// Poll with a caller-supplied cadence and budget.
    pub async fn wait_for_confirmation_with(
        &self,
        signature: &str,
        poll: PollConfig,
    ) -> Result<ConfirmationOutcome, WalletError> {
        if !self.can_sign() {
            return Err(WalletError::UnsupportedOperation("read-only wallet"));
        }
        // Reject malformed ids before the first network call.
        signature
            .parse::<Signature>()
            .map_err(|e| WalletError::invalid_address(format!("'{signature}': {e}")))?;

        let source = SolanaStatusSource {
            client: self.connection(),
        };
        Ok(ConfirmationPoller::new(poll).wait(&source, signature).await)
    }
}

/// Status source backed by `getSignatureStatuses`.
struct SolanaStatusSource {
    client: RpcClient,
}

#[async_trait]
impl StatusSource for SolanaStatusSource {
    async fn status(&self, id: &str) -> Result<Option<TxStatus>, WalletError> {
        let signature = id
            .parse::<Signature>()
            .map_err(|e| WalletError::invalid_address(format!("'{id}': {e}")))?;
        let response = self.client.get_signature_statuses(&[signature]).await?;
        Ok(response.value.into_iter().next().flatten().map(classify_status))
    }
}

fn classify_status(status: TransactionStatus) -> TxStatus {
    if let Some(err) = status.err {
        return TxStatus::Failed(err.to_string());
    }
    match status.confirmation_status {
        Some(TransactionConfirmationStatus::Finalized) => TxStatus::Finalized,
        Some(TransactionConfirmationStatus::Confirmed) => TxStatus::Confirmed,
        _ => TxStatus::Pending,
    }
}

fn ensure_connected(provider: &dyn ExternalSigner) -> Result<(), WalletError> {
    if provider.is_connected() {
        Ok(())
    } else {
        Err(WalletError::ProviderDisconnected)
    }
}

fn decode_keypair(encoded: &str) -> Result<Keypair, WalletError> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| WalletError::invalid_key(format!("not base58: {e}")))?;
    Keypair::try_from(bytes.as_slice())
        .map_err(|e| WalletError::invalid_key(format!("not a 64-byte ed25519 keypair: {e}")))
}

fn sign_in_place(keypair: &Keypair, tx: &mut SolanaTransaction) -> Result<(), WalletError> {
    match tx {
        SolanaTransaction::Legacy(tx) => {
            let blockhash = tx.message.recent_blockhash;
            tx.try_partial_sign(&[keypair], blockhash)
                .map_err(|e| WalletError::signing(e.to_string()))
        }
        SolanaTransaction::Versioned(tx) => sign_versioned(tx, &[keypair]),
    }
}

/// Place each keypair's signature into an already-compiled versioned
/// transaction, resolving positions from the message's required signers.
pub(crate) fn sign_versioned(
    tx: &mut VersionedTransaction,
    signers: &[&Keypair],
) -> Result<(), WalletError> {
    let message_data = tx.message.serialize();
    let num_required = usize::from(tx.message.header().num_required_signatures);
    let static_keys = tx.message.static_account_keys();

    if tx.signatures.len() < num_required {
        tx.signatures.resize(num_required, Signature::default());
    }

    for keypair in signers {
        let pubkey = keypair.pubkey();
        let position = static_keys
            .iter()
            .take(num_required)
            .position(|key| *key == pubkey)
            .ok_or_else(|| {
                WalletError::signing(format!("signer {pubkey} is not required by the transaction"))
            })?;
        tx.signatures[position] = keypair.sign_message(&message_data);
    }
    Ok(())
}

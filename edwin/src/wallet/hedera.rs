//! Hedera wallet client.
//!
//! Hedera identities are `shard.realm.num` account ids rather than raw
//! public keys, and reads go through the public mirror-node REST API.
//! The wallet family mirrors the Solana client: a keypair-backed variant
//! that owns an ed25519 secret and a read-only variant that fails every
//! mutating operation by contract.

use std::str::FromStr;

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use serde::Deserialize;
use tracing::info;

use super::error::WalletError;
use crate::config::{HederaConfig, HttpClientConfig, PollConfig};
use crate::confirm::{ConfirmationOutcome, ConfirmationPoller, StatusSource, TxStatus};

/// Tinybars per whole HBAR.
pub const TINYBARS_PER_HBAR: u64 = 100_000_000;

/// DER prefix Hedera tooling wraps around raw ed25519 private keys.
const ED25519_DER_PREFIX: &str = "302e020100300506032b657004220420";

/// Hedera account identifier in `shard.realm.num` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId {
    /// Shard number.
    pub shard: u64,
    /// Realm number.
    pub realm: u64,
    /// Account number within the realm.
    pub num: u64,
}

impl AccountId {
    /// Create an account id from its three components.
    #[must_use]
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let (Some(shard), Some(realm), Some(num), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(WalletError::invalid_address(format!(
                "'{s}' is not a shard.realm.num account id"
            )));
        };
        let parse = |part: &str| {
            part.parse::<u64>()
                .map_err(|e| WalletError::invalid_address(format!("'{s}': {e}")))
        };
        Ok(Self {
            shard: parse(shard)?,
            realm: parse(realm)?,
            num: parse(num)?,
        })
    }
}

/// The signing capability fixed at wallet construction.
enum HederaSigner {
    /// Exclusively owned ed25519 secret.
    Keypair(SigningKey),
    /// Public identity only.
    ReadOnly,
}

impl std::fmt::Debug for HederaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keypair(_) => f.write_str("Keypair"),
            Self::ReadOnly => f.write_str("ReadOnly"),
        }
    }
}

/// A Hedera wallet client.
pub struct HederaWallet {
    account_id: AccountId,
    signer: HederaSigner,
    config: HederaConfig,
    poll: PollConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for HederaWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HederaWallet")
            .field("account_id", &self.account_id)
            .field("signer", &self.signer)
            .field("network", &self.config.network)
            .finish_non_exhaustive()
    }
}

impl HederaWallet {
    /// Construct a keypair-backed wallet from a hex-encoded ed25519 secret
    /// (raw 32 bytes, DER-wrapped, or a 64-byte secret+public concatenation)
    /// and an account id. No network call happens at construction.
    pub fn from_private_key(
        encoded: &str,
        account_id: AccountId,
        config: HederaConfig,
    ) -> Result<Self, WalletError> {
        let signing_key = decode_signing_key(encoded)?;
        let wallet = Self {
            account_id,
            signer: HederaSigner::Keypair(signing_key),
            config,
            poll: PollConfig::default(),
            http: HttpClientConfig::default().build_client(),
        };
        info!(account_id = %wallet.account_id, network = ?config.network, "Hedera wallet initialized");
        Ok(wallet)
    }

    /// Construct a read-only wallet for the given account id.
    #[must_use]
    pub fn read_only(account_id: AccountId, config: HederaConfig) -> Self {
        Self {
            account_id,
            signer: HederaSigner::ReadOnly,
            config,
            poll: PollConfig::default(),
            http: HttpClientConfig::default().build_client(),
        }
    }

    /// Override the confirmation poll cadence and budget.
    #[must_use]
    pub const fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// The wallet's account id.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// The wallet's `shard.realm.num` address string.
    #[must_use]
    pub fn address(&self) -> String {
        self.account_id.to_string()
    }

    /// Whether this wallet can sign. `false` exactly for read-only wallets.
    #[must_use]
    pub const fn can_sign(&self) -> bool {
        !matches!(self.signer, HederaSigner::ReadOnly)
    }

    /// Hex-encoded ed25519 public key, when the wallet holds a keypair.
    #[must_use]
    pub fn public_key_hex(&self) -> Option<String> {
        match &self.signer {
            HederaSigner::Keypair(key) => Some(hex::encode(key.verifying_key().as_bytes())),
            HederaSigner::ReadOnly => None,
        }
    }

    /// The mirror-node base URL for the configured network.
    #[must_use]
    pub const fn mirror_base_url(&self) -> &'static str {
        self.config.network.mirror_base_url()
    }

    /// Sign an arbitrary message, returning the hex-encoded detached
    /// ed25519 signature.
    pub fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
        match &self.signer {
            HederaSigner::Keypair(key) => Ok(hex::encode(key.sign(message).to_bytes())),
            HederaSigner::ReadOnly => Err(WalletError::UnsupportedOperation("read-only wallet")),
        }
    }

    /// The wallet's HBAR balance, in whole HBAR.
    pub async fn balance(&self) -> Result<f64, WalletError> {
        self.balance_of_account(self.account_id).await
    }

    /// HBAR balance of an arbitrary account, in whole HBAR.
    pub async fn balance_of_account(&self, account_id: AccountId) -> Result<f64, WalletError> {
        let url = format!("{}/api/v1/accounts/{account_id}", self.mirror_base_url());
        let account: MirrorAccount = self.get_json(&url).await?;
        Ok(account.balance.balance as f64 / TINYBARS_PER_HBAR as f64)
    }

    /// The wallet's holdings of a fungible token, decimal-adjusted.
    ///
    /// An account with no relationship to the token has a zero balance,
    /// not an error.
    pub async fn token_balance(&self, token_id: &str) -> Result<f64, WalletError> {
        let url = format!(
            "{}/api/v1/accounts/{}/tokens?token.id={token_id}",
            self.mirror_base_url(),
            self.account_id,
        );
        let relationships: MirrorTokenRelationships = self.get_json(&url).await?;
        let Some(holding) = relationships
            .tokens
            .iter()
            .find(|token| token.token_id == token_id)
        else {
            return Ok(0.0);
        };

        let info_url = format!("{}/api/v1/tokens/{token_id}", self.mirror_base_url());
        let info: MirrorTokenInfo = self.get_json(&info_url).await?;
        let decimals = parse_decimals(&info.decimals);
        Ok(holding.balance as f64 / 10f64.powi(decimals as i32))
    }

    /// Poll a submitted transaction id (`shard.realm.num-sss-nnn` mirror
    /// form) to a terminal outcome.
    pub async fn wait_for_confirmation(
        &self,
        transaction_id: &str,
    ) -> Result<ConfirmationOutcome, WalletError> {
        if !self.can_sign() {
            return Err(WalletError::UnsupportedOperation("read-only wallet"));
        }
        let source = MirrorStatusSource {
            http: self.http.clone(),
            base: self.mirror_base_url(),
        };
        Ok(ConfirmationPoller::new(self.poll)
            .wait(&source, transaction_id)
            .await)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, WalletError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Status source backed by the mirror-node transactions endpoint. The
/// mirror node only indexes transactions once consensus is final, so a
/// successful record maps straight to `Finalized`.
struct MirrorStatusSource {
    http: reqwest::Client,
    base: &'static str,
}

#[async_trait]
impl StatusSource for MirrorStatusSource {
    async fn status(&self, id: &str) -> Result<Option<TxStatus>, WalletError> {
        let url = format!("{}/api/v1/transactions/{id}", self.base);
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: MirrorTransactions = response.error_for_status()?.json().await?;
        Ok(body
            .transactions
            .first()
            .map(|tx| classify_mirror_result(&tx.result)))
    }
}

fn classify_mirror_result(result: &str) -> TxStatus {
    if result == "SUCCESS" {
        TxStatus::Finalized
    } else {
        TxStatus::Failed(result.to_string())
    }
}

fn decode_signing_key(encoded: &str) -> Result<SigningKey, WalletError> {
    let mut hex_str = encoded.trim();
    hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let stripped = hex_str
        .strip_prefix(ED25519_DER_PREFIX)
        .unwrap_or(hex_str);

    let bytes =
        hex::decode(stripped).map_err(|e| WalletError::invalid_key(format!("not hex: {e}")))?;
    // 64-byte inputs carry the public key appended to the secret.
    let secret: [u8; 32] = match bytes.len() {
        32 | 64 => bytes[..32]
            .try_into()
            .map_err(|_| WalletError::invalid_key("secret slice conversion failed"))?,
        other => {
            return Err(WalletError::invalid_key(format!(
                "expected 32 or 64 secret bytes, got {other}"
            )));
        }
    };
    Ok(SigningKey::from_bytes(&secret))
}

fn parse_decimals(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => u32::try_from(n.as_u64().unwrap_or(0)).unwrap_or(0),
        serde_json::Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

#[derive(Debug, Deserialize)]
struct MirrorAccount {
    #[serde(default)]
    balance: MirrorBalance,
}

#[derive(Debug, Default, Deserialize)]
struct MirrorBalance {
    #[serde(default)]
    balance: u64,
}

#[derive(Debug, Default, Deserialize)]
struct MirrorTokenRelationships {
    #[serde(default)]
    tokens: Vec<MirrorTokenBalance>,
}

#[derive(Debug, Deserialize)]
struct MirrorTokenBalance {
    token_id: String,
    #[serde(default)]
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct MirrorTokenInfo {
    #[serde(default)]
    decimals: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct MirrorTransactions {
    #[serde(default)]
    transactions: Vec<MirrorTransaction>,
}

#[derive(Debug, Deserialize)]
struct MirrorTransaction {
    #[serde(default)]
    result: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HederaNetwork;

    const TEST_SECRET: [u8; 32] = [7u8; 32];

    fn test_config() -> HederaConfig {
        HederaConfig {
            network: HederaNetwork::Testnet,
        }
    }

    #[test]
    fn test_account_id_round_trips() {
        let id: AccountId = "0.0.12345".parse().expect("valid id");
        assert_eq!(id, AccountId::new(0, 0, 12345));
        assert_eq!(id.to_string(), "0.0.12345");
    }

    #[test]
    fn test_account_id_rejects_malformed_input() {
        assert!("0.0".parse::<AccountId>().is_err());
        assert!("0.0.12.7".parse::<AccountId>().is_err());
        assert!("0.0.abc".parse::<AccountId>().is_err());
        assert!("".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_key_decoding_accepts_raw_and_der_forms() {
        let raw = hex::encode(TEST_SECRET);
        let der = format!("{ED25519_DER_PREFIX}{raw}");
        let prefixed = format!("0x{raw}");

        let from_raw = decode_signing_key(&raw).expect("raw key");
        let from_der = decode_signing_key(&der).expect("der key");
        let from_prefixed = decode_signing_key(&prefixed).expect("0x key");

        assert_eq!(from_raw.verifying_key(), from_der.verifying_key());
        assert_eq!(from_raw.verifying_key(), from_prefixed.verifying_key());
    }

    #[test]
    fn test_key_decoding_rejects_bad_material() {
        assert!(matches!(
            decode_signing_key("zz-not-hex"),
            Err(WalletError::InvalidKeyFormat(_))
        ));
        assert!(matches!(
            decode_signing_key("abcd"),
            Err(WalletError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_wallet_derives_stable_public_key() {
        let wallet = HederaWallet::from_private_key(
            &hex::encode(TEST_SECRET),
            AccountId::new(0, 0, 1001),
            test_config(),
        )
        .expect("wallet");

        let expected = hex::encode(SigningKey::from_bytes(&TEST_SECRET).verifying_key().as_bytes());
        assert_eq!(wallet.public_key_hex(), Some(expected));
        assert!(wallet.can_sign());
    }

    #[tokio::test]
    async fn test_read_only_rejects_mutating_operations() {
        let wallet = HederaWallet::read_only(AccountId::new(0, 0, 1001), test_config());
        assert!(!wallet.can_sign());
        assert!(wallet.public_key_hex().is_none());
        assert!(matches!(
            wallet.sign_message(b"hello"),
            Err(WalletError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            wallet.wait_for_confirmation("0.0.1001-1700000000-000000001").await,
            Err(WalletError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_signature_verifies_against_public_key() {
        use ed25519_dalek::{Signature, Verifier as _};

        let wallet = HederaWallet::from_private_key(
            &hex::encode(TEST_SECRET),
            AccountId::new(0, 0, 1001),
            test_config(),
        )
        .expect("wallet");

        let signature_hex = wallet.sign_message(b"edwin").expect("signing succeeds");
        let signature_bytes = hex::decode(signature_hex).expect("hex signature");
        let signature = Signature::from_slice(&signature_bytes).expect("signature shape");

        let key = SigningKey::from_bytes(&TEST_SECRET);
        assert!(key.verifying_key().verify(b"edwin", &signature).is_ok());
    }

    #[test]
    fn test_mirror_result_classification() {
        assert_eq!(classify_mirror_result("SUCCESS"), TxStatus::Finalized);
        assert_eq!(
            classify_mirror_result("INSUFFICIENT_PAYER_BALANCE"),
            TxStatus::Failed("INSUFFICIENT_PAYER_BALANCE".into())
        );
    }

    #[test]
    fn test_decimals_parse_both_shapes() {
        assert_eq!(parse_decimals(&serde_json::json!("6")), 6);
        assert_eq!(parse_decimals(&serde_json::json!(8)), 8);
        assert_eq!(parse_decimals(&serde_json::json!(null)), 0);
    }

    #[test]
    fn test_network_selects_mirror_url() {
        let wallet = HederaWallet::read_only(AccountId::new(0, 0, 2), test_config());
        assert_eq!(wallet.mirror_base_url(), "https://testnet.mirrornode.hedera.com");
    }
}

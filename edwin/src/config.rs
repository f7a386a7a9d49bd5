//! Configuration objects for chain connections, relay submission and
//! confirmation polling.
//!
//! Every tunable the wallet layer consumes lives in an explicit struct
//! passed at construction time. Environment variables are read only by the
//! `from_env` constructors, which callers invoke at their composition
//! boundary; nothing below that layer touches process-wide state.

use std::time::Duration;

use solana_sdk::commitment_config::CommitmentConfig;

use crate::wallet::WalletError;

/// Default Solana RPC endpoint when `SOLANA_RPC_URL` is unset.
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default relay block-engine endpoint when `JITO_RPC_URL` is unset.
pub const DEFAULT_RELAY_URL: &str = "https://mainnet.block-engine.jito.wtf";

/// Solana RPC connection settings.
#[derive(Debug, Clone)]
pub struct SolanaConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Commitment level applied to queries issued through this connection.
    pub commitment: CommitmentConfig,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_SOLANA_RPC_URL.to_string(),
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

impl SolanaConfig {
    /// Build from the process environment (`SOLANA_RPC_URL`), falling back
    /// to the public mainnet endpoint.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            rpc_url: std::env::var("SOLANA_RPC_URL")
                .unwrap_or_else(|_| DEFAULT_SOLANA_RPC_URL.to_string()),
            ..Self::default()
        }
    }
}

/// Low-latency relay submission settings.
///
/// The tip amount and endpoint are deployment-tunable; the defaults match
/// the relay operator's documented minimum tip.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Relay base URL; the JSON-RPC path `/api/v1/transactions` is appended.
    pub endpoint: String,
    /// Tip paid to the relay operator, in lamports, appended to every
    /// legacy transaction submitted through the relay.
    pub tip_lamports: u64,
    /// Optional relay session identifier, sent as a `uuid` query parameter.
    pub uuid: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RELAY_URL.to_string(),
            tip_lamports: 1000,
            uuid: None,
        }
    }
}

impl RelayConfig {
    /// Build from the process environment (`JITO_RPC_URL`, `JITO_UUID`).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("JITO_RPC_URL")
                .unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            uuid: std::env::var("JITO_UUID").ok(),
            ..Self::default()
        }
    }
}

/// Confirmation poll cadence and budget.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Sleep between status queries.
    pub interval: Duration,
    /// Cumulative elapsed time after which polling gives up.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            timeout: Duration::from_millis(120_000),
        }
    }
}

impl PollConfig {
    /// Override the poll budget, keeping the default cadence.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration for retrying transient read failures.
///
/// Applied to transaction lookups, which routinely lag submission by a few
/// hundred milliseconds while the node indexes the new signature.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial delay between attempts in milliseconds.
    pub initial_delay_ms: u64,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to retry delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay_ms: 500,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt number (0-indexed).
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = if self.jitter {
            // Up to 25% jitter to de-synchronize concurrent pollers.
            base_delay + base_delay * 0.25 * fastrand::f64()
        } else {
            base_delay
        };
        Duration::from_millis(delay_ms as u64)
    }
}

/// Shared HTTP client configuration for relay and mirror-node requests.
#[derive(Debug, Clone, Copy)]
pub struct HttpClientConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpClientConfig {
    /// Build a reqwest client with this configuration.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn build_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .expect("Failed to build HTTP client")
    }
}

/// Hedera network selection; determines the mirror-node base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HederaNetwork {
    /// Hedera mainnet.
    #[default]
    Mainnet,
    /// Hedera testnet.
    Testnet,
    /// Hedera previewnet.
    Previewnet,
}

impl HederaNetwork {
    /// Mirror-node REST base URL for this network.
    #[must_use]
    pub const fn mirror_base_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://mainnet-public.mirrornode.hedera.com",
            Self::Testnet => "https://testnet.mirrornode.hedera.com",
            Self::Previewnet => "https://previewnet.mirrornode.hedera.com",
        }
    }
}

impl std::str::FromStr for HederaNetwork {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "previewnet" => Ok(Self::Previewnet),
            other => Err(WalletError::config(format!("unknown Hedera network '{other}'"))),
        }
    }
}

/// Hedera connection settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HederaConfig {
    /// Target network.
    pub network: HederaNetwork,
}

impl HederaConfig {
    /// Build from the process environment (`HEDERA_NETWORK`), defaulting to
    /// mainnet when unset or unrecognized.
    #[must_use]
    pub fn from_env() -> Self {
        let network = std::env::var("HEDERA_NETWORK")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        Self { network }
    }
}

/// EVM connection settings.
#[derive(Debug, Clone)]
pub struct EvmConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Chain id committed into signed transactions. Defaults to Base.
    pub chain_id: u64,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://mainnet.base.org".to_string(),
            chain_id: 8453,
        }
    }
}

impl EvmConfig {
    /// Build from the process environment (`EVM_RPC_URL`, `EVM_CHAIN_ID`).
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            rpc_url: std::env::var("EVM_RPC_URL").unwrap_or(default.rpc_url),
            chain_id: std::env::var("EVM_CHAIN_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.chain_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_config_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_millis(2000));
        assert_eq!(config.timeout, Duration::from_millis(120_000));
    }

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.tip_lamports, 1000);
        assert_eq!(config.endpoint, DEFAULT_RELAY_URL);
        assert!(config.uuid.is_none());
    }

    #[test]
    fn test_retry_config_delay_without_jitter() {
        let config = RetryConfig {
            max_attempts: 4,
            initial_delay_ms: 500,
            backoff_multiplier: 2.0,
            jitter: false,
        };

        assert_eq!(config.delay_for_attempt(0).as_millis(), 500);
        assert_eq!(config.delay_for_attempt(1).as_millis(), 1000);
        assert_eq!(config.delay_for_attempt(2).as_millis(), 2000);
    }

    #[test]
    fn test_hedera_network_parsing() {
        assert_eq!("mainnet".parse::<HederaNetwork>().ok(), Some(HederaNetwork::Mainnet));
        assert_eq!("Testnet".parse::<HederaNetwork>().ok(), Some(HederaNetwork::Testnet));
        assert!("devnet".parse::<HederaNetwork>().is_err());
    }
}

#![cfg_attr(docsrs, feature(doc_cfg))]
//! Edwin is the wallet core of a DeFi agent toolkit: multi-chain wallet
//! clients unified behind typed interfaces, with low-latency relay
//! submission and bounded confirmation polling.
//!
//! # Architecture
//!
//! ```text
//! WalletFactory (builders)        config.rs (explicit, env at the edge)
//!   └── SolanaWallet / HederaWallet / EvmWallet
//!         ├── signing capability: Keypair | External | ReadOnly
//!         ├── balance oracle: live queries + pre/post transaction deltas
//!         ├── relay::JitoRelay: tip injection, blockhash refresh,
//!         │     multi-signer signing, JSON-RPC submission
//!         └── confirm::ConfirmationPoller: fixed-interval poll loop,
//!               one terminal outcome per call
//! ```
//!
//! Protocol integrations (swaps, lending, liquidity) are external
//! collaborators: they construct transactions and hand them to the wallet
//! surface, never touching key material or relay plumbing directly.
//!
//! # Examples
//!
//! ```rust,ignore
//! use edwin::wallet::SolanaWallet;
//!
//! let wallet = SolanaWallet::from_private_key(&secret)?;
//! let sol = wallet.balance(None).await?;
//!
//! let signature = wallet.send_transaction(&mut tx, &[]).await?;
//! match wallet.wait_for_confirmation(&signature).await? {
//!     outcome if outcome.is_success() => {
//!         let received = wallet
//!             .transaction_balance_change(&signature, Some(&usdc))
//!             .await?;
//!     }
//!     outcome => eprintln!("submission did not land: {outcome:?}"),
//! }
//! ```

pub mod config;
pub mod confirm;
pub mod error;
pub mod registry;
pub mod relay;
pub mod wallet;

pub use config::{
    EvmConfig, HederaConfig, HederaNetwork, PollConfig, RelayConfig, RetryConfig, SolanaConfig,
};
pub use confirm::{ConfirmationOutcome, ConfirmationPoller, StatusSource, TxStatus};
pub use error::{Error, Result};
pub use registry::TokenRegistry;
pub use relay::JitoRelay;
pub use wallet::{
    AccountId, EvmWallet, ExternalSigner, HederaWallet, SolanaTransaction, SolanaWallet,
    WalletError,
};

//! Multi-chain wallet clients.
//!
//! One wallet family per chain, each unifying a closed set of signing
//! capabilities fixed at construction:
//!
//! ```text
//! SolanaWallet  — Keypair | External provider | ReadOnly
//!   sign / sign-all / sign-message / send (low-latency relay) / confirm
//!   balance queries and transaction-attributed balance deltas
//! HederaWallet  — Keypair | ReadOnly
//!   mirror-node balances and transaction status, ed25519 signing
//! EvmWallet     — key-backed (alloy signer + provider)
//!   wei balances, EIP-191 signing, native transfers
//! ```
//!
//! Protocol integrations consume these clients through their public
//! surface only; no integration reaches into signing material.

mod error;
mod provider;

pub mod evm;
pub mod hedera;
pub mod solana;

pub use error::WalletError;
pub use evm::{EvmWallet, EvmWalletBuilder};
pub use hedera::{AccountId, HederaWallet};
pub use provider::ExternalSigner;
pub use solana::{SolanaTransaction, SolanaWallet, SolanaWalletBuilder};

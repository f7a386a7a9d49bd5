//! Token symbol registry.
//!
//! Best-effort mapping from human token symbols to Solana mint addresses.
//! Lookups are case-insensitive and return `None` on a miss; protocol
//! integrations that need stricter resolution layer their own validation
//! on top.

use std::collections::HashMap;

use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

/// The wrapped-SOL mint, used as the chain's native-wrapper identifier.
pub const NATIVE_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

/// Symbol → mint registry with a built-in mainnet table.
///
/// ```rust,ignore
/// let registry = TokenRegistry::mainnet();
/// let usdc = registry.get("usdc");          // Some(EPjF...)
/// let unknown = registry.get("NO_SUCH");    // None
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    entries: HashMap<String, Pubkey>,
}

impl TokenRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with well-known mainnet mints.
    #[must_use]
    pub fn mainnet() -> Self {
        let mut registry = Self::new();
        registry.insert("SOL", NATIVE_MINT);
        registry.insert("WSOL", NATIVE_MINT);
        registry.insert("USDC", pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"));
        registry.insert("USDT", pubkey!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB"));
        registry.insert("BONK", pubkey!("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263"));
        registry.insert("JUP", pubkey!("JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN"));
        registry
    }

    /// Register a symbol. Overwrites any previous mapping for it.
    pub fn insert(&mut self, symbol: impl AsRef<str>, mint: Pubkey) {
        self.entries.insert(symbol.as_ref().to_ascii_uppercase(), mint);
    }

    /// Look up a symbol, case-insensitively. Returns `None` on a miss.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<Pubkey> {
        self.entries.get(&symbol.to_ascii_uppercase()).copied()
    }

    /// Number of registered symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = TokenRegistry::mainnet();
        assert_eq!(registry.get("usdc"), registry.get("USDC"));
        assert!(registry.get("usdc").is_some());
    }

    #[test]
    fn test_native_aliases_share_a_mint() {
        let registry = TokenRegistry::mainnet();
        assert_eq!(registry.get("SOL"), Some(NATIVE_MINT));
        assert_eq!(registry.get("WSOL"), Some(NATIVE_MINT));
    }

    #[test]
    fn test_miss_returns_none() {
        let registry = TokenRegistry::mainnet();
        assert_eq!(registry.get("DEFINITELY_NOT_A_TOKEN"), None);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut registry = TokenRegistry::new();
        registry.insert("ABC", NATIVE_MINT);
        let other = Pubkey::new_unique();
        registry.insert("abc", other);
        assert_eq!(registry.get("ABC"), Some(other));
        assert_eq!(registry.len(), 1);
    }
}

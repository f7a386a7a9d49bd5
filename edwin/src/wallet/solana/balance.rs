//! Balance queries and transaction-attributed balance deltas.
//!
//! Deltas are reconciled from the finalized transaction's pre/post balance
//! tables rather than from two live balance reads, so concurrent activity
//! on the account cannot leak into the measurement. Native deltas add the
//! network fee back: the fee payer's post balance already reflects the fee
//! deduction, which is not part of the economic transfer being measured
//! (a swap output, for example).

use solana_client::client_error::ClientError;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiMessage,
    UiTransactionEncoding, UiTransactionTokenBalance,
};
use spl_associated_token_account::get_associated_token_address;
use tracing::{debug, warn};

use super::SolanaWallet;
use crate::registry::NATIVE_MINT;
use crate::wallet::WalletError;

/// The subset of a transaction's token-balance table row that delta
/// computation needs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TokenBalanceEntry {
    pub owner: Option<String>,
    pub mint: String,
    pub ui_amount: Option<f64>,
}

impl SolanaWallet {
    /// The wallet's own balance. Native SOL when `token` is `None` or the
    /// native wrapper mint; otherwise the holdings of that mint.
    pub async fn balance(&self, token: Option<&Pubkey>) -> Result<f64, WalletError> {
        let pubkey = self.pubkey();
        self.balance_of_wallet(&pubkey, token).await
    }

    /// Balance of an arbitrary wallet, in human-readable units.
    ///
    /// A missing token holding account is a zero balance, not an error.
    pub async fn balance_of_wallet(
        &self,
        owner: &Pubkey,
        token: Option<&Pubkey>,
    ) -> Result<f64, WalletError> {
        let client = self.connection();
        match token {
            Some(mint) if *mint != NATIVE_MINT => {
                let holding = get_associated_token_address(owner, mint);
                match client.get_token_account_balance(&holding).await {
                    Ok(amount) => Ok(amount.ui_amount.unwrap_or(0.0)),
                    Err(err) if is_missing_account(&err) => Ok(0.0),
                    Err(err) => Err(err.into()),
                }
            }
            _ => {
                let lamports = client.get_balance(owner).await?;
                Ok(lamports as f64 / LAMPORTS_PER_SOL as f64)
            }
        }
    }

    /// The balance change this transaction caused for the wallet, in
    /// human-readable units. Native SOL when `token` is `None` or the
    /// native wrapper mint; otherwise the change in that mint's holdings.
    ///
    /// Deterministic for a finalized transaction: repeated calls return the
    /// identical value.
    pub async fn transaction_balance_change(
        &self,
        signature: &str,
        token: Option<&Pubkey>,
    ) -> Result<f64, WalletError> {
        let parsed = signature
            .parse::<Signature>()
            .map_err(|e| WalletError::invalid_address(format!("'{signature}': {e}")))?;
        let fetched = self.fetch_transaction(&parsed).await?;
        let meta = fetched
            .transaction
            .meta
            .ok_or_else(|| WalletError::TransactionNotFound(signature.to_string()))?;

        match token {
            Some(mint) if *mint != NATIVE_MINT => {
                let pre = collect_entries(meta.pre_token_balances);
                let post = collect_entries(meta.post_token_balances);
                Ok(token_delta(&pre, &post, &self.address(), &mint.to_string()))
            }
            _ => {
                let keys = account_keys(&fetched.transaction.transaction);
                let address = self.address();
                let index = keys.iter().position(|key| *key == address).ok_or_else(|| {
                    WalletError::AccountNotInTransaction {
                        address: address.clone(),
                        signature: signature.to_string(),
                    }
                })?;
                let pre = meta.pre_balances.get(index).copied().unwrap_or(0);
                let post = meta.post_balances.get(index).copied().unwrap_or(0);
                Ok(native_delta(pre, post, meta.fee))
            }
        }
    }

    /// Fetch a transaction with bounded retries. Freshly submitted
    /// signatures routinely lag the node's index by a few hundred
    /// milliseconds, so a miss is retried with backoff before it becomes
    /// `TransactionNotFound`.
    async fn fetch_transaction(
        &self,
        signature: &Signature,
    ) -> Result<EncodedConfirmedTransactionWithStatusMeta, WalletError> {
        let client = self.connection();
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };

        let mut attempt = 0;
        loop {
            match client
                .get_transaction_with_config(signature, config.clone())
                .await
            {
                Ok(fetched) => return Ok(fetched),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        warn!(signature = %signature, error = %err, "transaction lookup exhausted retries");
                        return Err(WalletError::TransactionNotFound(signature.to_string()));
                    }
                    debug!(signature = %signature, attempt, "transaction not indexed yet; backing off");
                    tokio::time::sleep(self.retry.delay_for_attempt(attempt - 1)).await;
                }
            }
        }
    }
}

/// Lamport delta with the fee added back, in SOL.
pub(crate) fn native_delta(pre_raw: u64, post_raw: u64, fee_raw: u64) -> f64 {
    (post_raw as f64 - pre_raw as f64 + fee_raw as f64) / LAMPORTS_PER_SOL as f64
}

/// Token delta for `(owner, mint)` across the pre/post tables. Entries
/// missing from either table count as zero.
pub(crate) fn token_delta(
    pre: &[TokenBalanceEntry],
    post: &[TokenBalanceEntry],
    owner: &str,
    mint: &str,
) -> f64 {
    let amount_for = |entries: &[TokenBalanceEntry]| {
        entries
            .iter()
            .find(|entry| entry.mint == mint && entry.owner.as_deref() == Some(owner))
            .and_then(|entry| entry.ui_amount)
            .unwrap_or(0.0)
    };
    amount_for(post) - amount_for(pre)
}

fn collect_entries(
    balances: OptionSerializer<Vec<UiTransactionTokenBalance>>,
) -> Vec<TokenBalanceEntry> {
    Option::<Vec<UiTransactionTokenBalance>>::from(balances)
        .unwrap_or_default()
        .into_iter()
        .map(|balance| TokenBalanceEntry {
            owner: Option::from(balance.owner),
            mint: balance.mint,
            ui_amount: balance.ui_token_amount.ui_amount,
        })
        .collect()
}

fn account_keys(tx: &EncodedTransaction) -> Vec<String> {
    match tx {
        EncodedTransaction::Json(ui) => match &ui.message {
            UiMessage::Raw(raw) => raw.account_keys.clone(),
            UiMessage::Parsed(parsed) => parsed
                .account_keys
                .iter()
                .map(|account| account.pubkey.clone())
                .collect(),
        },
        _ => Vec::new(),
    }
}

fn is_missing_account(err: &ClientError) -> bool {
    let text = err.to_string();
    text.contains("could not find account") || text.contains("AccountNotFound")
}

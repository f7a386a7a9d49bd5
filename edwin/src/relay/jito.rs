//! Jito block-engine submission pipeline.

use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use tracing::{debug, info};

use crate::config::{HttpClientConfig, RelayConfig};
use crate::wallet::WalletError;
use crate::wallet::solana::{SolanaTransaction, sign_versioned};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[allow(dead_code)]
    code: i64,
    message: String,
}

/// Client for a Jito-style low-latency relay.
///
/// Legacy transactions are enriched before signing: a tip transfer to a
/// randomly chosen relay tip account is appended, the recent blockhash is
/// refreshed to the latest finalized value and the fee payer is set to the
/// wallet. Versioned transactions skip enrichment — their payload is
/// already compiled and signing is the only step — and are submitted with
/// different send options (`skipPreflight: true`, no relay-side retries;
/// legacy payloads go through preflight with a bounded retry budget).
pub struct JitoRelay {
    config: RelayConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for JitoRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitoRelay")
            .field("endpoint", &self.config.endpoint)
            .field("tip_lamports", &self.config.tip_lamports)
            .finish_non_exhaustive()
    }
}

impl JitoRelay {
    /// Create a relay client with a default HTTP client.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self::with_http_client(config, HttpClientConfig::default().build_client())
    }

    /// Create a relay client with a caller-supplied HTTP client.
    #[must_use]
    pub const fn with_http_client(config: RelayConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// The relay configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &RelayConfig {
        &self.config
    }

    fn url(&self) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        match &self.config.uuid {
            Some(uuid) => format!("{base}/api/v1/transactions?uuid={uuid}"),
            None => format!("{base}/api/v1/transactions"),
        }
    }

    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, WalletError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response = self.http.post(self.url()).json(&request).send().await?;
        let body: JsonRpcResponse<T> = response.json().await?;
        if let Some(error) = body.error {
            return Err(WalletError::relay(error.message));
        }
        body.result
            .ok_or_else(|| WalletError::relay("empty relay response"))
    }

    /// Fetch the relay's current tip accounts.
    pub async fn tip_accounts(&self) -> Result<Vec<Pubkey>, WalletError> {
        let accounts: Vec<String> = self.rpc_call("getTipAccounts", serde_json::json!([])).await?;
        accounts
            .iter()
            .map(|account| {
                account
                    .parse::<Pubkey>()
                    .map_err(|e| WalletError::relay(format!("invalid tip account '{account}': {e}")))
            })
            .collect()
    }

    /// Pick one tip account uniformly at random. Any valid tip account is
    /// acceptable; spreading picks avoids hot-account write contention.
    async fn pick_tip_account(&self) -> Result<Pubkey, WalletError> {
        let accounts = self.tip_accounts().await?;
        if accounts.is_empty() {
            return Err(WalletError::relay("relay returned no tip accounts"));
        }
        Ok(accounts[fastrand::usize(..accounts.len())])
    }

    /// Prepare, sign and submit a transaction through the relay.
    ///
    /// The payload is mutated in place — enrichment must complete before
    /// any signature is attached, since signatures commit to the full
    /// payload. On success the returned signature is the only artifact the
    /// caller should retain.
    pub async fn send(
        &self,
        rpc: &RpcClient,
        tx: &mut SolanaTransaction,
        wallet: &Keypair,
        co_signers: &[&Keypair],
    ) -> Result<String, WalletError> {
        match tx {
            SolanaTransaction::Legacy(tx) => self.send_legacy(rpc, tx, wallet, co_signers).await,
            SolanaTransaction::Versioned(tx) => self.send_versioned(tx, wallet, co_signers).await,
        }
    }

    async fn send_legacy(
        &self,
        rpc: &RpcClient,
        tx: &mut Transaction,
        wallet: &Keypair,
        co_signers: &[&Keypair],
    ) -> Result<String, WalletError> {
        let payer = wallet.pubkey();
        let tip_account = self.pick_tip_account().await?;
        debug!(tip_account = %tip_account, tip_lamports = self.config.tip_lamports, "appending relay tip");

        let mut instructions = decompile_instructions(&tx.message);
        instructions.push(system_instruction::transfer(
            &payer,
            &tip_account,
            self.config.tip_lamports,
        ));

        // Stale block references are rejected at the chain level; refresh
        // to the latest finalized value immediately before signing.
        let (blockhash, _) = rpc
            .get_latest_blockhash_with_commitment(CommitmentConfig::finalized())
            .await?;

        let message = Message::new_with_blockhash(&instructions, Some(&payer), &blockhash);
        *tx = Transaction::new_unsigned(message);

        let mut signers: Vec<&Keypair> = Vec::with_capacity(co_signers.len() + 1);
        signers.push(wallet);
        signers.extend_from_slice(co_signers);
        tx.try_sign(&signers, blockhash)
            .map_err(|e| WalletError::signing(e.to_string()))?;

        let options = serde_json::json!({
            "encoding": "base64",
            "skipPreflight": false,
            "maxRetries": 5,
        });
        self.submit(tx, options).await
    }

    async fn send_versioned(
        &self,
        tx: &mut VersionedTransaction,
        wallet: &Keypair,
        co_signers: &[&Keypair],
    ) -> Result<String, WalletError> {
        let mut signers: Vec<&Keypair> = Vec::with_capacity(co_signers.len() + 1);
        signers.push(wallet);
        signers.extend_from_slice(co_signers);
        sign_versioned(tx, &signers)?;

        let options = serde_json::json!({
            "encoding": "base64",
            "skipPreflight": true,
            "maxRetries": 0,
        });
        self.submit(tx, options).await
    }

    async fn submit<T: Serialize>(
        &self,
        tx: &T,
        options: serde_json::Value,
    ) -> Result<String, WalletError> {
        let wire = bincode::serialize(tx)
            .map_err(|e| WalletError::relay(format!("failed to serialize transaction: {e}")))?;
        let encoded = BASE64_STANDARD.encode(wire);

        let signature: String = self
            .rpc_call("sendTransaction", serde_json::json!([encoded, options]))
            .await?;
        info!(signature = %signature, endpoint = %self.config.endpoint, "transaction submitted via relay");
        Ok(signature)
    }
}

/// Rebuild the instruction list of a compiled legacy message so further
/// instructions can be appended before re-compilation.
fn decompile_instructions(message: &Message) -> Vec<Instruction> {
    message
        .instructions
        .iter()
        .map(|compiled| {
            let program_id = message.account_keys[usize::from(compiled.program_id_index)];
            let accounts = compiled
                .accounts
                .iter()
                .map(|&index| {
                    let index = usize::from(index);
                    AccountMeta {
                        pubkey: message.account_keys[index],
                        is_signer: message.is_signer(index),
                        is_writable: message.is_maybe_writable(index, None),
                    }
                })
                .collect();
            Instruction {
                program_id,
                accounts,
                data: compiled.data.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve a single canned HTTP response on an ephemeral port.
    async fn serve_once(body: String) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    fn relay_for(endpoint: String) -> JitoRelay {
        JitoRelay::new(RelayConfig {
            endpoint,
            ..RelayConfig::default()
        })
    }

    #[tokio::test]
    async fn test_submit_resolves_result_signature() {
        let endpoint = serve_once(r#"{"jsonrpc":"2.0","result":"sig123","id":1}"#.into()).await;
        let relay = relay_for(endpoint);

        let tx = Transaction::default();
        let options = serde_json::json!({"encoding": "base64"});
        let signature = relay.submit(&tx, options).await.expect("submission succeeds");
        assert_eq!(signature, "sig123");
    }

    #[tokio::test]
    async fn test_submit_surfaces_relay_error_message() {
        let endpoint =
            serve_once(r#"{"jsonrpc":"2.0","error":{"code":-32000,"message":"x"},"id":1}"#.into())
                .await;
        let relay = relay_for(endpoint);

        let tx = Transaction::default();
        let err = relay
            .submit(&tx, serde_json::json!({}))
            .await
            .expect_err("relay error propagates");
        assert!(matches!(err, WalletError::RelaySubmission(_)));
        assert!(err.to_string().contains('x'));
    }

    #[tokio::test]
    async fn test_tip_accounts_parse() {
        let payer = Keypair::new();
        let body = format!(r#"{{"jsonrpc":"2.0","result":["{}"],"id":1}}"#, payer.pubkey());
        let endpoint = serve_once(body).await;
        let relay = relay_for(endpoint);

        let accounts = relay.tip_accounts().await.expect("tip accounts fetch");
        assert_eq!(accounts, vec![payer.pubkey()]);
    }

    #[test]
    fn test_url_carries_session_uuid() {
        let relay = JitoRelay::new(RelayConfig {
            endpoint: "https://relay.example/".into(),
            uuid: Some("abc-123".into()),
            ..RelayConfig::default()
        });
        assert_eq!(relay.url(), "https://relay.example/api/v1/transactions?uuid=abc-123");
    }

    #[test]
    fn test_decompile_round_trips_a_transfer() {
        let payer = Keypair::new();
        let dest = Pubkey::new_unique();
        let ix = system_instruction::transfer(&payer.pubkey(), &dest, 42);
        let message = Message::new(&[ix.clone()], Some(&payer.pubkey()));

        let decompiled = decompile_instructions(&message);
        assert_eq!(decompiled, vec![ix]);
    }
}

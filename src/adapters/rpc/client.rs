//! Pooled Ledger Client - JSON-RPC Account Access over Redundant Endpoints
//!
//! Implements the `LedgerClient` port. Every call selects one endpoint
//! from the weighted pool; transport failures penalize exactly the
//! endpoint the call was routed to, and every successful subscription
//! (re)connect doubles all weights back toward full strength.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::domain::book::AccountId;
use crate::ports::ledger::{Instruction, LedgerClient, LedgerError, TxId};

use super::pool::EndpointPool;

/// Configuration for the pooled ledger client.
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    /// Commitment level attached to reads and subscriptions.
    pub commitment: String,
    /// Signing identity submitted alongside transactions.
    pub signer_identity: String,
    /// Per-call transport timeout.
    pub timeout: Duration,
}

/// JSON-RPC ledger client routing each call through the endpoint pool.
pub struct PooledLedgerClient {
    pool: Arc<EndpointPool>,
    http: Client,
    config: LedgerClientConfig,
    request_id: AtomicU64,
    /// Readiness flag mirroring the subscription sessions: cleared when a
    /// session drops, set again once a reconnect lands.
    subscription_health: Option<Arc<AtomicBool>>,
}

impl PooledLedgerClient {
    pub fn new(
        pool: Arc<EndpointPool>,
        config: LedgerClientConfig,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self {
            pool,
            http,
            config,
            request_id: AtomicU64::new(1),
            subscription_health: None,
        })
    }

    /// Mirror subscription session state into a shared readiness flag.
    pub fn with_subscription_health(mut self, flag: Arc<AtomicBool>) -> Self {
        self.subscription_health = Some(flag);
        self
    }

    /// Shared pool handle, for metrics.
    pub fn pool(&self) -> Arc<EndpointPool> {
        Arc::clone(&self.pool)
    }

    /// POST one JSON-RPC call to a freshly selected endpoint.
    ///
    /// A transport failure halves the selected endpoint's weight before
    /// the structured error is returned.
    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let endpoint = self.pool.select();
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.request_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                self.pool.penalize(&endpoint);
                LedgerError::Transport {
                    endpoint: endpoint.clone(),
                    message: e.to_string(),
                }
            })?;

        let payload: Value = response.json().await.map_err(|e| {
            self.pool.penalize(&endpoint);
            LedgerError::Transport {
                endpoint: endpoint.clone(),
                message: format!("invalid JSON-RPC envelope: {e}"),
            }
        })?;

        if let Some(error) = payload.get("error") {
            return Err(LedgerError::Rejected(error.to_string()));
        }
        payload
            .get("result")
            .cloned()
            .ok_or_else(|| LedgerError::Rejected("missing result".to_string()))
    }
}

#[async_trait]
impl LedgerClient for PooledLedgerClient {
    async fn read_account(&self, address: &AccountId) -> Result<Vec<u8>, LedgerError> {
        let result = self
            .call(
                "readAccount",
                json!([address, { "commitment": self.config.commitment }]),
            )
            .await?;
        decode_account_data(address, &result)
    }

    async fn subscribe_account(
        &self,
        address: &AccountId,
    ) -> Result<mpsc::Receiver<Vec<u8>>, LedgerError> {
        let (tx, rx) = mpsc::channel(64);
        let pool = Arc::clone(&self.pool);
        let address = address.clone();
        let commitment = self.config.commitment.clone();
        let health = self.subscription_health.clone();

        tokio::spawn(async move {
            run_subscription(pool, address, commitment, health, tx).await;
        });

        Ok(rx)
    }

    async fn submit(&self, instructions: &[Instruction]) -> Result<TxId, LedgerError> {
        let wire = BASE64.encode(encode_transaction(instructions));
        let result = self
            .call(
                "submitTransaction",
                json!([wire, { "signer": self.config.signer_identity }]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::Rejected("non-string transaction id".to_string()))
    }
}

/// Extract and decode the base64 `data` field of an account result.
fn decode_account_data(address: &AccountId, result: &Value) -> Result<Vec<u8>, LedgerError> {
    let encoded = result
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| LedgerError::MalformedResponse {
            account: address.clone(),
            message: "missing data field".to_string(),
        })?;
    BASE64
        .decode(encoded)
        .map_err(|e| LedgerError::MalformedResponse {
            account: address.clone(),
            message: format!("invalid base64: {e}"),
        })
}

/// Length-prefixed wire encoding of a transaction's instructions.
///
/// The signature itself is attached server-side from the registered
/// signer identity; key custody stays outside this process.
fn encode_transaction(instructions: &[Instruction]) -> Vec<u8> {
    let mut wire = Vec::new();
    wire.extend_from_slice(&(instructions.len() as u32).to_le_bytes());
    for ix in instructions {
        push_bytes(&mut wire, ix.program.as_bytes());
        wire.extend_from_slice(&(ix.accounts.len() as u32).to_le_bytes());
        for account in &ix.accounts {
            push_bytes(&mut wire, account.address.as_bytes());
            wire.push(u8::from(account.signer));
            wire.push(u8::from(account.writable));
        }
        push_bytes(&mut wire, &ix.data);
    }
    wire
}

fn push_bytes(wire: &mut Vec<u8>, bytes: &[u8]) {
    wire.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    wire.extend_from_slice(bytes);
}

/// Keep one account subscription alive until the receiver is dropped.
///
/// Each (re)connect selects a fresh endpoint; a successful connect is the
/// recovery signal that doubles all pool weights, a failed session halves
/// the endpoint it used. Backoff doubles up to 30s between attempts.
async fn run_subscription(
    pool: Arc<EndpointPool>,
    address: AccountId,
    commitment: String,
    health: Option<Arc<AtomicBool>>,
    tx: mpsc::Sender<Vec<u8>>,
) {
    let mut backoff = Duration::from_secs(1);
    loop {
        let endpoint = pool.select();
        match stream_account(&endpoint, &address, &commitment, &pool, health.as_deref(), &tx)
            .await
        {
            Ok(()) => {
                debug!(account = %address, "Subscription receiver dropped, stopping");
                return;
            }
            Err(e) => {
                if let Some(flag) = &health {
                    flag.store(false, Ordering::Relaxed);
                }
                pool.penalize(&endpoint);
                warn!(
                    account = %address,
                    endpoint = %endpoint,
                    error = %e,
                    backoff_s = backoff.as_secs(),
                    "Account subscription dropped, reconnecting"
                );
            }
        }
        if tx.is_closed() {
            return;
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(Duration::from_secs(30));
    }
}

/// Single subscription session over one endpoint.
async fn stream_account(
    endpoint: &str,
    address: &AccountId,
    commitment: &str,
    pool: &EndpointPool,
    health: Option<&AtomicBool>,
    tx: &mpsc::Sender<Vec<u8>>,
) -> anyhow::Result<()> {
    let ws_url = endpoint
        .replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1);
    let (ws_stream, _) = connect_async(&ws_url).await?;
    // The connect succeeded: the whole pool earns its weight back.
    pool.recover_all();
    if let Some(flag) = health {
        flag.store(true, Ordering::Relaxed);
    }
    info!(account = %address, endpoint = %endpoint, "Account subscription connected");

    let (mut write, mut read) = ws_stream.split();
    let subscribe = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "subscribeAccount",
        "params": [address, { "commitment": commitment }],
    });
    write.send(Message::Text(subscribe.to_string())).await?;

    while let Some(message) = read.next().await {
        match message? {
            Message::Text(text) => {
                let Some(payload) = parse_notification(&text) else {
                    continue;
                };
                if tx.send(payload).await.is_err() {
                    // Receiver gone, normal shutdown.
                    return Ok(());
                }
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => anyhow::bail!("server closed the subscription"),
            _ => {}
        }
    }
    anyhow::bail!("subscription stream ended")
}

/// Pull the base64 account payload out of a push notification.
fn parse_notification(text: &str) -> Option<Vec<u8>> {
    let value: Value = serde_json::from_str(text).ok()?;
    let data = value.get("params")?.get("data")?.as_str()?;
    BASE64.decode(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ledger::InstructionAccount;

    #[test]
    fn test_encode_transaction_layout() {
        let ix = Instruction {
            program: "prog".to_string(),
            accounts: vec![InstructionAccount::signer("me")],
            data: vec![1, 2, 3],
        };
        let wire = encode_transaction(&[ix]);
        // instruction count
        assert_eq!(&wire[0..4], &1u32.to_le_bytes());
        // program id, length-prefixed
        assert_eq!(&wire[4..8], &4u32.to_le_bytes());
        assert_eq!(&wire[8..12], b"prog");
        // account count, then "me" + signer/writable flags
        assert_eq!(&wire[12..16], &1u32.to_le_bytes());
        assert_eq!(&wire[16..20], &2u32.to_le_bytes());
        assert_eq!(&wire[20..22], b"me");
        assert_eq!(wire[22], 1);
        assert_eq!(wire[23], 0);
        // data
        assert_eq!(&wire[24..28], &3u32.to_le_bytes());
        assert_eq!(&wire[28..], &[1, 2, 3]);
    }

    #[test]
    fn test_parse_notification_extracts_payload() {
        let encoded = BASE64.encode(b"hello");
        let text = format!(
            r#"{{"jsonrpc":"2.0","method":"accountNotification","params":{{"data":"{encoded}"}}}}"#
        );
        assert_eq!(parse_notification(&text).unwrap(), b"hello");
        assert!(parse_notification("{}").is_none());
        assert!(parse_notification("not json").is_none());
    }

    #[test]
    fn test_decode_account_data_errors() {
        let addr = "acct".to_string();
        let ok = json!({ "data": BASE64.encode([7u8; 4]) });
        assert_eq!(decode_account_data(&addr, &ok).unwrap(), vec![7u8; 4]);

        let missing = json!({ "lamports": 5 });
        assert!(decode_account_data(&addr, &missing).is_err());

        let bad = json!({ "data": "///not-base64" });
        assert!(decode_account_data(&addr, &bad).is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscription_clears_health_flag() {
        // Port 9 refuses connections, so the first session attempt fails
        // and the readiness flag must go false.
        let flag = Arc::new(AtomicBool::new(true));
        let pool = Arc::new(EndpointPool::new(vec![
            "http://127.0.0.1:9".to_string(),
        ]));
        let client = PooledLedgerClient::new(
            Arc::clone(&pool),
            LedgerClientConfig {
                commitment: "confirmed".to_string(),
                signer_identity: "signer".to_string(),
                timeout: Duration::from_millis(500),
            },
        )
        .unwrap()
        .with_subscription_health(Arc::clone(&flag));

        let _rx = client
            .subscribe_account(&"acct".to_string())
            .await
            .unwrap();
        for _ in 0..100 {
            if !flag.load(Ordering::Relaxed) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!flag.load(Ordering::Relaxed));
    }
}

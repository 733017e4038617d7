use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use loadtest_configs::{WaitLevel, timeouts};
use near_primitives::{
    hash::CryptoHash,
    transaction::{SignedTransaction, Transaction, TransactionV0},
    types::Nonce,
};
use reqwest::{Client, Url};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    account::Account,
    sim::Environment,
    stats::StatsRegistry,
    transaction::{CallError, TransactionDescriptor},
};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error calling {method}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("node returned error for {method}: {message}")]
    Node {
        method: &'static str,
        message: String,
    },
    #[error("malformed {method} response: {detail}")]
    MalformedResponse {
        method: &'static str,
        detail: String,
    },
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Call(#[from] CallError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("failed to encode signed transaction")]
    Encoding(#[source] std::io::Error),
}

/// Most recent block hash shared by every proxy in the process.
///
/// Signing only needs a hash from the recent past, so one cached fetch
/// serves all users until it ages out.
#[derive(Clone, Default)]
pub struct BlockHashCache {
    inner: Arc<RwLock<Option<(CryptoHash, Instant)>>>,
}

impl BlockHashCache {
    async fn fresh(&self, max_age: Duration) -> Option<CryptoHash> {
        let guard = self.inner.read().await;
        guard.and_then(|(hash, fetched_at)| (fetched_at.elapsed() <= max_age).then_some(hash))
    }

    async fn store(&self, hash: CryptoHash) {
        *self.inner.write().await = Some((hash, Instant::now()));
    }
}

/// Async JSON-RPC client for one NEAR node.
///
/// Submissions are signed locally with the descriptor's sender account and
/// recorded in the shared stats registry under the caller's label.
#[derive(Clone)]
pub struct NearNodeProxy {
    rpc_url: Url,
    http: Client,
    wait_level: WaitLevel,
    stats: Arc<StatsRegistry>,
    block_hash: BlockHashCache,
}

impl NearNodeProxy {
    #[must_use]
    pub fn new(environment: &Environment) -> Self {
        Self {
            rpc_url: environment.rpc_url().clone(),
            http: environment.http_client().clone(),
            wait_level: environment.config().wait_level,
            stats: environment.stats_handle(),
            block_hash: environment.block_hash_cache(),
        }
    }

    /// Submit one transaction, recording latency and outcome under `label`.
    ///
    /// Errors are surfaced unchanged after being counted; retry policy is the
    /// caller's business.
    pub async fn send(
        &self,
        descriptor: &dyn TransactionDescriptor,
        label: &str,
    ) -> Result<Value, SendError> {
        let started = Instant::now();
        let outcome = self.submit(descriptor).await;
        let latency = started.elapsed();

        match &outcome {
            Ok(_) => self.stats.record_success(label, latency),
            Err(error) => {
                self.stats.record_failure(label, latency);
                warn!(label, error = %error, "transaction submission failed");
            }
        }

        outcome
    }

    /// Fetch the chain's nonce for the account's key and sync local state.
    pub async fn refresh_nonce(&self, account: &Account) -> Result<Nonce, RpcError> {
        let params = json!({
            "request_type": "view_access_key",
            "finality": "optimistic",
            "account_id": account.id(),
            "public_key": account.public_key(),
        });
        let result = self.call("query", params).await?;

        let nonce = result
            .get("nonce")
            .and_then(Value::as_u64)
            .ok_or_else(|| RpcError::MalformedResponse {
                method: "query",
                detail: "access key view carries no nonce".to_owned(),
            })?;

        account.set_nonce(nonce);
        debug!(account = %account.id(), nonce, "refreshed nonce");
        Ok(nonce)
    }

    /// Recent block hash for signing, served from the shared cache while
    /// younger than the configured age limit.
    pub async fn recent_block_hash(&self) -> Result<CryptoHash, RpcError> {
        let max_age = timeouts::block_hash_max_age();
        if let Some(hash) = self.block_hash.fresh(max_age).await {
            return Ok(hash);
        }

        let result = self.call("block", json!({"finality": "final"})).await?;
        let raw = result
            .pointer("/header/hash")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::MalformedResponse {
                method: "block",
                detail: "block header carries no hash".to_owned(),
            })?;
        let hash: CryptoHash = raw.parse().map_err(|_| RpcError::MalformedResponse {
            method: "block",
            detail: format!("'{raw}' is not a block hash"),
        })?;

        self.block_hash.store(hash).await;
        Ok(hash)
    }

    async fn submit(&self, descriptor: &dyn TransactionDescriptor) -> Result<Value, SendError> {
        let sender = descriptor.sender_account();
        let actions = descriptor.actions()?;
        let block_hash = self.recent_block_hash().await?;
        let nonce = sender.reserve_nonce();

        let tx = Transaction::V0(TransactionV0 {
            signer_id: sender.id().clone(),
            public_key: sender.public_key(),
            nonce,
            receiver_id: descriptor.receiver_id(),
            block_hash,
            actions,
        });
        let (tx_hash, _size) = tx.get_hash_and_size();
        let signature = sender.signer().sign(tx_hash.as_ref());
        let signed = SignedTransaction::new(signature, tx);
        let bytes = borsh::to_vec(&signed).map_err(SendError::Encoding)?;

        let params = json!({
            "signed_tx_base64": BASE64_STANDARD.encode(&bytes),
            "wait_until": self.wait_level.as_str(),
        });
        let result = self.call("send_tx", params).await?;
        Ok(result)
    }

    async fn call(&self, method: &'static str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "loadtest",
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(self.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|source| RpcError::Transport { method, source })?;
        let payload: Value = response
            .json()
            .await
            .map_err(|source| RpcError::Transport { method, source })?;

        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            return Err(RpcError::Node {
                method,
                message: error.to_string(),
            });
        }

        let result = payload
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::MalformedResponse {
                method,
                detail: "response carries neither result nor error".to_owned(),
            })?;

        // Query misses are reported inside the result on older nodes.
        if let Some(error) = result.get("error").and_then(Value::as_str) {
            return Err(RpcError::Node {
                method,
                message: error.to_owned(),
            });
        }

        Ok(result)
    }
}

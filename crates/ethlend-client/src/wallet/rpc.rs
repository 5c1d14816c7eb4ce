//! JSON-RPC wallet endpoint
//!
//! Speaks the EIP-1193 method set (`eth_requestAccounts`, `eth_call`,
//! `eth_sendTransaction`, `eth_getTransactionReceipt`) over HTTP. Signing
//! happens inside the wallet behind the endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use ethlend_common::{EthlendError, Result, WalletError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::provider::{RpcTransport, TransactionReceipt, TransactionRequest, WalletProvider};

/// EIP-1193: the user rejected the request
pub const USER_REJECTED_CODE: i64 = 4001;

/// JSON-RPC: method does not exist
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl From<RpcErrorObject> for WalletError {
    fn from(err: RpcErrorObject) -> Self {
        if err.code == USER_REJECTED_CODE {
            WalletError::UserRejected(err.message)
        } else {
            WalletError::Rpc {
                code: err.code,
                message: err.message,
            }
        }
    }
}

/// Wallet reached through an HTTP JSON-RPC endpoint
pub struct JsonRpcWallet {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    /// Create a wallet client for `url`
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| EthlendError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "rpc request");
        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // Nothing listening: no wallet behind the endpoint
                if e.is_connect() {
                    EthlendError::from(WalletError::ProviderNotFound)
                } else {
                    EthlendError::Network(format!("{} failed: {}", method, e))
                }
            })?
            .error_for_status()
            .map_err(|e| EthlendError::Network(format!("{} failed: {}", method, e)))?
            .json()
            .await
            .map_err(|e| EthlendError::Serialization(format!("Invalid {} response: {}", method, e)))?;

        if let Some(err) = response.error {
            return Err(WalletError::from(err).into());
        }

        Ok(serde_json::from_value(response.result)?)
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        match self.request("eth_requestAccounts", json!([])).await {
            // Plain nodes expose unlocked accounts without the permission flow
            Err(EthlendError::Wallet(WalletError::Rpc { code, .. })) if code == METHOD_NOT_FOUND_CODE => {
                debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.request("eth_accounts", json!([])).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl RpcTransport for JsonRpcWallet {
    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        self.request("eth_call", json!([request, "latest"])).await
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        self.request("eth_sendTransaction", json!([request])).await
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash])).await
    }
}

//! Wallet provider traits
//!
//! A [`WalletProvider`] grants account access. An [`RpcTransport`] carries
//! contract reads and signed writes; the wallet signs with the account it
//! handed out, so requests only carry `from`.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use ethlend_common::{Result, WalletError};
use serde::{Deserialize, Serialize};

/// Account-access capability of a wallet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user for account access; first account is the active one
    async fn request_accounts(&self) -> Result<Vec<Address>>;
}

/// Read/write channel to the chain through the wallet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Execute a read-only call against the latest block
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    /// Sign and broadcast a transaction, returning its hash
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256>;

    /// Receipt of a mined transaction, `None` while pending
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;
}

/// Call or transaction parameters in JSON-RPC shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}

impl TransactionRequest {
    /// Read-only call to `to`
    pub fn call(to: Address, data: Vec<u8>) -> Self {
        Self {
            from: None,
            to,
            value: None,
            data: data.into(),
        }
    }

    /// State-changing transaction from `from` to `to`
    pub fn transaction(from: Address, to: Address, data: Vec<u8>) -> Self {
        Self {
            from: Some(from),
            ..Self::call(to, data)
        }
    }

    /// Attach a native value transfer (wei)
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

/// Subset of a transaction receipt the client relies on
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `0x1` on success, `0x0` on revert; absent on pre-Byzantium chains
    #[serde(default)]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1))
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number.map(|b| b.to::<u64>())
    }
}

/// Wallet whose accounts are already unlocked (local dev node, simulator)
#[derive(Debug, Clone)]
pub struct UnlockedWallet {
    accounts: Vec<Address>,
}

impl UnlockedWallet {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self { accounts }
    }

    pub fn single(account: Address) -> Self {
        Self::new(vec![account])
    }
}

#[async_trait]
impl WalletProvider for UnlockedWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if self.accounts.is_empty() {
            return Err(WalletError::NoAccounts.into());
        }
        Ok(self.accounts.clone())
    }
}

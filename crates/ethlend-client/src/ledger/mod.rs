//! Ledger bindings
//!
//! The lending contract and the debt token are external collaborators. The
//! controller only sees these traits; [`evm`] binds them to a deployed
//! contract through the wallet, [`memory`] simulates them in process.

pub mod evm;
pub mod memory;

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use ethlend_common::{LoanRecord, Result};

/// Result of a confirmed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// Handle to a submitted write
#[async_trait]
pub trait PendingTransaction: Send + Sync {
    /// Transaction hash
    fn hash(&self) -> B256;

    /// Wait until the transaction is confirmed on the ledger.
    ///
    /// A revert or a confirmation timeout is an error.
    async fn wait(&self) -> Result<Confirmation>;
}

/// The lending contract
#[async_trait]
pub trait LendingLedger: Send + Sync {
    /// Contract address, the spender for debt token allowances
    fn address(&self) -> Address;

    /// Oracle ETH/USD price, fixed point with 8 decimals
    async fn eth_usd_price(&self) -> Result<u128>;

    /// Loan slot `index` of `owner`
    async fn loan(&self, owner: Address, index: usize) -> Result<LoanRecord>;

    /// Borrow `amount` USDT units, attaching `collateral_wei` as value
    async fn take_loan(&self, amount: u128, collateral_wei: u128)
        -> Result<Box<dyn PendingTransaction>>;

    /// Repay loan `index` with `amount` USDT units
    async fn repay_loan(&self, index: usize, amount: u128) -> Result<Box<dyn PendingTransaction>>;
}

/// The borrowed ERC-20 token
#[async_trait]
pub trait DebtToken: Send + Sync {
    /// Allow `spender` to pull `amount` units from the connected account
    async fn approve(&self, spender: Address, amount: u128) -> Result<Box<dyn PendingTransaction>>;
}

/// Contract handles bound to a connected account
#[derive(Clone)]
pub struct Contracts {
    pub lending: Arc<dyn LendingLedger>,
    pub debt_token: Arc<dyn DebtToken>,
}

impl Contracts {
    pub fn new(lending: Arc<dyn LendingLedger>, debt_token: Arc<dyn DebtToken>) -> Self {
        Self {
            lending,
            debt_token,
        }
    }
}

impl std::fmt::Debug for Contracts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contracts")
            .field("lending", &self.lending.address())
            .finish_non_exhaustive()
    }
}

//! In-memory ledger
//!
//! Simulates the lending contract and its debt token in process. Used by the
//! tests and by the CLI's offline mode. Writes take effect at submission and
//! come back already confirmed, unless a revert has been scheduled.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use dashmap::DashMap;
use ethlend_common::{
    LedgerError, LoanRecord, Result, COLLATERAL_FACTOR_PERCENT, ETH_DECIMALS, PRICE_FEED_DECIMALS,
    USDT_DECIMALS,
};
use parking_lot::RwLock;
use tracing::debug;

use super::{Confirmation, Contracts, DebtToken, LendingLedger, PendingTransaction};

/// Shared chain state behind every account view
#[derive(Debug)]
struct LedgerState {
    lending_address: Address,
    /// Oracle price, 8 decimals
    price: RwLock<u128>,
    /// Loans by borrower, slot order
    loans: DashMap<Address, Vec<LoanRecord>>,
    /// Debt token allowances by (owner, spender)
    allowances: DashMap<(Address, Address), u128>,
    /// Reads of this slot index and above fail
    fail_reads_from: RwLock<Option<usize>>,
    /// The next write reverts at confirmation
    revert_next: AtomicBool,
    /// Fixed clock for new loans; wall clock when unset
    now: RwLock<Option<u64>>,
    next_tx: AtomicU64,
}

/// In-memory lending contract and debt token, viewed from one account
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    state: Arc<LedgerState>,
    account: Address,
}

impl InMemoryLedger {
    /// Create a ledger quoting `price` (8 decimals), viewed from `account`
    pub fn new(account: Address, price: u128) -> Self {
        Self {
            state: Arc::new(LedgerState {
                lending_address: Address::repeat_byte(0x1e),
                price: RwLock::new(price),
                loans: DashMap::new(),
                allowances: DashMap::new(),
                fail_reads_from: RwLock::new(None),
                revert_next: AtomicBool::new(false),
                now: RwLock::new(None),
                next_tx: AtomicU64::new(1),
            }),
            account,
        }
    }

    /// Same ledger viewed from another account
    pub fn as_account(&self, account: Address) -> Self {
        Self {
            state: self.state.clone(),
            account,
        }
    }

    /// Contract handles for the viewing account
    pub fn contracts(&self) -> Contracts {
        Contracts::new(Arc::new(self.clone()), Arc::new(self.clone()))
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn set_price(&self, price: u128) {
        *self.state.price.write() = price;
    }

    pub fn set_now(&self, now: u64) {
        *self.state.now.write() = Some(now);
    }

    /// Overwrite slot `index` of `owner`, padding with empty slots
    pub fn set_loan(&self, owner: Address, index: usize, loan: LoanRecord) {
        let mut loans = self.state.loans.entry(owner).or_default();
        if loans.len() <= index {
            loans.resize(index + 1, LoanRecord::default());
        }
        loans[index] = loan;
    }

    /// Add interest to slot `index` of `owner`
    pub fn accrue_interest(&self, owner: Address, index: usize, interest: u128) {
        if let Some(mut loans) = self.state.loans.get_mut(&owner) {
            if let Some(loan) = loans.get_mut(index) {
                loan.interest_accrued += interest;
            }
        }
    }

    /// Make reads at `index` and above fail
    pub fn fail_reads_from(&self, index: Option<usize>) {
        *self.state.fail_reads_from.write() = index;
    }

    /// Make the next write revert at confirmation
    pub fn revert_next_write(&self) {
        self.state.revert_next.store(true, Ordering::SeqCst);
    }

    /// Current allowance from `owner` to `spender`
    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.state
            .allowances
            .get(&(owner, spender))
            .map(|a| *a)
            .unwrap_or(0)
    }

    /// Loans stored for `owner`, including any unused slots
    pub fn stored_loans(&self, owner: Address) -> Vec<LoanRecord> {
        self.state
            .loans
            .get(&owner)
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    fn now(&self) -> u64 {
        self.state
            .now
            .read()
            .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64)
    }

    fn next_hash(&self) -> B256 {
        let n = self.state.next_tx.fetch_add(1, Ordering::Relaxed);
        B256::left_padding_from(&n.to_be_bytes())
    }

    /// Execute a write, turning a scheduled revert or a rule violation into
    /// a handle that fails at confirmation
    fn execute<F>(&self, apply: F) -> Box<dyn PendingTransaction>
    where
        F: FnOnce() -> std::result::Result<(), String>,
    {
        let hash = self.next_hash();
        let outcome = if self.state.revert_next.swap(false, Ordering::SeqCst) {
            Err("reverted by simulation".to_string())
        } else {
            apply()
        };

        if let Err(reason) = &outcome {
            debug!(tx = %hash, reason = %reason, "Simulated transaction reverted");
        }
        Box::new(SimulatedTransaction { hash, outcome })
    }

    /// Whether `collateral_wei` covers `amount` USDT at the collateral factor
    fn covers(&self, amount: u128, collateral_wei: u128) -> bool {
        let price = *self.state.price.read();
        // collateral * price is scaled by 10^(18 + 8); scale debt to match
        let scale = 10u128.pow(ETH_DECIMALS + PRICE_FEED_DECIMALS - USDT_DECIMALS);
        let collateral_value = collateral_wei.checked_mul(price);
        let required = amount
            .checked_mul(scale)
            .and_then(|v| v.checked_mul(COLLATERAL_FACTOR_PERCENT as u128))
            .map(|v| v / 100);
        match (collateral_value, required) {
            (Some(have), Some(need)) => have >= need,
            _ => false,
        }
    }
}

struct SimulatedTransaction {
    hash: B256,
    outcome: std::result::Result<(), String>,
}

#[async_trait]
impl PendingTransaction for SimulatedTransaction {
    fn hash(&self) -> B256 {
        self.hash
    }

    async fn wait(&self) -> Result<Confirmation> {
        match &self.outcome {
            Ok(()) => Ok(Confirmation {
                tx_hash: self.hash,
                block_number: None,
            }),
            Err(reason) => Err(LedgerError::Reverted {
                tx_hash: self.hash.to_string(),
                reason: reason.clone(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl LendingLedger for InMemoryLedger {
    fn address(&self) -> Address {
        self.state.lending_address
    }

    async fn eth_usd_price(&self) -> Result<u128> {
        Ok(*self.state.price.read())
    }

    async fn loan(&self, owner: Address, index: usize) -> Result<LoanRecord> {
        if let Some(from) = *self.state.fail_reads_from.read() {
            if index >= from {
                return Err(LedgerError::Read(format!("slot {} unavailable", index)).into());
            }
        }

        Ok(self
            .state
            .loans
            .get(&owner)
            .and_then(|loans| loans.get(index).copied())
            .unwrap_or_default())
    }

    async fn take_loan(
        &self,
        amount: u128,
        collateral_wei: u128,
    ) -> Result<Box<dyn PendingTransaction>> {
        let start = self.now();
        Ok(self.execute(|| {
            if amount == 0 {
                return Err("amount must be positive".to_string());
            }
            if !self.covers(amount, collateral_wei) {
                return Err("insufficient collateral".to_string());
            }
            self.state
                .loans
                .entry(self.account)
                .or_default()
                .push(LoanRecord::new(amount, collateral_wei, start));
            Ok(())
        }))
    }

    async fn repay_loan(&self, index: usize, amount: u128) -> Result<Box<dyn PendingTransaction>> {
        let key = (self.account, self.state.lending_address);
        Ok(self.execute(|| {
            let mut loans = self.state.loans.entry(self.account).or_default();
            let debt = match loans.get(index) {
                Some(loan) if !loan.is_sentinel() => loan.total_debt(),
                _ => return Err(format!("no loan at index {}", index)),
            };
            if amount < debt {
                return Err("amount below outstanding debt".to_string());
            }

            let allowance = self.state.allowances.get(&key).map(|a| *a).unwrap_or(0);
            if allowance < amount {
                return Err("insufficient allowance".to_string());
            }

            self.state.allowances.insert(key, allowance - amount);
            loans.remove(index);
            Ok(())
        }))
    }
}

#[async_trait]
impl DebtToken for InMemoryLedger {
    async fn approve(&self, spender: Address, amount: u128) -> Result<Box<dyn PendingTransaction>> {
        Ok(self.execute(|| {
            self.state.allowances.insert((self.account, spender), amount);
            Ok(())
        }))
    }
}

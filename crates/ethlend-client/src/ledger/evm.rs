//! EVM contract bindings
//!
//! ABI-encodes the lending contract and ERC-20 calls with `alloy-sol-types`
//! and routes them through an [`RpcTransport`]. Writes are signed by the
//! wallet for the connected account; confirmation is awaited by polling the
//! receipt.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use ethlend_common::{EthlendError, LedgerError, LoanRecord, Result};
use tracing::{debug, instrument, warn};

use super::{Confirmation, Contracts, DebtToken, LendingLedger, PendingTransaction};
use crate::wallet::provider::{RpcTransport, TransactionRequest};

sol! {
    interface ILendingProtocol {
        function getETHUSDPrice() external view returns (int256);
        function loans(address user, uint256 index) external view returns (
            uint256 principal,
            uint256 interestAccrued,
            uint256 collateralETH,
            uint256 startTimestamp
        );
        function takeLoan(uint256 amount) external payable;
        function repayLoan(uint256 index, uint256 amount) external;
    }

    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// How long and how often to poll for a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

fn decode_error(field: &'static str) -> impl FnOnce(alloy_sol_types::Error) -> EthlendError {
    move |e| {
        LedgerError::Decode {
            field,
            reason: e.to_string(),
        }
        .into()
    }
}

fn narrow_u128(value: U256, field: &'static str) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(LedgerError::Decode {
            field,
            reason: format!("{} exceeds 128 bits", value),
        }
        .into());
    }
    Ok(value.to::<u128>())
}

fn narrow_u64(value: U256, field: &'static str) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(LedgerError::Decode {
            field,
            reason: format!("{} exceeds 64 bits", value),
        }
        .into());
    }
    Ok(value.to::<u64>())
}

/// Transaction submitted through the wallet
pub struct EvmPendingTransaction {
    hash: B256,
    transport: Arc<dyn RpcTransport>,
    policy: ConfirmationPolicy,
}

#[async_trait]
impl PendingTransaction for EvmPendingTransaction {
    fn hash(&self) -> B256 {
        self.hash
    }

    #[instrument(skip(self), fields(tx = %self.hash))]
    async fn wait(&self) -> Result<Confirmation> {
        let started = tokio::time::Instant::now();
        loop {
            match self.transport.transaction_receipt(self.hash).await? {
                Some(receipt) if receipt.succeeded() => {
                    debug!(block = ?receipt.block(), "Transaction confirmed");
                    return Ok(Confirmation {
                        tx_hash: self.hash,
                        block_number: receipt.block(),
                    });
                }
                Some(_) => {
                    warn!("Transaction reverted");
                    return Err(LedgerError::Reverted {
                        tx_hash: self.hash.to_string(),
                        reason: "receipt status 0".to_string(),
                    }
                    .into());
                }
                None => {}
            }

            let waited = started.elapsed();
            if waited >= self.policy.timeout {
                return Err(LedgerError::NotConfirmed {
                    tx_hash: self.hash.to_string(),
                    waited_ms: waited.as_millis() as u64,
                }
                .into());
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }
}

/// Shared plumbing for both contract bindings
#[derive(Clone)]
struct Binding {
    transport: Arc<dyn RpcTransport>,
    account: Address,
    contract: Address,
    policy: ConfirmationPolicy,
}

impl Binding {
    async fn read(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let bytes = self
            .transport
            .call(TransactionRequest::call(self.contract, data))
            .await?;
        Ok(bytes.to_vec())
    }

    async fn submit(&self, request: TransactionRequest) -> Result<Box<dyn PendingTransaction>> {
        let hash = self.transport.send_transaction(request).await?;
        debug!(tx = %hash, to = %self.contract, "Transaction submitted");
        Ok(Box::new(EvmPendingTransaction {
            hash,
            transport: self.transport.clone(),
            policy: self.policy,
        }))
    }
}

/// Lending contract deployed on an EVM chain
pub struct EvmLendingLedger {
    binding: Binding,
}

impl EvmLendingLedger {
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        account: Address,
        contract: Address,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            binding: Binding {
                transport,
                account,
                contract,
                policy,
            },
        }
    }
}

#[async_trait]
impl LendingLedger for EvmLendingLedger {
    fn address(&self) -> Address {
        self.binding.contract
    }

    #[instrument(skip(self))]
    async fn eth_usd_price(&self) -> Result<u128> {
        let data = self
            .binding
            .read(ILendingProtocol::getETHUSDPriceCall {}.abi_encode())
            .await?;
        let price = ILendingProtocol::getETHUSDPriceCall::abi_decode_returns(&data, true)
            .map_err(decode_error("price"))?
            ._0;

        if price.is_negative() {
            return Err(LedgerError::Decode {
                field: "price",
                reason: format!("negative oracle price {}", price),
            }
            .into());
        }
        narrow_u128(price.into_raw(), "price")
    }

    #[instrument(skip(self))]
    async fn loan(&self, owner: Address, index: usize) -> Result<LoanRecord> {
        let call = ILendingProtocol::loansCall {
            user: owner,
            index: U256::from(index),
        };
        let data = self.binding.read(call.abi_encode()).await?;
        let ret = ILendingProtocol::loansCall::abi_decode_returns(&data, true)
            .map_err(decode_error("loan"))?;

        Ok(LoanRecord {
            principal: narrow_u128(ret.principal, "principal")?,
            interest_accrued: narrow_u128(ret.interestAccrued, "interestAccrued")?,
            collateral_eth: narrow_u128(ret.collateralETH, "collateralETH")?,
            start_timestamp: narrow_u64(ret.startTimestamp, "startTimestamp")?,
        })
    }

    #[instrument(skip(self))]
    async fn take_loan(
        &self,
        amount: u128,
        collateral_wei: u128,
    ) -> Result<Box<dyn PendingTransaction>> {
        let call = ILendingProtocol::takeLoanCall {
            amount: U256::from(amount),
        };
        let request =
            TransactionRequest::transaction(self.binding.account, self.binding.contract, call.abi_encode())
                .with_value(U256::from(collateral_wei));
        self.binding.submit(request).await
    }

    #[instrument(skip(self))]
    async fn repay_loan(&self, index: usize, amount: u128) -> Result<Box<dyn PendingTransaction>> {
        let call = ILendingProtocol::repayLoanCall {
            index: U256::from(index),
            amount: U256::from(amount),
        };
        let request =
            TransactionRequest::transaction(self.binding.account, self.binding.contract, call.abi_encode());
        self.binding.submit(request).await
    }
}

/// ERC-20 debt token deployed on an EVM chain
pub struct EvmDebtToken {
    binding: Binding,
}

impl EvmDebtToken {
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        account: Address,
        contract: Address,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            binding: Binding {
                transport,
                account,
                contract,
                policy,
            },
        }
    }
}

#[async_trait]
impl DebtToken for EvmDebtToken {
    #[instrument(skip(self))]
    async fn approve(&self, spender: Address, amount: u128) -> Result<Box<dyn PendingTransaction>> {
        let call = IERC20::approveCall {
            spender,
            amount: U256::from(amount),
        };
        let request =
            TransactionRequest::transaction(self.binding.account, self.binding.contract, call.abi_encode());
        self.binding.submit(request).await
    }
}

impl Contracts {
    /// Bind both deployed contracts to `account` through `transport`
    pub fn bind_evm(
        transport: Arc<dyn RpcTransport>,
        account: Address,
        lending: Address,
        debt_token: Address,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self::new(
            Arc::new(EvmLendingLedger::new(transport.clone(), account, lending, policy)),
            Arc::new(EvmDebtToken::new(transport, account, debt_token, policy)),
        )
    }
}

//! Take-loan and repay flows
//!
//! Both flows submit, wait for confirmation, notify and then re-probe the
//! loan list. A failed flow leaves the controller state as it was.

use ethlend_common::{parse_units, EthlendError, Result, ETH_DECIMALS, USDT_DECIMALS};
use tracing::{debug, error, info, instrument};

use super::{Connection, LendingController};
use crate::ledger::Confirmation;
use crate::notice::Notice;

/// How a user action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Submitted and confirmed
    Completed,
    /// Nothing to do: not connected or no such loan
    Skipped,
}

impl LendingController {
    /// Borrow `usdt_amount` USDT against `eth_collateral` ETH
    #[instrument(skip(self))]
    pub async fn take_loan(&self, usdt_amount: &str, eth_collateral: &str) -> Result<ActionOutcome> {
        let Some(connection) = self.connection() else {
            self.notifier().notify(Notice::ConnectWalletFirst);
            return Err(EthlendError::NotConnected);
        };
        let _in_flight = self.take_loan_in_flight.acquire("take loan")?;

        match submit_take_loan(&connection, usdt_amount, eth_collateral).await {
            Ok(confirmation) => {
                info!(tx = %confirmation.tx_hash, block = ?confirmation.block_number, "Loan taken");
                self.notifier().notify(Notice::LoanTaken);
                self.reload_loans(&connection).await;
                Ok(ActionOutcome::Completed)
            }
            Err(e) => {
                error!(error = %e, "Take loan failed");
                self.notifier().notify(Notice::TakeLoanFailed);
                Err(e)
            }
        }
    }

    /// Borrow the committed amount against the derived collateral
    pub async fn take_loan_from_inputs(&self) -> Result<ActionOutcome> {
        let (amount, collateral) = {
            let state = self.state.read();
            (state.usdt_amount.clone(), state.eth_collateral)
        };

        let collateral = match collateral {
            Some(collateral) if !amount.trim().is_empty() => collateral,
            _ => {
                return Err(EthlendError::InvalidInput(
                    "required collateral is unknown; enter an amount once the price is loaded"
                        .to_string(),
                ))
            }
        };

        self.take_loan(amount.trim(), &collateral.to_string()).await
    }

    /// Repay the full debt of the loan in slot `index`.
    ///
    /// Grants the lending contract an allowance for exactly principal plus
    /// interest, then repays that amount.
    #[instrument(skip(self))]
    pub async fn repay_loan(&self, index: usize) -> Result<ActionOutcome> {
        let Some(connection) = self.connection() else {
            debug!("Repay requested while disconnected");
            return Ok(ActionOutcome::Skipped);
        };
        let loan = {
            let state = self.state.read();
            state.loans.get(index).copied()
        };
        let Some(loan) = loan else {
            debug!("No loan in slot");
            return Ok(ActionOutcome::Skipped);
        };
        let _in_flight = self.repay_in_flight.acquire("repay")?;

        match submit_repayment(&connection, index, loan.total_debt()).await {
            Ok(confirmation) => {
                info!(tx = %confirmation.tx_hash, "Loan repaid");
                self.notifier().notify(Notice::LoanRepaid);
                self.reload_loans(&connection).await;
                Ok(ActionOutcome::Completed)
            }
            Err(e) => {
                error!(error = %e, "Repayment failed");
                self.notifier().notify(Notice::RepaymentFailed);
                Err(e)
            }
        }
    }
}

async fn submit_take_loan(
    connection: &Connection,
    usdt_amount: &str,
    eth_collateral: &str,
) -> Result<Confirmation> {
    let amount = parse_units(usdt_amount, USDT_DECIMALS)?;
    let collateral_wei = parse_units(eth_collateral, ETH_DECIMALS)?;

    let pending = connection
        .contracts
        .lending
        .take_loan(amount, collateral_wei)
        .await?;
    debug!(tx = %pending.hash(), "takeLoan submitted");
    pending.wait().await
}

async fn submit_repayment(
    connection: &Connection,
    index: usize,
    total_debt: u128,
) -> Result<Confirmation> {
    let spender = connection.contracts.lending.address();

    let approval = connection.contracts.debt_token.approve(spender, total_debt).await?;
    debug!(tx = %approval.hash(), total_debt, "approve submitted");
    approval.wait().await?;

    let repayment = connection
        .contracts
        .lending
        .repay_loan(index, total_debt)
        .await?;
    debug!(tx = %repayment.hash(), "repayLoan submitted");
    repayment.wait().await
}

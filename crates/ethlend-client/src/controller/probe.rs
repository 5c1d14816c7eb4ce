//! Loan-list refresh probe
//!
//! The contract has no loan count, so the probe reads slots `0, 1, 2, ...`
//! until the first unused slot. The slot index is the loan identifier used
//! for repayment, so order is preserved.

use alloy_primitives::Address;
use ethlend_common::LoanRecord;
use tracing::{debug, instrument, warn};

use crate::ledger::LendingLedger;

/// Read the loans of `owner`, at most `max_slots` of them.
///
/// Stops at the first sentinel record or the first failed read. A failed
/// read ends the list like a sentinel does, so a failure on slot 0 yields an
/// empty list rather than an error.
#[instrument(skip(ledger))]
pub async fn refresh_loans(
    ledger: &dyn LendingLedger,
    owner: Address,
    max_slots: usize,
) -> Vec<LoanRecord> {
    let mut loans = Vec::new();

    for index in 0..max_slots {
        match ledger.loan(owner, index).await {
            Ok(loan) if loan.is_sentinel() => {
                debug!(index, "Reached unused loan slot");
                break;
            }
            Ok(loan) => loans.push(loan),
            Err(e) => {
                warn!(index, error = %e, "Loan read failed, ending scan");
                break;
            }
        }
    }

    if loans.len() == max_slots {
        debug!(max_slots, "Probe ceiling reached; later loans are not shown");
    }
    loans
}

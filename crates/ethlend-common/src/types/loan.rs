//! Loan record - cached copy of one lending contract slot
//!
//! The contract keeps loans per borrower in numbered slots. A slot whose
//! principal and collateral are both zero is unused and marks the end of the
//! borrower's list. Records are never mutated by the client; they are replaced
//! wholesale on every refresh.

use crate::error::UnitsError;
use crate::types::units::format_units;
use crate::{ETH_DECIMALS, USDT_DECIMALS};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One loan slot as returned by `loans(address, index)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Borrowed amount in USDT smallest units
    pub principal: u128,

    /// Interest accrued so far in USDT smallest units
    pub interest_accrued: u128,

    /// Locked collateral in wei
    pub collateral_eth: u128,

    /// Loan creation time (Unix seconds)
    pub start_timestamp: u64,
}

impl LoanRecord {
    /// Create a freshly opened loan with no interest
    pub fn new(principal: u128, collateral_eth: u128, start_timestamp: u64) -> Self {
        Self {
            principal,
            interest_accrued: 0,
            collateral_eth,
            start_timestamp,
        }
    }

    /// Unused slot marker: no principal and no collateral
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.principal == 0 && self.collateral_eth == 0
    }

    /// Principal plus accrued interest, in USDT smallest units
    #[inline]
    pub fn total_debt(&self) -> u128 {
        self.principal.saturating_add(self.interest_accrued)
    }

    /// Total debt in whole USDT
    pub fn total_debt_usdt(&self) -> Result<Decimal, UnitsError> {
        format_units(self.total_debt(), USDT_DECIMALS)
    }

    /// Collateral in whole ETH
    pub fn collateral_eth_amount(&self) -> Result<Decimal, UnitsError> {
        format_units(self.collateral_eth, ETH_DECIMALS)
    }

    /// Time after which the loan counts as expired
    pub fn expiry_timestamp(&self, max_duration_secs: u64) -> u64 {
        self.start_timestamp.saturating_add(max_duration_secs)
    }

    /// Whether `now` is strictly past the expiry time
    pub fn is_expired(&self, now: u64, max_duration_secs: u64) -> bool {
        now > self.expiry_timestamp(max_duration_secs)
    }
}

impl std::fmt::Display for LoanRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LoanRecord(principal={}, interest={}, collateral_wei={}, start={})",
            self.principal, self.interest_accrued, self.collateral_eth, self.start_timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_LOAN_DURATION_SECS;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sentinel() {
        assert!(LoanRecord::default().is_sentinel());

        let interest_only = LoanRecord {
            interest_accrued: 5,
            ..Default::default()
        };
        assert!(interest_only.is_sentinel());

        assert!(!LoanRecord::new(1, 0, 0).is_sentinel());
        assert!(!LoanRecord::new(0, 1, 0).is_sentinel());
    }

    #[test]
    fn test_total_debt_is_numeric_sum() {
        let loan = LoanRecord {
            principal: 500_000_000,
            interest_accrued: 10_000_000,
            collateral_eth: 0,
            start_timestamp: 0,
        };
        assert_eq!(loan.total_debt(), 510_000_000);
        assert_eq!(loan.total_debt_usdt().unwrap(), dec!(510));
    }

    #[test]
    fn test_expiry_boundary() {
        let loan = LoanRecord::new(1, 1, 1_000);
        let expiry = 1_000 + MAX_LOAN_DURATION_SECS;

        assert_eq!(loan.expiry_timestamp(MAX_LOAN_DURATION_SECS), expiry);
        assert!(!loan.is_expired(expiry, MAX_LOAN_DURATION_SECS));
        assert!(loan.is_expired(expiry + 1, MAX_LOAN_DURATION_SECS));
    }

    #[test]
    fn test_collateral_amount() {
        let loan = LoanRecord::new(0, 1_500_000_000_000_000_000, 0);
        assert_eq!(loan.collateral_eth_amount().unwrap(), dec!(1.5));
    }
}

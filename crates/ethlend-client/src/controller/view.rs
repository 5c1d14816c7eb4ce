//! Display rows for the loan list

use chrono::{Local, TimeZone};
use ethlend_common::{format_units, LoanRecord, UnitsError, ETH_DECIMALS, USDT_DECIMALS};
use rust_decimal::Decimal;
use serde::Serialize;

/// One loan as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanView {
    /// Slot index, passed to repay
    pub index: usize,
    /// 1-based number shown to the user
    pub number: usize,
    pub principal_usdt: Decimal,
    pub interest_usdt: Decimal,
    pub collateral_eth: Decimal,
    pub start_timestamp: u64,
    pub expiry_timestamp: u64,
}

impl LoanView {
    pub fn from_record(
        index: usize,
        loan: &LoanRecord,
        max_duration_secs: u64,
    ) -> Result<Self, UnitsError> {
        Ok(Self {
            index,
            number: index + 1,
            principal_usdt: format_units(loan.principal, USDT_DECIMALS)?,
            interest_usdt: format_units(loan.interest_accrued, USDT_DECIMALS)?,
            collateral_eth: format_units(loan.collateral_eth, ETH_DECIMALS)?,
            start_timestamp: loan.start_timestamp,
            expiry_timestamp: loan.expiry_timestamp(max_duration_secs),
        })
    }

    pub fn start(&self) -> String {
        format_timestamp(self.start_timestamp)
    }

    pub fn expiry(&self) -> String {
        format_timestamp(self.expiry_timestamp)
    }
}

/// Local date-time of a Unix timestamp
pub fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethlend_common::MAX_LOAN_DURATION_SECS;
    use rust_decimal_macros::dec;

    #[test]
    fn test_view_from_record() {
        let loan = LoanRecord {
            principal: 500_000_000,
            interest_accrued: 1_250_000,
            collateral_eth: 350_000_000_000_000_000,
            start_timestamp: 1_700_000_000,
        };
        let view = LoanView::from_record(2, &loan, MAX_LOAN_DURATION_SECS).unwrap();

        assert_eq!(view.number, 3);
        assert_eq!(view.principal_usdt, dec!(500));
        assert_eq!(view.interest_usdt, dec!(1.25));
        assert_eq!(view.collateral_eth, dec!(0.35));
        assert_eq!(view.expiry_timestamp, 1_700_000_000 + MAX_LOAN_DURATION_SECS);
    }

    #[test]
    fn test_format_timestamp_shape() {
        let formatted = format_timestamp(1_700_000_000);
        assert_eq!(formatted.len(), "2023-11-14 22:13:20".len());
        assert!(formatted.starts_with("2023-11-1"));
    }

    #[test]
    fn test_out_of_range_timestamp_falls_back() {
        assert_eq!(format_timestamp(u64::MAX), u64::MAX.to_string());
    }
}

//! Loan health and expiry evaluation
//!
//! Produces the single warning shown above the loan list. Loans are scanned
//! in slot order and the first loan that trips a check decides the warning.
//! Within a loan the collateral check runs before the expiry check.

use ethlend_common::LoanRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// Warning derived from the loan list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthWarning {
    /// Collateral value is below the collateral factor of the debt
    LiquidationRisk,
    /// A loan is past its maximum duration
    Expired,
}

impl HealthWarning {
    pub fn message(&self) -> &'static str {
        match self {
            HealthWarning::LiquidationRisk => {
                "Your collateral value is below required minimum! Risk of liquidation."
            }
            HealthWarning::Expired => {
                "One or more loans have expired! Please repay or risk liquidation."
            }
        }
    }
}

impl std::fmt::Display for HealthWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Evaluate `loans` at `price` (USD per ETH) and time `now` (Unix seconds).
///
/// Returns `None` when every loan is healthy, and also for an empty list or a
/// non-positive price.
pub fn evaluate(
    loans: &[LoanRecord],
    price: Decimal,
    collateral_factor_percent: u32,
    max_duration_secs: u64,
    now: u64,
) -> Option<HealthWarning> {
    if loans.is_empty() || price <= Decimal::ZERO {
        return None;
    }

    let factor = Decimal::from(collateral_factor_percent) / dec!(100);

    for (index, loan) in loans.iter().enumerate() {
        if is_under_collateralized(loan, price, factor) {
            debug!(index, "Loan below collateral requirement");
            return Some(HealthWarning::LiquidationRisk);
        }

        if loan.is_expired(now, max_duration_secs) {
            debug!(index, "Loan past maximum duration");
            return Some(HealthWarning::Expired);
        }
    }

    None
}

fn is_under_collateralized(loan: &LoanRecord, price: Decimal, factor: Decimal) -> bool {
    // Amounts beyond the decimal range: debt too large to value is never
    // covered, collateral too large to value always covers
    let Ok(debt) = loan.total_debt_usdt() else {
        return true;
    };
    let Ok(collateral) = loan.collateral_eth_amount() else {
        return false;
    };

    match (collateral.checked_mul(price), debt.checked_mul(factor)) {
        (Some(collateral_value), Some(min_collateral_value)) => collateral_value < min_collateral_value,
        (_, None) => true,
        (None, Some(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethlend_common::MAX_LOAN_DURATION_SECS;

    const NOW: u64 = 1_700_000_000;
    const ONE_ETH: u128 = 1_000_000_000_000_000_000;

    fn usdt(whole: u128) -> u128 {
        whole * 1_000_000
    }

    fn healthy_loan() -> LoanRecord {
        // 1000 USDT against 1 ETH at 2000: 2000 >= 1500
        LoanRecord::new(usdt(1000), ONE_ETH, NOW - 60)
    }

    fn under_collateralized_loan() -> LoanRecord {
        // 510 USDT debt, 0.35 ETH = 700 USD at 2000, needs 765
        LoanRecord {
            principal: usdt(500),
            interest_accrued: usdt(10),
            collateral_eth: 35 * ONE_ETH / 100,
            start_timestamp: NOW - 60,
        }
    }

    fn expired_loan() -> LoanRecord {
        LoanRecord::new(usdt(100), ONE_ETH, NOW - MAX_LOAN_DURATION_SECS - 1)
    }

    fn eval(loans: &[LoanRecord]) -> Option<HealthWarning> {
        evaluate(loans, dec!(2000), 150, MAX_LOAN_DURATION_SECS, NOW)
    }

    #[test]
    fn test_healthy_list_has_no_warning() {
        assert_eq!(eval(&[healthy_loan(), healthy_loan()]), None);
    }

    #[test]
    fn test_worked_example_warns() {
        assert_eq!(
            eval(&[under_collateralized_loan()]),
            Some(HealthWarning::LiquidationRisk)
        );
    }

    #[test]
    fn test_first_violation_wins() {
        assert_eq!(
            eval(&[under_collateralized_loan(), expired_loan()]),
            Some(HealthWarning::LiquidationRisk)
        );
        assert_eq!(
            eval(&[expired_loan(), under_collateralized_loan()]),
            Some(HealthWarning::Expired)
        );
    }

    #[test]
    fn test_collateral_checked_before_expiry_on_same_loan() {
        let loan = LoanRecord {
            start_timestamp: NOW - MAX_LOAN_DURATION_SECS - 1,
            ..under_collateralized_loan()
        };
        assert_eq!(eval(&[loan]), Some(HealthWarning::LiquidationRisk));
    }

    #[test]
    fn test_expiry_is_strictly_after_deadline() {
        let at_deadline = LoanRecord::new(usdt(100), ONE_ETH, NOW - MAX_LOAN_DURATION_SECS);
        assert_eq!(eval(&[at_deadline]), None);
        assert_eq!(eval(&[expired_loan()]), Some(HealthWarning::Expired));
    }

    #[test]
    fn test_exact_requirement_is_healthy() {
        // 0.75 ETH at 2000 = 1500 = 1000 * 1.5
        let loan = LoanRecord::new(usdt(1000), 3 * ONE_ETH / 4, NOW);
        assert_eq!(eval(&[loan]), None);
    }

    #[test]
    fn test_interest_counts_toward_debt() {
        let mut loan = LoanRecord::new(usdt(1000), 3 * ONE_ETH / 4, NOW);
        loan.interest_accrued = 1;
        assert_eq!(eval(&[loan]), Some(HealthWarning::LiquidationRisk));
    }

    #[test]
    fn test_no_warning_without_price_or_loans() {
        assert_eq!(eval(&[]), None);
        assert_eq!(
            evaluate(
                &[under_collateralized_loan()],
                Decimal::ZERO,
                150,
                MAX_LOAN_DURATION_SECS,
                NOW
            ),
            None
        );
    }

    #[test]
    fn test_message_text() {
        assert!(HealthWarning::LiquidationRisk.to_string().contains("Risk of liquidation"));
        assert!(HealthWarning::Expired.to_string().contains("expired"));
    }
}

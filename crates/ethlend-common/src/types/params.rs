//! Parameters of the lending contract deployment

use serde::{Deserialize, Serialize};

/// Protocol parameters mirrored by the client.
///
/// The contract enforces these; the client only uses them to derive the
/// collateral requirement and the health warning, and to show them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Required collateral value as a percentage of debt value
    pub collateral_factor_percent: u32,
    /// Yearly interest rate in percent (informational)
    pub interest_rate_per_year: u32,
    /// Seconds after `start_timestamp` at which a loan expires
    pub max_loan_duration_secs: u64,
    /// Number of slots read by the loan probe
    pub max_loan_slots: usize,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            collateral_factor_percent: crate::COLLATERAL_FACTOR_PERCENT,
            interest_rate_per_year: crate::INTEREST_RATE_PER_YEAR,
            max_loan_duration_secs: crate::MAX_LOAN_DURATION_SECS,
            max_loan_slots: crate::MAX_LOAN_SLOTS,
        }
    }
}

impl ProtocolParams {
    /// Maximum loan duration in whole days
    pub fn max_loan_duration_days(&self) -> u64 {
        self.max_loan_duration_secs / (24 * 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let params = ProtocolParams::default();
        assert_eq!(params.collateral_factor_percent, 150);
        assert_eq!(params.interest_rate_per_year, 5);
        assert_eq!(params.max_loan_duration_days(), 30);
        assert_eq!(params.max_loan_slots, 10);
    }
}

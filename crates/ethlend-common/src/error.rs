//! Error types for Ethlend
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using EthlendError
pub type Result<T> = std::result::Result<T, EthlendError>;

/// Unified error type for Ethlend operations
#[derive(Debug, Error)]
pub enum EthlendError {
    // Wallet errors
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    // Ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    // Amount parsing and formatting errors
    #[error("Amount error: {0}")]
    Units(#[from] UnitsError),

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("A {0} request is already in flight")]
    ActionInFlight(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wallet provider errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet provider not found")]
    ProviderNotFound,

    #[error("Request rejected by user: {0}")]
    UserRejected(String),

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("Provider error {code}: {message}")]
    Rpc { code: i64, message: String },
}

/// Errors reading from or writing to the lending contract
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Read failed: {0}")]
    Read(String),

    #[error("Transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: String, reason: String },

    #[error("Transaction {tx_hash} not confirmed after {waited_ms}ms")]
    NotConfirmed { tx_hash: String, waited_ms: u64 },

    #[error("Failed to decode {field}: {reason}")]
    Decode { field: &'static str, reason: String },
}

/// Decimal string and fixed-point conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Amount is empty")]
    Empty,

    #[error("Not a decimal number: {0}")]
    InvalidNumber(String),

    #[error("Amount must not be negative")]
    Negative,

    #[error("{value} has more than {decimals} decimal places")]
    TooManyDecimals { value: String, decimals: u32 },

    #[error("Amount does not fit the fixed-point range")]
    Overflow,
}

impl From<serde_json::Error> for EthlendError {
    fn from(err: serde_json::Error) -> Self {
        EthlendError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for EthlendError {
    fn from(err: anyhow::Error) -> Self {
        EthlendError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EthlendError::Ledger(LedgerError::NotConfirmed {
            tx_hash: "0xab".to_string(),
            waited_ms: 120_000,
        });
        assert!(err.to_string().contains("0xab not confirmed after 120000ms"));
    }

    #[test]
    fn test_units_error() {
        let err = UnitsError::TooManyDecimals {
            value: "1.1234567".to_string(),
            decimals: 6,
        };
        assert!(err.to_string().contains("more than 6"));
    }

    #[test]
    fn test_in_flight_names_action() {
        let err = EthlendError::ActionInFlight("repay");
        assert_eq!(err.to_string(), "A repay request is already in flight");
    }
}

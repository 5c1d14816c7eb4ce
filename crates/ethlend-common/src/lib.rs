//! # Ethlend Common
//!
//! Shared types, errors, and fixed-point helpers for the Ethlend lending client.
//!
//! ## Core Types
//!
//! - [`LoanRecord`]: cached copy of one loan slot held by the lending contract
//! - [`ProtocolParams`]: parameters of the fixed contract deployment
//! - [`units`]: conversion between human decimals and on-chain integers
//!
//! All amounts read from or written to the ledger are integers in the smallest
//! unit of their asset. Anything shown to the user goes through [`units`].

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use alloy_primitives::Address;
pub use error::{EthlendError, LedgerError, Result, UnitsError, WalletError};
pub use types::{
    loan::LoanRecord,
    params::ProtocolParams,
    units::{self, format_units, parse_units, to_fixed},
};

/// Ethlend version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Decimals of the ETH/USD price feed
pub const PRICE_FEED_DECIMALS: u32 = 8;

/// Decimals of the borrowed stablecoin (USDT)
pub const USDT_DECIMALS: u32 = 6;

/// Decimals of native ETH (wei)
pub const ETH_DECIMALS: u32 = 18;

/// Yearly interest rate charged by the contract, in percent
pub const INTEREST_RATE_PER_YEAR: u32 = 5;

/// Collateral value required per unit of debt value, in percent
pub const COLLATERAL_FACTOR_PERCENT: u32 = 150;

/// Maximum loan duration before it counts as expired (30 days)
pub const MAX_LOAN_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Number of loan slots probed per account.
///
/// The contract exposes no loan count, so loans at index 10 and above are
/// never read.
pub const MAX_LOAN_SLOTS: usize = 10;

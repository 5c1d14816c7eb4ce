//! # Ethlend Client
//!
//! Wallet connection and derived state for one fixed deployment of the
//! ETH-collateralized USDT lending contract.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     LendingController                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │  Collateral  │  │    Health    │  │   Take / Repay    │  │
//! │  │  calculator  │  │   evaluator  │  │     actions       │  │
//! │  └──────────────┘  └──────────────┘  └─────────┬─────────┘  │
//! │                                                │            │
//! │  ┌─────────────────────────────────────────────┴─────────┐  │
//! │  │                 Loan refresh probe                     │  │
//! │  └─────────────────────────┬──────────────────────────────┘  │
//! └────────────────────────────┼─────────────────────────────────┘
//!                              │
//!     ┌────────────────────────┴──────────────────────┐
//!     │  LendingLedger / DebtToken (EVM or in-memory) │
//!     └────────────────────────┬──────────────────────┘
//!                              │
//!              ┌───────────────┴──────────────┐
//!              │  WalletConnector → Session   │
//!              └──────────────────────────────┘
//! ```
//!
//! The controller never updates loans speculatively: every confirmed write is
//! followed by a fresh probe of the ledger.

pub mod config;
pub mod controller;
pub mod ledger;
pub mod notice;
pub mod wallet;

pub use config::EthlendConfig;
pub use controller::{
    collateral::required_collateral,
    health::{evaluate, HealthWarning},
    probe::refresh_loans,
    view::LoanView,
    ActionOutcome, Clock, ControllerState, FixedClock, LendingController, SystemClock,
};
pub use ledger::{
    evm::ConfirmationPolicy, memory::InMemoryLedger, Confirmation, Contracts, DebtToken,
    LendingLedger, PendingTransaction,
};
pub use notice::{Notice, Notifier, RecordingNotifier};
pub use wallet::{
    connector::{shorten_address, Session, WalletConnector},
    provider::{RpcTransport, TransactionReceipt, TransactionRequest, UnlockedWallet, WalletProvider},
    rpc::JsonRpcWallet,
};

//! Application state controller
//!
//! [`LendingController`] is the explicit context object behind the dashboard.
//! It owns the price, the borrow input, the loan list and the derived values.
//! Two rules re-derive state whenever their inputs are committed:
//!
//! - price or borrow amount changed → required collateral
//! - loans or price changed → health warning

pub mod actions;
pub mod collateral;
pub mod health;
pub mod probe;
pub mod view;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use ethlend_common::{
    format_units, EthlendError, LoanRecord, ProtocolParams, Result, PRICE_FEED_DECIMALS,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

pub use actions::ActionOutcome;

use self::collateral::{required_collateral, round_collateral};
use self::health::{evaluate, HealthWarning};
use self::probe::refresh_loans;
use self::view::LoanView;
use crate::ledger::Contracts;
use crate::notice::Notifier;
use crate::wallet::connector::Session;

/// Source of the current Unix time
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Manually driven clock
#[derive(Debug, Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Snapshot of everything the dashboard renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub connected: bool,
    pub user_address: Option<Address>,
    /// ETH/USD price, zero until fetched
    pub eth_price: Decimal,
    /// Borrow amount as typed by the user
    pub usdt_amount: String,
    /// Required collateral, rounded for display; `None` while unknown
    pub eth_collateral: Option<Decimal>,
    /// Loans in slot order
    pub loans: Vec<LoanRecord>,
    pub warning: Option<HealthWarning>,
}

/// Connected account and its contract handles
#[derive(Clone)]
pub(crate) struct Connection {
    pub(crate) address: Address,
    pub(crate) contracts: Contracts,
}

/// Rejects a second concurrent run of the same action
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicBool);

pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl InFlight {
    pub(crate) fn acquire(&self, action: &'static str) -> Result<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!(action, "Action already in flight");
                EthlendError::ActionInFlight(action)
            })?;
        Ok(InFlightGuard(&self.0))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Lending dashboard controller
pub struct LendingController {
    params: ProtocolParams,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    state: RwLock<ControllerState>,
    connection: RwLock<Option<Connection>>,
    take_loan_in_flight: InFlight,
    repay_in_flight: InFlight,
}

impl LendingController {
    pub fn new(params: ProtocolParams, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            params,
            notifier,
            clock: Arc::new(SystemClock),
            state: RwLock::new(ControllerState::default()),
            connection: RwLock::new(None),
            take_loan_in_flight: InFlight::default(),
            repay_in_flight: InFlight::default(),
        }
    }

    /// Use `clock` for expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Current state snapshot
    pub fn state(&self) -> ControllerState {
        self.state.read().clone()
    }

    pub fn loans(&self) -> Vec<LoanRecord> {
        self.state.read().loans.clone()
    }

    pub fn warning(&self) -> Option<HealthWarning> {
        self.state.read().warning
    }

    pub fn eth_collateral(&self) -> Option<Decimal> {
        self.state.read().eth_collateral
    }

    pub fn is_connected(&self) -> bool {
        self.connection.read().is_some()
    }

    /// Whether a take-loan or repay request is outstanding
    pub fn is_busy(&self) -> bool {
        self.take_loan_in_flight.is_active() || self.repay_in_flight.is_active()
    }

    /// Display rows for the current loans
    pub fn loan_views(&self) -> Vec<LoanView> {
        let loans = self.loans();
        loans
            .iter()
            .enumerate()
            .filter_map(|(index, loan)| {
                LoanView::from_record(index, loan, self.params.max_loan_duration_secs)
                    .map_err(|e| warn!(index, error = %e, "Loan amounts out of display range"))
                    .ok()
            })
            .collect()
    }

    /// Bind a connected session: fetch the price once, then probe loans
    #[instrument(skip(self, session, contracts), fields(address = %session.address))]
    pub async fn on_wallet_connect(&self, session: &Session, contracts: Contracts) -> Result<()> {
        let connection = Connection {
            address: session.address,
            contracts,
        };
        *self.connection.write() = Some(connection.clone());
        self.update(|state| {
            state.connected = true;
            state.user_address = Some(session.address);
        });

        let raw_price = connection.contracts.lending.eth_usd_price().await?;
        let price = format_units(raw_price, PRICE_FEED_DECIMALS)?;
        info!(%price, "ETH/USD price loaded");
        self.set_price(price);

        self.reload_loans(&connection).await;
        Ok(())
    }

    /// Re-read the loan list from the ledger
    pub async fn refresh(&self) -> Result<()> {
        let connection = self.connection().ok_or(EthlendError::NotConnected)?;
        self.reload_loans(&connection).await;
        Ok(())
    }

    /// Commit a new borrow amount
    pub fn set_usdt_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.update(|state| state.usdt_amount = amount);
    }

    /// Commit a new price
    pub fn set_price(&self, price: Decimal) {
        self.update(|state| state.eth_price = price);
    }

    /// Commit a new loan list
    pub fn set_loans(&self, loans: Vec<LoanRecord>) {
        self.update(|state| state.loans = loans);
    }

    /// Re-evaluate the warning against the current time
    pub fn refresh_warning(&self) {
        self.update(|_| {});
    }

    pub(crate) fn connection(&self) -> Option<Connection> {
        self.connection.read().clone()
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub(crate) async fn reload_loans(&self, connection: &Connection) {
        let loans = refresh_loans(
            connection.contracts.lending.as_ref(),
            connection.address,
            self.params.max_loan_slots,
        )
        .await;
        debug!(count = loans.len(), "Loans refreshed");
        self.set_loans(loans);
    }

    /// Apply `mutate` and re-derive collateral and warning from the result
    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut ControllerState),
    {
        let now = self.clock.now();
        let mut state = self.state.write();
        mutate(&mut state);

        state.eth_collateral = required_collateral(
            &state.usdt_amount,
            state.eth_price,
            self.params.collateral_factor_percent,
        )
        .map(round_collateral);

        state.warning = evaluate(
            &state.loans,
            state.eth_price,
            self.params.collateral_factor_percent,
            self.params.max_loan_duration_secs,
            now,
        );
    }
}

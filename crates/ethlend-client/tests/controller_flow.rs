//! End-to-end dashboard flows against the in-memory ledger

use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use ethlend_client::{
    ActionOutcome, Contracts, FixedClock, HealthWarning, InMemoryLedger, LendingController,
    LendingLedger, Notice, PendingTransaction, RecordingNotifier, Session, UnlockedWallet,
    WalletConnector, WalletProvider,
};
use ethlend_common::{
    EthlendError, LedgerError, LoanRecord, ProtocolParams, Result, WalletError,
    MAX_LOAN_DURATION_SECS,
};
use futures::poll;
use rust_decimal_macros::dec;
use tokio::sync::Notify;

const NOW: u64 = 1_700_000_000;
const ONE_ETH: u128 = 1_000_000_000_000_000_000;
const PRICE_2000: u128 = 200_000_000_000;

fn borrower() -> Address {
    Address::repeat_byte(0x42)
}

fn controller(notices: Arc<RecordingNotifier>) -> LendingController {
    LendingController::new(ProtocolParams::default(), notices)
        .with_clock(Arc::new(FixedClock::new(NOW)))
}

async fn connect(
    controller: &LendingController,
    notices: Arc<RecordingNotifier>,
    contracts: Contracts,
) -> Option<Session> {
    let connector = WalletConnector::new(Some(Arc::new(UnlockedWallet::single(borrower()))), notices);
    connector
        .connect_with(|session| async move { controller.on_wallet_connect(&session, contracts).await })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_borrow_and_repay_cycle() {
    let notices = Arc::new(RecordingNotifier::new());
    let ledger = InMemoryLedger::new(borrower(), PRICE_2000);
    ledger.set_now(NOW);
    let controller = controller(notices.clone());

    let session = connect(&controller, notices.clone(), ledger.contracts()).await;
    assert_eq!(session.map(|s| s.address), Some(borrower()));
    assert_eq!(controller.state().eth_price, dec!(2000));
    assert!(controller.loans().is_empty());

    controller.set_usdt_amount("1000");
    assert_eq!(controller.eth_collateral(), Some(dec!(0.75)));
    assert_eq!(
        controller.take_loan_from_inputs().await.unwrap(),
        ActionOutcome::Completed
    );

    let views = controller.loan_views();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].number, 1);
    assert_eq!(views[0].principal_usdt, dec!(1000));
    assert_eq!(views[0].collateral_eth, dec!(0.75));
    assert_eq!(views[0].expiry_timestamp, NOW + MAX_LOAN_DURATION_SECS);

    // Interest accrues on chain; repayment covers principal plus interest
    ledger.accrue_interest(borrower(), 0, 4_110_000);
    controller.refresh().await.unwrap();
    assert_eq!(controller.loans()[0].total_debt(), 1_004_110_000);

    assert_eq!(controller.repay_loan(0).await.unwrap(), ActionOutcome::Completed);
    assert!(controller.loans().is_empty());
    assert!(ledger.stored_loans(borrower()).is_empty());
    assert_eq!(notices.take(), vec![Notice::LoanTaken, Notice::LoanRepaid]);
}

#[tokio::test]
async fn test_connect_surfaces_existing_risk() {
    let notices = Arc::new(RecordingNotifier::new());
    let ledger = InMemoryLedger::new(borrower(), PRICE_2000);
    ledger.set_loan(
        borrower(),
        0,
        LoanRecord {
            principal: 500_000_000,
            interest_accrued: 10_000_000,
            collateral_eth: 35 * ONE_ETH / 100,
            start_timestamp: NOW,
        },
    );
    let controller = controller(notices.clone());

    connect(&controller, notices, ledger.contracts()).await;
    assert_eq!(controller.warning(), Some(HealthWarning::LiquidationRisk));

    // Price recovery clears the warning on the next price commit
    controller.set_price(dec!(3000));
    assert_eq!(controller.warning(), None);
}

#[tokio::test]
async fn test_later_slots_after_gap_are_hidden() {
    let notices = Arc::new(RecordingNotifier::new());
    let ledger = InMemoryLedger::new(borrower(), PRICE_2000);
    ledger.set_loan(borrower(), 0, LoanRecord::new(100_000_000, ONE_ETH, NOW));
    ledger.set_loan(borrower(), 2, LoanRecord::new(200_000_000, ONE_ETH, NOW));
    let controller = controller(notices.clone());

    connect(&controller, notices, ledger.contracts()).await;
    assert_eq!(controller.loans().len(), 1);
}

#[tokio::test]
async fn test_other_accounts_are_not_shown() {
    let notices = Arc::new(RecordingNotifier::new());
    let ledger = InMemoryLedger::new(borrower(), PRICE_2000);
    let stranger = Address::repeat_byte(0x99);
    ledger.set_loan(stranger, 0, LoanRecord::new(100_000_000, ONE_ETH, NOW));
    let controller = controller(notices.clone());

    connect(&controller, notices, ledger.contracts()).await;
    assert!(controller.loans().is_empty());
    assert_eq!(ledger.as_account(stranger).stored_loans(stranger).len(), 1);
}

#[tokio::test]
async fn test_missing_wallet_notifies_and_leaves_disconnected() {
    let notices = Arc::new(RecordingNotifier::new());
    let controller = controller(notices.clone());
    let connector = WalletConnector::new(None, notices.clone());

    let session = connector.connect().await.unwrap();
    assert!(session.is_none());
    assert!(!controller.is_connected());
    assert_eq!(notices.take(), vec![Notice::WalletNotFound]);

    assert!(matches!(
        controller.take_loan("10", "1").await,
        Err(EthlendError::NotConnected)
    ));
    assert_eq!(notices.take(), vec![Notice::ConnectWalletFirst]);
}

struct RefusingWallet;

#[async_trait]
impl WalletProvider for RefusingWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Err(WalletError::UserRejected("User rejected the request.".to_string()).into())
    }
}

#[tokio::test]
async fn test_rejected_access_does_not_connect() {
    let notices = Arc::new(RecordingNotifier::new());
    let ledger = InMemoryLedger::new(borrower(), PRICE_2000);
    let controller = controller(notices.clone());
    let connector = WalletConnector::new(Some(Arc::new(RefusingWallet)), notices.clone());
    let contracts = ledger.contracts();
    let dashboard = &controller;

    let result = connector
        .connect_with(|session| async move { dashboard.on_wallet_connect(&session, contracts).await })
        .await;

    assert!(matches!(
        result,
        Err(EthlendError::Wallet(WalletError::UserRejected(_)))
    ));
    assert!(!controller.is_connected());
    assert_eq!(connector.address(), None);
    assert!(notices.notices().is_empty());
}

/// Holds `take_loan` and `repay_loan` submissions until released
struct GatedLedger {
    inner: InMemoryLedger,
    gate: Arc<Notify>,
}

#[async_trait]
impl LendingLedger for GatedLedger {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn eth_usd_price(&self) -> Result<u128> {
        self.inner.eth_usd_price().await
    }

    async fn loan(&self, owner: Address, index: usize) -> Result<LoanRecord> {
        self.inner.loan(owner, index).await
    }

    async fn take_loan(
        &self,
        amount: u128,
        collateral_wei: u128,
    ) -> Result<Box<dyn PendingTransaction>> {
        self.gate.notified().await;
        self.inner.take_loan(amount, collateral_wei).await
    }

    async fn repay_loan(&self, index: usize, amount: u128) -> Result<Box<dyn PendingTransaction>> {
        self.gate.notified().await;
        self.inner.repay_loan(index, amount).await
    }
}

fn gated_contracts(ledger: &InMemoryLedger, gate: &Arc<Notify>) -> Contracts {
    Contracts::new(
        Arc::new(GatedLedger {
            inner: ledger.clone(),
            gate: gate.clone(),
        }),
        Arc::new(ledger.clone()),
    )
}

#[tokio::test]
async fn test_second_take_loan_while_in_flight_is_rejected() {
    let notices = Arc::new(RecordingNotifier::new());
    let ledger = InMemoryLedger::new(borrower(), PRICE_2000);
    let gate = Arc::new(Notify::new());
    let controller = controller(notices.clone());
    connect(&controller, notices.clone(), gated_contracts(&ledger, &gate)).await;

    let mut first = Box::pin(controller.take_loan("100", "1"));
    assert!(poll!(&mut first).is_pending());
    assert!(controller.is_busy());

    let second = controller.take_loan("100", "1").await;
    assert!(matches!(second, Err(EthlendError::ActionInFlight(_))));

    gate.notify_one();
    assert_eq!(first.await.unwrap(), ActionOutcome::Completed);
    assert!(!controller.is_busy());
    assert_eq!(controller.loans().len(), 1);
    assert_eq!(notices.take(), vec![Notice::LoanTaken]);
}

#[tokio::test]
async fn test_second_repay_while_in_flight_is_rejected() {
    let notices = Arc::new(RecordingNotifier::new());
    let ledger = InMemoryLedger::new(borrower(), PRICE_2000);
    ledger.set_loan(borrower(), 0, LoanRecord::new(100_000_000, ONE_ETH, NOW));
    let gate = Arc::new(Notify::new());
    let controller = controller(notices.clone());
    connect(&controller, notices.clone(), gated_contracts(&ledger, &gate)).await;

    let mut first = Box::pin(controller.repay_loan(0));
    assert!(poll!(&mut first).is_pending());
    assert!(controller.is_busy());

    let second = controller.repay_loan(0).await;
    assert!(matches!(second, Err(EthlendError::ActionInFlight("repay"))));

    gate.notify_one();
    assert_eq!(first.await.unwrap(), ActionOutcome::Completed);
    assert!(!controller.is_busy());
    assert!(controller.loans().is_empty());
    assert_eq!(notices.take(), vec![Notice::LoanRepaid]);
}

/// Lending contract whose `repay_loan` always reverts
struct RevertingRepayLedger {
    inner: InMemoryLedger,
}

#[async_trait]
impl LendingLedger for RevertingRepayLedger {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn eth_usd_price(&self) -> Result<u128> {
        self.inner.eth_usd_price().await
    }

    async fn loan(&self, owner: Address, index: usize) -> Result<LoanRecord> {
        self.inner.loan(owner, index).await
    }

    async fn take_loan(
        &self,
        amount: u128,
        collateral_wei: u128,
    ) -> Result<Box<dyn PendingTransaction>> {
        self.inner.take_loan(amount, collateral_wei).await
    }

    async fn repay_loan(&self, index: usize, amount: u128) -> Result<Box<dyn PendingTransaction>> {
        self.inner.revert_next_write();
        self.inner.repay_loan(index, amount).await
    }
}

#[tokio::test]
async fn test_failed_repay_after_approval_keeps_allowance() {
    let notices = Arc::new(RecordingNotifier::new());
    let ledger = InMemoryLedger::new(borrower(), PRICE_2000);
    let loan = LoanRecord {
        principal: 500_000_000,
        interest_accrued: 10_000_000,
        collateral_eth: ONE_ETH,
        start_timestamp: NOW,
    };
    ledger.set_loan(borrower(), 0, loan);
    let contracts = Contracts::new(
        Arc::new(RevertingRepayLedger {
            inner: ledger.clone(),
        }),
        Arc::new(ledger.clone()),
    );
    let controller = controller(notices.clone());
    connect(&controller, notices.clone(), contracts).await;

    let result = controller.repay_loan(0).await;
    assert!(matches!(
        result,
        Err(EthlendError::Ledger(LedgerError::Reverted { .. }))
    ));
    assert_eq!(notices.take(), vec![Notice::RepaymentFailed]);

    // Approval stands; nothing revokes it
    assert_eq!(ledger.allowance(borrower(), ledger.address()), loan.total_debt());
    assert_eq!(controller.loans(), vec![loan]);
    assert_eq!(ledger.stored_loans(borrower()), vec![loan]);
}

//! User-visible notices
//!
//! Every outcome the user must be told about goes through a [`Notifier`].
//! Diagnostics for developers go to `tracing` instead.

use parking_lot::Mutex;

/// A message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    WalletNotFound,
    ConnectWalletFirst,
    LoanTaken,
    TakeLoanFailed,
    LoanRepaid,
    RepaymentFailed,
}

impl Notice {
    /// Whether the notice reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Notice::WalletNotFound
                | Notice::ConnectWalletFirst
                | Notice::TakeLoanFailed
                | Notice::RepaymentFailed
        )
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Notice::WalletNotFound => "Wallet not found",
            Notice::ConnectWalletFirst => "Connect your wallet first",
            Notice::LoanTaken => "Loan taken!",
            Notice::TakeLoanFailed => "Transaction failed",
            Notice::LoanRepaid => "Loan repaid!",
            Notice::RepaymentFailed => "Repayment failed",
        };
        f.write_str(msg)
    }
}

/// Sink for user-visible notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that keeps every notice for later display or inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Drain and return the received notices
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    /// Most recent notice, if any
    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().copied()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

//! Wallet connector
//!
//! Runs the account-access handshake and hands the resulting [`Session`] to
//! the host. There is no disconnect; a session lives as long as its holder.

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::Address;
use ethlend_common::{EthlendError, Result, WalletError};
use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use super::provider::WalletProvider;
use crate::notice::{Notice, Notifier};

/// Connected wallet account
#[derive(Clone)]
pub struct Session {
    /// Active account
    pub address: Address,
    /// Provider that granted access
    pub provider: Arc<dyn WalletProvider>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Account-access handshake against the host's wallet provider
pub struct WalletConnector {
    /// Provider found in the host environment, if any
    provider: Option<Arc<dyn WalletProvider>>,
    notifier: Arc<dyn Notifier>,
    /// Address of the last successful connect
    connected: RwLock<Option<Address>>,
}

impl WalletConnector {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            provider,
            notifier,
            connected: RwLock::new(None),
        }
    }

    /// Request account access.
    ///
    /// Returns `Ok(None)` after a "wallet not found" notice when the host has
    /// no provider or the provider cannot be reached. A rejected request is returned as an error and not retried.
    pub async fn connect(&self) -> Result<Option<Session>> {
        self.connect_with(|_| async { Ok(()) }).await
    }

    /// Request account access and pass the session to `on_connect`.
    ///
    /// The callback is not invoked when no provider is present or access is
    /// refused; its error is returned to the caller.
    #[instrument(skip(self, on_connect))]
    pub async fn connect_with<F, Fut>(&self, on_connect: F) -> Result<Option<Session>>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let Some(provider) = self.provider.clone() else {
            warn!("No wallet provider in host environment");
            self.notifier.notify(Notice::WalletNotFound);
            return Ok(None);
        };

        let accounts = match provider.request_accounts().await {
            Err(EthlendError::Wallet(WalletError::ProviderNotFound)) => {
                warn!("Wallet provider unreachable");
                self.notifier.notify(Notice::WalletNotFound);
                return Ok(None);
            }
            other => other?,
        };
        let address = accounts.first().copied().ok_or(WalletError::NoAccounts)?;

        *self.connected.write() = Some(address);
        info!(address = %address, "Wallet connected");

        let session = Session { address, provider };
        on_connect(session.clone()).await?;
        Ok(Some(session))
    }

    /// Address of the connected account
    pub fn address(&self) -> Option<Address> {
        *self.connected.read()
    }

    /// Shortened connected address for display
    pub fn display_address(&self) -> Option<String> {
        self.address().map(|a| shorten_address(&a))
    }
}

/// `0x1234...abcd` form of an address
pub fn shorten_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

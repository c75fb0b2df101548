// src/wallet/session.rs

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    blockchain::models::{AccountId, ExecutionResult, HederaNetwork},
    wallet::{
        bridge::{self, SignInput, WalletSigner},
        connector::{WalletConnector, WalletError},
        storage::SessionStore,
    },
};

/// Local storage key holding the active account id.
pub const ACCOUNT_STORAGE_KEY: &str = "hederaAddress";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Disconnected,
    Connected { accounts: Vec<AccountId> },
}

/// A wallet session with an explicit lifecycle:
/// `Uninitialized -> init() -> Disconnected | Connected`, then
/// `connect()` / `disconnect()` move between the last two.
pub struct WalletSession {
    connector: Arc<dyn WalletConnector>,
    store: SessionStore,
    network: HederaNetwork,
    state: SessionState,
}

impl WalletSession {
    pub fn new(connector: Arc<dyn WalletConnector>, store: SessionStore, network: HederaNetwork) -> Self {
        Self {
            connector,
            store,
            network,
            state: SessionState::Uninitialized,
        }
    }

    /// Initialize the connector and resume the previous session if an
    /// account id was stored. A failed resume leaves the session disconnected.
    pub async fn init(&mut self) -> Result<(), WalletError> {
        self.connector.init().await?;
        self.state = SessionState::Disconnected;

        let Some(stored) = self.store.get(ACCOUNT_STORAGE_KEY).map(str::to_string) else {
            return Ok(());
        };
        info!(account = %stored, "Resuming wallet session");
        match self.connector.open_modal().await {
            Ok(accounts) if !accounts.is_empty() => {
                self.state = SessionState::Connected { accounts };
            }
            Ok(_) => warn!("Wallet resumed with no accounts"),
            Err(e) => error!("Failed to resume wallet session: {}", e),
        }
        Ok(())
    }

    pub async fn connect(&mut self) -> Result<&[AccountId], WalletError> {
        if self.state == SessionState::Uninitialized {
            self.connector.init().await?;
            self.state = SessionState::Disconnected;
        }

        let accounts = self.connector.open_modal().await?;
        let first = accounts.first().ok_or(WalletError::NoAccounts)?;
        self.store.set(ACCOUNT_STORAGE_KEY, &first.to_string())?;
        info!(account = %first, accounts = accounts.len(), "Wallet connected");

        self.state = SessionState::Connected { accounts };
        Ok(self.account_ids())
    }

    pub async fn disconnect(&mut self) -> Result<(), WalletError> {
        self.connector.disconnect_all().await?;
        self.state = SessionState::Disconnected;
        self.store.remove(ACCOUNT_STORAGE_KEY)?;
        info!("Wallet disconnected");
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn network(&self) -> HederaNetwork {
        self.network
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    pub fn account_ids(&self) -> &[AccountId] {
        match &self.state {
            SessionState::Connected { accounts } => accounts,
            _ => &[],
        }
    }

    /// The active account: the first one the wallet approved.
    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_ids().first()
    }

    pub fn signer(&self) -> Option<WalletSigner<'_>> {
        let account = *self.account_id()?;
        Some(WalletSigner::new(self.connector.as_ref(), account, self.network))
    }

    /// Sign and execute through the active signer. `None` when disconnected
    /// or when the wallet could not execute the transaction.
    pub async fn sign_tx_bytes<'a>(&self, input: impl Into<SignInput<'a>>) -> Option<ExecutionResult> {
        let Some(signer) = self.signer() else {
            warn!("Cannot sign: wallet is not connected");
            return None;
        };
        bridge::sign_tx_bytes(&signer, input.into()).await
    }
}

// src/app.rs

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    blockchain::{enrichment::TransactionEnricher, models::TransactionPayload},
    chat::{
        actions::ChatActions,
        message::{Message, Transcript},
        panel::TransactionPanel,
        turn::{TurnHandler, TurnOutcome},
    },
    wallet::WalletSession,
};

pub const NO_SIGNER_NOTICE: &str = "No transaction or wallet signer available";
pub const SIGN_FAILED_NOTICE: &str = "Transaction failed or rejected";
pub const DISCONNECTED_NOTICE: &str = "Wallet disconnected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingModelResponse,
    AwaitingSignature,
    Signing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient notification for the user, outside the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }
}

/// Owns the transcript, the single pending-transaction slot and the wallet
/// session. Every state change goes through `&mut self`.
pub struct ChatApp {
    actions: Arc<dyn ChatActions>,
    enricher: Option<Arc<dyn TransactionEnricher>>,
    wallet: WalletSession,
    transcript: Transcript,
    pending: Option<TransactionPayload>,
    phase: Phase,
    notices: Vec<Notice>,
}

impl ChatApp {
    pub fn new(
        actions: Arc<dyn ChatActions>,
        enricher: Option<Arc<dyn TransactionEnricher>>,
        wallet: WalletSession,
    ) -> Self {
        Self {
            actions,
            enricher,
            wallet,
            transcript: Transcript::new(),
            pending: None,
            phase: Phase::Idle,
            notices: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pending(&self) -> Option<&TransactionPayload> {
        self.pending.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn wallet(&self) -> &WalletSession {
        &self.wallet
    }

    /// The confirmation panel, available whenever a transaction is pending.
    pub fn panel(&self) -> Option<TransactionPanel<'_>> {
        self.pending.as_ref().map(TransactionPanel::new)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub async fn send(&mut self, input: &str) -> TurnOutcome {
        self.phase = Phase::AwaitingModelResponse;
        let handler = TurnHandler::new(self.actions.as_ref(), self.enricher.as_deref());
        let result = handler
            .handle_send(
                &mut self.transcript,
                self.wallet.account_id(),
                input,
                self.pending.as_ref(),
            )
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(rejected) => {
                warn!("Chat turn rejected: {}", rejected);
                self.notices.push(Notice::error(rejected.to_string()));
                TurnOutcome::Ignored
            }
        };

        if let TurnOutcome::TransactionPrepared(payload) = &outcome {
            if self.pending.is_some() {
                info!("Replacing pending transaction");
            }
            self.pending = Some(payload.clone());
        }
        self.phase = self.resting_phase();
        outcome
    }

    pub fn cancel_transaction(&mut self) {
        if self.pending.take().is_some() {
            info!("Pending transaction cancelled");
        }
        self.phase = self.resting_phase();
    }

    /// Sign the pending transaction. Returns whether it executed; a failed
    /// attempt keeps the transaction pending.
    pub async fn sign_transaction(&mut self) -> bool {
        let Some(payload) = self.pending.as_ref() else {
            self.notices.push(Notice::error(NO_SIGNER_NOTICE));
            return false;
        };
        if !self.wallet.is_connected() {
            self.notices.push(Notice::error(NO_SIGNER_NOTICE));
            return false;
        }

        self.phase = Phase::Signing;
        let result = self.wallet.sign_tx_bytes(payload).await;

        let signed = match result {
            Some(result) => {
                let summary = result.raw.to_string();
                self.notices.push(Notice::success(summary));
                match result.transaction_id.as_deref() {
                    Some(id) => self
                        .transcript
                        .push(Message::url(self.wallet.network().explorer_url(id))),
                    None => self
                        .transcript
                        .push(Message::assistant("Transaction executed")),
                }
                self.pending = None;
                true
            }
            None => {
                error!("Signing failed; transaction kept for retry");
                self.notices.push(Notice::error(SIGN_FAILED_NOTICE));
                self.transcript.push(Message::assistant(SIGN_FAILED_NOTICE));
                false
            }
        };
        self.phase = self.resting_phase();
        signed
    }

    pub async fn connect_wallet(&mut self) {
        match self.wallet.connect().await {
            Ok(accounts) => {
                if let Some(first) = accounts.first() {
                    self.notices.push(Notice::success(format!("Connected: {}", first)));
                }
            }
            Err(e) => {
                error!("Wallet connection failed: {}", e);
                self.notices.push(Notice::error(format!("Wallet connection failed: {}", e)));
            }
        }
    }

    /// Once the wallet has dropped its sessions the pending transaction is
    /// cleared, even if forgetting the stored account fails afterwards.
    pub async fn disconnect_wallet(&mut self) {
        if let Err(e) = self.wallet.disconnect().await {
            error!("Wallet disconnect failed: {}", e);
            self.notices.push(Notice::error(format!("Wallet disconnect failed: {}", e)));
        }
        if self.wallet.is_connected() {
            return;
        }
        self.pending = None;
        self.phase = Phase::Idle;
        self.notices.push(Notice::info(DISCONNECTED_NOTICE));
    }

    fn resting_phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::AwaitingSignature
        } else {
            Phase::Idle
        }
    }
}

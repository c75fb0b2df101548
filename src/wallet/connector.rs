// src/wallet/connector.rs

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::blockchain::models::{AccountId, TransactionError};

/// Wallet RPC methods used for signing and execution.
pub mod methods {
    pub const SIGN_TRANSACTION: &str = "hedera_signTransaction";
    pub const EXECUTE_TRANSACTION: &str = "hedera_executeTransaction";
    pub const SIGN_AND_EXECUTE_TRANSACTION: &str = "hedera_signAndExecuteTransaction";
}

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("wallet relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("wallet rejected '{method}' ({code}): {message}")]
    Rpc {
        method: String,
        code: i32,
        message: String,
    },
    #[error("wallet approved no accounts")]
    NoAccounts,
    #[error("unexpected wallet response: {0}")]
    InvalidResponse(String),
    #[error("invalid transaction: {0}")]
    Transaction(#[from] TransactionError),
    #[error("session storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Metadata shown by the wallet when the user approves a pairing.
#[derive(Debug, Clone, Serialize)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

impl AppMetadata {
    pub fn for_url(url: &str) -> Self {
        let url = url.trim_end_matches('/');
        Self {
            name: "Hedera Agent AI".to_string(),
            description: "Connect your Hedera wallet to use Hedera Agent AI".to_string(),
            url: url.to_string(),
            icons: vec![format!("{}/favicon.ico", url)],
        }
    }
}

/// Transport to the user's wallet. Session cryptography and the pairing UI
/// live on the other side of this trait.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    async fn init(&self) -> Result<(), WalletError>;

    /// Run the pairing flow and return every account the user approved.
    async fn open_modal(&self) -> Result<Vec<AccountId>, WalletError>;

    async fn disconnect_all(&self) -> Result<(), WalletError>;

    /// Send a wallet RPC request over the active session.
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;
}

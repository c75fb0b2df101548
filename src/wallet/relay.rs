// src/wallet/relay.rs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::{
    blockchain::models::{AccountId, HederaNetwork},
    mcp::protocol::{Request, Response},
    wallet::connector::{AppMetadata, WalletConnector, WalletError},
};

pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:8788/rpc";
pub const PROJECT_ID_HEADER: &str = "X-Project-Id";

/// Wallet connector that talks JSON-RPC over HTTP to a wallet-connect relay.
pub struct RelayConnector {
    client: Client,
    url: String,
    project_id: String,
    network: HederaNetwork,
    metadata: AppMetadata,
    next_id: AtomicU64,
}

impl RelayConnector {
    pub fn new(url: &str, project_id: &str, network: HederaNetwork, metadata: AppMetadata) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
            project_id: project_id.to_string(),
            network,
            metadata,
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        debug!(id, method, "Sending wallet relay request");

        let response: Response = self
            .client
            .post(&self.url)
            .header(PROJECT_ID_HEADER, &self.project_id)
            .json(&Request::new(id, method, Some(params)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_result().map_err(|e| WalletError::Rpc {
            method: method.to_string(),
            code: e.code,
            message: e.message,
        })
    }
}

// Accounts come back either bare (`0.0.1234`) or as signer ids
// (`hedera:testnet:0.0.1234`).
fn parse_account(raw: &str) -> Result<AccountId, WalletError> {
    let account = raw.rsplit(':').next().unwrap_or(raw);
    Ok(account.parse::<AccountId>()?)
}

#[async_trait]
impl WalletConnector for RelayConnector {
    async fn init(&self) -> Result<(), WalletError> {
        self.call(
            "session_init",
            json!({
                "projectId": self.project_id,
                "ledger": self.network,
                "metadata": self.metadata,
            }),
        )
        .await?;
        info!(network = %self.network, "Wallet connector initialized");
        Ok(())
    }

    async fn open_modal(&self) -> Result<Vec<AccountId>, WalletError> {
        let result = self.call("session_pair", json!({})).await?;
        let accounts = result
            .get("accounts")
            .and_then(Value::as_array)
            .ok_or_else(|| WalletError::InvalidResponse("missing 'accounts' array".to_string()))?;

        let accounts = accounts
            .iter()
            .map(|value| {
                value
                    .as_str()
                    .ok_or_else(|| WalletError::InvalidResponse(format!("bad account {}", value)))
                    .and_then(parse_account)
            })
            .collect::<Result<Vec<_>, _>>()?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts)
    }

    async fn disconnect_all(&self) -> Result<(), WalletError> {
        self.call("session_disconnectAll", json!({})).await?;
        Ok(())
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        self.call(method, params).await
    }
}

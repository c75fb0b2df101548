// src/wallet/bridge.rs

use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::{
    blockchain::models::{
        AccountId, ExecutionResult, HederaNetwork, TransactionBytes, TransactionPayload,
    },
    wallet::connector::{methods, WalletConnector, WalletError},
};

/// Either a whole prepared payload or just its encoded bytes.
#[derive(Debug, Clone, Copy)]
pub enum SignInput<'a> {
    Payload(&'a TransactionPayload),
    Bytes(&'a TransactionBytes),
}

impl<'a> SignInput<'a> {
    pub fn tx_bytes(&self) -> &'a TransactionBytes {
        match self {
            SignInput::Payload(payload) => &payload.tx_bytes,
            SignInput::Bytes(bytes) => bytes,
        }
    }
}

impl<'a> From<&'a TransactionPayload> for SignInput<'a> {
    fn from(payload: &'a TransactionPayload) -> Self {
        SignInput::Payload(payload)
    }
}

impl<'a> From<&'a TransactionBytes> for SignInput<'a> {
    fn from(bytes: &'a TransactionBytes) -> Self {
        SignInput::Bytes(bytes)
    }
}

/// The active account's signer on a connected session.
pub struct WalletSigner<'a> {
    connector: &'a dyn WalletConnector,
    account: AccountId,
    network: HederaNetwork,
}

impl<'a> WalletSigner<'a> {
    pub fn new(connector: &'a dyn WalletConnector, account: AccountId, network: HederaNetwork) -> Self {
        Self {
            connector,
            account,
            network,
        }
    }

    pub fn signer_id(&self) -> String {
        self.network.signer_id(&self.account)
    }

    /// Decode locally, have the signer sign, then submit the signed transaction.
    pub async fn execute(&self, tx_bytes: &TransactionBytes) -> Result<ExecutionResult, WalletError> {
        let body = tx_bytes.to_base64()?;
        let signed = self
            .connector
            .request(
                methods::SIGN_TRANSACTION,
                json!({ "signerAccountId": self.signer_id(), "transactionBody": body }),
            )
            .await?;
        let signed = signed
            .get("signedTransaction")
            .and_then(Value::as_str)
            .ok_or_else(|| WalletError::InvalidResponse("missing 'signedTransaction'".to_string()))?;

        let executed = self
            .connector
            .request(
                methods::EXECUTE_TRANSACTION,
                json!({ "transactionList": signed }),
            )
            .await?;
        Ok(ExecutionResult::from_wallet_value(executed))
    }

    /// Hand the base64 transaction list to the wallet and let it sign and
    /// execute in one step. Bytes that do not decode are passed through as-is.
    pub async fn sign_and_execute(&self, tx_bytes: &TransactionBytes) -> Result<ExecutionResult, WalletError> {
        let transaction_list = match tx_bytes.to_base64() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Passing undecodable transaction bytes to the wallet: {}", e);
                tx_bytes.as_str().to_string()
            }
        };
        let executed = self
            .connector
            .request(
                methods::SIGN_AND_EXECUTE_TRANSACTION,
                json!({
                    "signerAccountId": self.signer_id(),
                    "transactionList": transaction_list,
                }),
            )
            .await?;
        Ok(ExecutionResult::from_wallet_value(executed))
    }
}

/// Sign and execute through the signer, falling back to the wallet's
/// sign-and-execute RPC. `None` means both paths failed.
pub async fn sign_tx_bytes(signer: &WalletSigner<'_>, input: SignInput<'_>) -> Option<ExecutionResult> {
    let tx_bytes = input.tx_bytes();

    match signer.execute(tx_bytes).await {
        Ok(result) => {
            info!(signer = %signer.signer_id(), transaction_id = ?result.transaction_id, "Transaction executed by signer");
            return Some(result);
        }
        Err(e) => warn!("Direct execution failed, asking wallet to sign and execute: {}", e),
    }

    match signer.sign_and_execute(tx_bytes).await {
        Ok(result) => {
            info!(signer = %signer.signer_id(), transaction_id = ?result.transaction_id, "Transaction executed by wallet");
            Some(result)
        }
        Err(e) => {
            error!("Wallet failed to sign and execute: {}", e);
            None
        }
    }
}

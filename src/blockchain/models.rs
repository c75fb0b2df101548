// src/blockchain/models.rs
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Key under which tool providers return the unsigned transaction.
pub const TX_BYTES_KEY: &str = "txBytes";

// --- Error types for transaction handling ---

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("transaction bytes are empty")]
    EmptyBytes,
    #[error("transaction bytes are neither base64 nor hex")]
    UndecodableBytes,
    #[error("invalid account id '{0}': expected shard.realm.num")]
    InvalidAccountId(String),
    #[error("unknown Hedera network '{0}'")]
    UnknownNetwork(String),
    #[error("payload field '{0}' must be a string")]
    InvalidField(&'static str),
    #[error("enrichment failed: {0}")]
    Enrichment(String),
}

// --- Network and account models ---

/// The Hedera ledger a wallet session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HederaNetwork {
    Mainnet,
    Testnet,
    Previewnet,
}

impl HederaNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            HederaNetwork::Mainnet => "mainnet",
            HederaNetwork::Testnet => "testnet",
            HederaNetwork::Previewnet => "previewnet",
        }
    }

    /// Signer identifier used by the wallet RPC, e.g. `hedera:testnet:0.0.1234`.
    pub fn signer_id(&self, account: &AccountId) -> String {
        format!("hedera:{}:{}", self.as_str(), account)
    }

    /// HashScan link for an executed transaction.
    pub fn explorer_url(&self, transaction_id: &str) -> String {
        format!(
            "https://hashscan.io/{}/transaction/{}",
            self.as_str(),
            transaction_id
        )
    }
}

impl Default for HederaNetwork {
    fn default() -> Self {
        HederaNetwork::Testnet
    }
}

impl FromStr for HederaNetwork {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(HederaNetwork::Mainnet),
            "testnet" => Ok(HederaNetwork::Testnet),
            "previewnet" => Ok(HederaNetwork::Previewnet),
            other => Err(TransactionError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for HederaNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Hedera account identifier in `shard.realm.num` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl FromStr for AccountId {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TransactionError::InvalidAccountId(s.to_string());
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u64, TransactionError> {
            parts
                .next()
                .ok_or_else(invalid)?
                .parse::<u64>()
                .map_err(|_| invalid())
        };
        let account = AccountId {
            shard: next()?,
            realm: next()?,
            num: next()?,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(account)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// --- Transaction models ---

/// Opaque encoded transaction awaiting a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionBytes(String);

impl TransactionBytes {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode to raw bytes. Tool providers mostly emit base64; hex is accepted as a fallback.
    ///
    /// A `0x` prefix always means hex. Unprefixed hex is only reached when
    /// base64 decoding fails, so `0a0b0c0d` is read as base64.
    pub fn decode(&self) -> Result<Vec<u8>, TransactionError> {
        let raw = self.0.trim();
        if raw.is_empty() {
            return Err(TransactionError::EmptyBytes);
        }
        if let Some(hex_str) = raw.strip_prefix("0x") {
            return decode_hex(hex_str);
        }
        if let Ok(bytes) = general_purpose::STANDARD.decode(raw) {
            if !bytes.is_empty() {
                return Ok(bytes);
            }
        }
        decode_hex(raw)
    }

    /// Canonical base64 form expected by the wallet `transactionList` parameter.
    pub fn to_base64(&self) -> Result<String, TransactionError> {
        Ok(general_purpose::STANDARD.encode(self.decode()?))
    }
}

fn decode_hex(hex_str: &str) -> Result<Vec<u8>, TransactionError> {
    match hex::decode(hex_str) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(TransactionError::UndecodableBytes),
    }
}

/// Transaction prepared by a tool call, plus any descriptive fields
/// (`transactionType`, amounts, memo...) returned with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    #[serde(rename = "txBytes")]
    pub tx_bytes: TransactionBytes,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TransactionPayload {
    pub fn new(tx_bytes: impl Into<String>) -> Self {
        Self {
            tx_bytes: TransactionBytes::new(tx_bytes),
            fields: Map::new(),
        }
    }

    /// Build a payload from a parsed tool result object.
    /// Returns `Ok(None)` when the object carries no `txBytes` key.
    pub fn from_object(object: &Map<String, Value>) -> Result<Option<Self>, TransactionError> {
        let Some(tx_bytes) = object.get(TX_BYTES_KEY) else {
            return Ok(None);
        };
        let tx_bytes = tx_bytes
            .as_str()
            .ok_or(TransactionError::InvalidField(TX_BYTES_KEY))?;

        let fields = object
            .iter()
            .filter(|(key, _)| key.as_str() != TX_BYTES_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Some(Self {
            tx_bytes: TransactionBytes::new(tx_bytes),
            fields,
        }))
    }

    pub fn transaction_type(&self) -> Option<&str> {
        self.fields.get("transactionType").and_then(Value::as_str)
    }

    /// Merge an enrichment response over this payload. Enrichment fields win,
    /// including a replacement `txBytes` string.
    pub fn merge(&mut self, enrichment: Map<String, Value>) {
        for (key, value) in enrichment {
            if key == TX_BYTES_KEY {
                if let Some(bytes) = value.as_str() {
                    self.tx_bytes = TransactionBytes::new(bytes);
                }
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    /// Descriptive fields only, with every excluded key removed.
    pub fn visible_fields(&self, excluded: &[&str]) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(key, _)| !excluded.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Outcome reported by the wallet after signing and executing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub raw: Value,
}

impl ExecutionResult {
    /// Pull the well-known fields out of a wallet RPC result, keeping the raw value.
    pub fn from_wallet_value(raw: Value) -> Self {
        let lookup = |key: &str| {
            raw.get(key)
                .or_else(|| raw.get("result").and_then(|inner| inner.get(key)))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            transaction_id: lookup("transactionId"),
            status: lookup("status"),
            raw,
        }
    }
}

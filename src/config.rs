// src/config.rs

use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::env;
use std::path::PathBuf;

use crate::{
    ai::agent::{AgentSettings, McpConnectionMode, Orchestration},
    blockchain::models::HederaNetwork,
    wallet::{relay::DEFAULT_RELAY_URL, storage::default_storage_path},
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "o3-mini";
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-4o";
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,
    pub app_url: String,

    // Language model
    pub openai_api_key: SecretString,
    pub openai_base_url: String,
    pub chat_model: String,
    pub summary_model: String,

    // Tool provider
    pub mcp_url: String,
    pub mcp_auth_token: Option<SecretString>,
    pub mcp_connection: McpConnectionMode,
    pub orchestration: Orchestration,

    /// When set, chat and summary actions are delegated to a serve-mode
    /// instance at this base URL instead of running in-process.
    pub chat_action_url: Option<String>,
    pub enrichment_url: Option<String>,

    // Wallet settings
    pub wallet_connect_project_id: String,
    pub hedera_network: HederaNetwork,
    pub wallet_relay_url: String,
    pub wallet_session_path: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| optional(key).unwrap_or_else(|| default.to_string());

        let wallet_session_path = match optional("WALLET_SESSION_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_storage_path().context("WALLET_SESSION_PATH is not set and no default exists")?,
        };

        Ok(Config {
            port: or_default("PORT", "8080")
                .parse()
                .context("PORT must be a valid number")?,
            app_url: or_default("APP_URL", DEFAULT_APP_URL),

            openai_api_key: SecretString::new(required("OPENAI_API_KEY")?),
            openai_base_url: or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            chat_model: or_default("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            summary_model: or_default("SUMMARY_MODEL", DEFAULT_SUMMARY_MODEL),

            mcp_url: required("MCP_URL")?,
            mcp_auth_token: optional("MCP_AUTH_TOKEN").map(SecretString::new),
            mcp_connection: or_default("MCP_CONNECTION", "per-request")
                .parse()
                .map_err(|e| anyhow!("MCP_CONNECTION: {}", e))?,
            orchestration: or_default("ORCHESTRATION", "model")
                .parse()
                .map_err(|e| anyhow!("ORCHESTRATION: {}", e))?,

            chat_action_url: optional("CHAT_ACTION_URL"),
            enrichment_url: optional("ENRICHMENT_URL"),

            wallet_connect_project_id: required("WALLET_CONNECT_PROJECT_ID")?,
            hedera_network: or_default("HEDERA_NETWORK", "testnet")
                .parse()
                .context("HEDERA_NETWORK must be mainnet, testnet or previewnet")?,
            wallet_relay_url: or_default("WALLET_RELAY_URL", DEFAULT_RELAY_URL),
            wallet_session_path,
        })
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            mcp_url: self.mcp_url.clone(),
            mcp_auth_token: self.mcp_auth_token.clone(),
            chat_model: self.chat_model.clone(),
            summary_model: self.summary_model.clone(),
            connection: self.mcp_connection,
            orchestration: self.orchestration,
        }
    }
}

// src/chat/actions.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    ai::openai::AiError,
    blockchain::models::{TransactionError, TransactionPayload},
    mcp::{protocol::CallToolResult, McpError},
};

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("tool provider error: {0}")]
    Mcp(#[from] McpError),
    #[error("model error: {0}")]
    Ai(#[from] AiError),
    #[error("remote chat action failed: {0}")]
    Remote(String),
    #[error("tool result has no text content")]
    EmptyToolResult,
    #[error("invalid transaction in tool result: {0}")]
    Transaction(#[from] TransactionError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One executed tool call and what the tool returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
    pub result: CallToolResult,
}

/// Output of the chat action: the model text plus any tool results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tool_results: Vec<ToolResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub account_id: String,
    pub input: String,
    #[serde(default)]
    pub current_transaction: Option<TransactionPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub tool_result: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub text: String,
}

/// The two model-backed actions a chat turn depends on.
#[async_trait]
pub trait ChatActions: Send + Sync {
    /// Forward user input (and the pending transaction, if any) to the model
    /// with tool calling enabled.
    async fn handle_chat(
        &self,
        account_id: &str,
        input: &str,
        current_transaction: Option<&TransactionPayload>,
    ) -> Result<ChatResponse, ChatError>;

    /// Turn raw tool output into a short natural-language answer.
    async fn summarize_tool_result(&self, tool_result: &Value) -> Result<String, ChatError>;
}

// src/ai/agent.rs

use async_trait::async_trait;
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    ai::openai::{ChatCompletionRequest, ChatMessage, FunctionTool, OpenAiClient},
    blockchain::models::TransactionPayload,
    chat::{
        actions::{ChatActions, ChatError, ChatResponse, ToolResult},
        prompt::{build_prompt, SUMMARY_SYSTEM_PROMPT},
    },
    mcp::{McpClient, McpError},
};

/// Tool invoked directly when the model is bypassed.
pub const DIRECT_TOOL_NAME: &str = "interact-with-hedera";

pub const AUTH_TOKEN_HEADER: &str = "X-MCP-AUTH-TOKEN";
pub const ACCOUNT_ID_HEADER: &str = "X-HEDERA-ACCOUNT-ID";

/// Whether a tool-provider connection is opened for every request or kept per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpConnectionMode {
    PerRequest,
    Shared,
}

impl FromStr for McpConnectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per-request" | "per_request" => Ok(McpConnectionMode::PerRequest),
            "shared" => Ok(McpConnectionMode::Shared),
            other => Err(format!("unknown MCP connection mode '{}'", other)),
        }
    }
}

/// Who decides which tool to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orchestration {
    /// The model picks tools from the provider's list.
    Model,
    /// The prompt goes straight to the `interact-with-hedera` tool.
    DirectTool,
}

impl FromStr for Orchestration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "model" => Ok(Orchestration::Model),
            "direct-tool" | "direct_tool" | "direct" => Ok(Orchestration::DirectTool),
            other => Err(format!("unknown orchestration '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AgentSettings {
    pub mcp_url: String,
    pub mcp_auth_token: Option<SecretString>,
    pub chat_model: String,
    pub summary_model: String,
    pub connection: McpConnectionMode,
    pub orchestration: Orchestration,
}

/// In-process chat actions: OpenAI for language, a remote MCP server for tools.
pub struct Agent {
    openai: OpenAiClient,
    settings: AgentSettings,
    shared: DashMap<String, Arc<McpClient>>,
}

impl Agent {
    pub fn new(openai: OpenAiClient, settings: AgentSettings) -> Self {
        Self {
            openai,
            settings,
            shared: DashMap::new(),
        }
    }

    async fn tool_client(&self, account_id: &str) -> Result<Arc<McpClient>, McpError> {
        if self.settings.connection == McpConnectionMode::Shared {
            if let Some(client) = self.shared.get(account_id) {
                return Ok(client.clone());
            }
        }

        let mut headers = vec![(ACCOUNT_ID_HEADER, account_id)];
        if let Some(token) = &self.settings.mcp_auth_token {
            headers.push((AUTH_TOKEN_HEADER, token.expose_secret().as_str()));
        }
        debug!(url = %self.settings.mcp_url, "Connecting to tool provider");
        let client = Arc::new(McpClient::connect(&self.settings.mcp_url, &headers).await?);

        if self.settings.connection == McpConnectionMode::Shared {
            self.shared.insert(account_id.to_string(), client.clone());
        }
        Ok(client)
    }

    /// One model step with the provider's tools, executing every tool call the
    /// model asked for.
    pub async fn generate_text_with_tools(
        &self,
        account_id: &str,
        prompt: &str,
    ) -> Result<ChatResponse, ChatError> {
        let mcp = self.tool_client(account_id).await?;
        let result = self.run_with_tools(&mcp, prompt).await;

        // A shared connection that failed is not reused.
        if result.is_err() && self.settings.connection == McpConnectionMode::Shared {
            self.shared.remove(account_id);
        }
        result
    }

    async fn run_with_tools(&self, mcp: &McpClient, prompt: &str) -> Result<ChatResponse, ChatError> {
        if self.settings.orchestration == Orchestration::DirectTool {
            let args = json!({ "fullPrompt": prompt });
            let result = mcp.call_tool(DIRECT_TOOL_NAME, args.clone()).await?;
            return Ok(ChatResponse {
                text: String::new(),
                tool_results: vec![ToolResult {
                    tool_call_id: Uuid::new_v4().to_string(),
                    tool_name: DIRECT_TOOL_NAME.to_string(),
                    args,
                    result,
                }],
            });
        }

        let tools = mcp.list_tools().await?;
        let request = ChatCompletionRequest {
            model: self.settings.chat_model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            tools: tools.iter().map(FunctionTool::from).collect(),
        };
        let choice = self.openai.complete(&request).await?;

        let mut tool_results = Vec::with_capacity(choice.message.tool_calls.len());
        for call in &choice.message.tool_calls {
            let args = call.parsed_arguments()?;
            let result = mcp.call_tool(&call.function.name, args.clone()).await?;
            if result.is_error {
                warn!(tool = %call.function.name, "Tool reported an error result");
            }
            tool_results.push(ToolResult {
                tool_call_id: call.id.clone(),
                tool_name: call.function.name.clone(),
                args,
                result,
            });
        }

        info!(
            finish_reason = ?choice.finish_reason,
            tool_results = tool_results.len(),
            "Model step finished"
        );
        Ok(ChatResponse {
            text: choice.message.content.unwrap_or_default(),
            tool_results,
        })
    }
}

#[async_trait]
impl ChatActions for Agent {
    async fn handle_chat(
        &self,
        account_id: &str,
        input: &str,
        current_transaction: Option<&TransactionPayload>,
    ) -> Result<ChatResponse, ChatError> {
        let prompt = build_prompt(input, current_transaction);
        self.generate_text_with_tools(account_id, &prompt).await
    }

    async fn summarize_tool_result(&self, tool_result: &Value) -> Result<String, ChatError> {
        let request = ChatCompletionRequest {
            model: self.settings.summary_model.clone(),
            messages: vec![
                ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(serde_json::to_string(tool_result)?),
            ],
            tools: Vec::new(),
        };
        let choice = self.openai.complete(&request).await?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

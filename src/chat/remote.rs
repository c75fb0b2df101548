// src/chat/remote.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    blockchain::models::TransactionPayload,
    chat::actions::{
        ChatActions, ChatError, ChatRequest, ChatResponse, SummaryRequest, SummaryResponse,
    },
};

/// Chat actions served by another instance running in serve mode.
#[derive(Clone)]
pub struct RemoteActions {
    client: Client,
    base_url: String,
}

impl RemoteActions {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ChatError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Calling remote chat action");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChatError::Remote(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ChatError::Remote(format!("{} - {}", status, text)));
        }
        resp.json().await.map_err(|e| ChatError::Remote(e.to_string()))
    }
}

#[async_trait]
impl ChatActions for RemoteActions {
    async fn handle_chat(
        &self,
        account_id: &str,
        input: &str,
        current_transaction: Option<&TransactionPayload>,
    ) -> Result<ChatResponse, ChatError> {
        let request = ChatRequest {
            account_id: account_id.to_string(),
            input: input.to_string(),
            current_transaction: current_transaction.cloned(),
        };
        self.post("/api/chat", &request).await
    }

    async fn summarize_tool_result(&self, tool_result: &Value) -> Result<String, ChatError> {
        let request = SummaryRequest {
            tool_result: tool_result.clone(),
        };
        let response: SummaryResponse = self.post("/api/summary", &request).await?;
        Ok(response.text)
    }
}

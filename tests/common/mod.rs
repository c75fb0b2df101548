//! Shared fixtures for integration tests: an in-process MCP server speaking
//! the SSE transport, scripted chat actions and a scripted wallet.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

use hedera_agent_chat::{
    blockchain::models::{AccountId, TransactionPayload},
    chat::actions::{ChatActions, ChatError, ChatResponse, ToolResult},
    mcp::protocol::{error_codes, CallToolResult, Response},
    wallet::{connector::methods, WalletConnector, WalletError},
};

pub const TX_BYTES: &str = "CgQQBxgLEgQQBxgDGICU69wDIgIIeDIA";

// --- Fake MCP server ---

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub tool: String,
    pub arguments: Value,
    pub account_id: Option<String>,
    pub auth_token: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeMcp {
    sessions: Arc<DashMap<String, mpsc::UnboundedSender<Event>>>,
    pub connections: Arc<AtomicUsize>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeMcp {
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[derive(Deserialize)]
struct SessionQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// Start the fake MCP server and return its SSE URL.
pub async fn spawn_fake_mcp() -> (String, FakeMcp) {
    let state = FakeMcp::default();
    let app = Router::new()
        .route("/sse", get(sse_handler))
        .route("/messages", post(message_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/sse", addr), state)
}

async fn sse_handler(
    State(state): State<FakeMcp>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let session_id = Uuid::new_v4().to_string();
    tx.send(
        Event::default()
            .event("endpoint")
            .data(format!("/messages?sessionId={}", session_id)),
    )
    .unwrap();
    state.sessions.insert(session_id, tx);
    state.connections.fetch_add(1, Ordering::SeqCst);

    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok::<_, Infallible>(event), rx))
    });
    Sse::new(events)
}

async fn message_handler(
    State(state): State<FakeMcp>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> StatusCode {
    let Some(sender) = state.sessions.get(&query.session_id).map(|s| s.clone()) else {
        return StatusCode::NOT_FOUND;
    };
    // Notifications get no reply.
    let Some(id) = request.get("id").cloned() else {
        return StatusCode::ACCEPTED;
    };

    let result = match request["method"].as_str().unwrap_or_default() {
        "initialize" => Ok(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "fake-hedera-mcp", "version": "0.0.1" }
        })),
        "tools/list" => Ok(json!({
            "tools": [
                {
                    "name": "interact-with-hedera",
                    "description": "Prepare Hedera transactions or query the network",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "fullPrompt": { "type": "string" } },
                        "required": ["fullPrompt"]
                    }
                },
                { "name": "get-balance", "description": "HBAR balance of an account" }
            ]
        })),
        "tools/call" => {
            let tool = request["params"]["name"].as_str().unwrap_or_default().to_string();
            let arguments = request["params"]["arguments"].clone();
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            state.calls.lock().unwrap().push(RecordedCall {
                tool: tool.clone(),
                arguments: arguments.clone(),
                account_id: header("x-hedera-account-id"),
                auth_token: header("x-mcp-auth-token"),
            });

            match tool.as_str() {
                "interact-with-hedera" => {
                    let prompt = arguments["fullPrompt"].as_str().unwrap_or_default();
                    Ok(tool_text(&hedera_tool_output(prompt)))
                }
                "get-balance" => Ok(tool_text(&json!({ "balance": "42 HBAR" }))),
                "hang-up" => {
                    state.sessions.remove(&query.session_id);
                    return StatusCode::ACCEPTED;
                }
                other => Err((error_codes::INVALID_PARAMS, format!("Unknown tool: {}", other))),
            }
        }
        other => Err((error_codes::METHOD_NOT_FOUND, format!("Method not found: {}", other))),
    };

    let reply = match result {
        Ok(result) => Response::success(id, result),
        Err((code, message)) => Response::error(id, code, message),
    };
    let _ = sender.send(
        Event::default()
            .event("message")
            .data(serde_json::to_string(&reply).unwrap()),
    );
    StatusCode::ACCEPTED
}

fn tool_text(value: &Value) -> Value {
    json!({ "content": [{ "type": "text", "text": value.to_string() }], "isError": false })
}

/// What the Hedera tool answers for a prompt: transfers are prepared as
/// transactions for the first amount in the prompt, anything else is
/// informational.
pub fn hedera_tool_output(prompt: &str) -> Value {
    if prompt.contains("send") || prompt.contains("transfer") {
        let amount = prompt
            .split_whitespace()
            .find(|word| word.parse::<u64>().is_ok())
            .unwrap_or("0");
        json!({
            "txBytes": TX_BYTES,
            "transactionType": "TRANSFER",
            "amount": format!("{} HBAR", amount),
        })
    } else {
        json!({ "balance": "42 HBAR" })
    }
}

// --- Scripted chat actions ---

pub fn tool_result(tool_name: &str, text: &str) -> ToolResult {
    ToolResult {
        tool_call_id: "call_1".to_string(),
        tool_name: tool_name.to_string(),
        args: json!({}),
        result: CallToolResult::text(text),
    }
}

#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub account_id: String,
    pub input: String,
    pub current_transaction: Option<TransactionPayload>,
}

/// Chat actions that answer like the Hedera tool without any network.
#[derive(Default)]
pub struct FakeActions {
    pub fail_chat: bool,
    pub hang: bool,
    pub plain_text: Option<String>,
    pub chats: Mutex<Vec<RecordedChat>>,
    pub summaries: Mutex<Vec<Value>>,
}

impl FakeActions {
    pub fn chat_count(&self) -> usize {
        self.chats.lock().unwrap().len()
    }

    pub fn summary_count(&self) -> usize {
        self.summaries.lock().unwrap().len()
    }

    pub fn last_chat(&self) -> Option<RecordedChat> {
        self.chats.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatActions for FakeActions {
    async fn handle_chat(
        &self,
        account_id: &str,
        input: &str,
        current_transaction: Option<&TransactionPayload>,
    ) -> Result<ChatResponse, ChatError> {
        self.chats.lock().unwrap().push(RecordedChat {
            account_id: account_id.to_string(),
            input: input.to_string(),
            current_transaction: current_transaction.cloned(),
        });
        if self.hang {
            futures::future::pending::<()>().await;
        }
        if self.fail_chat {
            return Err(ChatError::Remote("model unavailable".to_string()));
        }
        if let Some(text) = &self.plain_text {
            return Ok(ChatResponse {
                text: text.clone(),
                tool_results: Vec::new(),
            });
        }
        let output = hedera_tool_output(input);
        Ok(ChatResponse {
            text: String::new(),
            tool_results: vec![tool_result("interact-with-hedera", &output.to_string())],
        })
    }

    async fn summarize_tool_result(&self, tool_result: &Value) -> Result<String, ChatError> {
        self.summaries.lock().unwrap().push(tool_result.clone());
        Ok("Your balance is 42 HBAR.".to_string())
    }
}

// --- Scripted wallet ---

#[derive(Default)]
pub struct FakeWallet {
    pub accounts: Vec<&'static str>,
    pub reject_signing: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeWallet {
    pub fn with_account(account: &'static str) -> Self {
        Self {
            accounts: vec![account],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that reach the wallet's RPC channel, excluding session management.
    pub fn rpc_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("hedera_"))
            .collect()
    }
}

#[async_trait]
impl WalletConnector for FakeWallet {
    async fn init(&self) -> Result<(), WalletError> {
        self.calls.lock().unwrap().push("init".to_string());
        Ok(())
    }

    async fn open_modal(&self) -> Result<Vec<AccountId>, WalletError> {
        self.calls.lock().unwrap().push("open_modal".to_string());
        Ok(self.accounts.iter().map(|a| a.parse().unwrap()).collect())
    }

    async fn disconnect_all(&self) -> Result<(), WalletError> {
        self.calls.lock().unwrap().push("disconnect_all".to_string());
        Ok(())
    }

    async fn request(&self, method: &str, _params: Value) -> Result<Value, WalletError> {
        self.calls.lock().unwrap().push(method.to_string());
        if self.reject_signing {
            return Err(WalletError::Rpc {
                method: method.to_string(),
                code: 5000,
                message: "user rejected".to_string(),
            });
        }
        match method {
            methods::SIGN_TRANSACTION => Ok(json!({ "signedTransaction": TX_BYTES })),
            methods::EXECUTE_TRANSACTION => Ok(json!({
                "transactionId": "0.0.1234@1700000000.000000001",
                "status": "SUCCESS"
            })),
            _ => Ok(json!({})),
        }
    }
}

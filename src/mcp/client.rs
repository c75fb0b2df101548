//! MCP client over the SSE transport.
//!
//! The tool provider keeps one `GET` event stream open per connection. Its
//! first `endpoint` event names the URL that JSON-RPC requests are POSTed to;
//! replies come back on the event stream and are routed to the waiting caller
//! by request id.

use dashmap::DashMap;
use futures_util::StreamExt;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT},
    Client,
};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::mcp::{
    protocol::{CallToolResult, ListToolsResult, Request, Response, Tool, PROTOCOL_VERSION},
    sse::{parse_sse_stream, SseStream},
};

const CLIENT_NAME: &str = "hedera-agent-chat";

#[derive(Error, Debug)]
pub enum McpError {
    #[error("invalid MCP url: {0}")]
    InvalidUrl(String),
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("SSE stream error: {0}")]
    Stream(String),
    #[error("tool provider never announced a message endpoint")]
    MissingEndpoint,
    #[error("tool provider closed the connection")]
    ConnectionClosed,
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i32, message: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

type PendingMap = Arc<DashMap<u64, oneshot::Sender<Response>>>;

/// A live connection to a remote tool provider.
#[derive(Debug)]
pub struct McpClient {
    http: Client,
    endpoint: Url,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl McpClient {
    /// Open the event stream, wait for the message endpoint and run the
    /// `initialize` handshake. `headers` are sent on every request.
    pub async fn connect(sse_url: &str, headers: &[(&str, &str)]) -> Result<Self, McpError> {
        let base = Url::parse(sse_url).map_err(|e| McpError::InvalidUrl(e.to_string()))?;

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| McpError::InvalidHeader(name.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| McpError::InvalidHeader(name.as_str().to_string()))?;
            header_map.insert(name, value);
        }
        let http = Client::builder().default_headers(header_map).build()?;

        let resp = http
            .get(base.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;
        let mut events = parse_sse_stream(resp.bytes_stream());

        let endpoint = loop {
            match events.next().await {
                Some(Ok(event)) if event.kind() == "endpoint" => {
                    break base
                        .join(event.data.trim())
                        .map_err(|e| McpError::InvalidUrl(e.to_string()))?;
                }
                Some(Ok(event)) => debug!(kind = event.kind(), "Ignoring event before endpoint"),
                Some(Err(e)) => return Err(e),
                None => return Err(McpError::MissingEndpoint),
            }
        };
        debug!(%endpoint, "MCP message endpoint announced");

        let pending: PendingMap = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_responses(events, pending.clone(), closed.clone()));

        let client = Self {
            http,
            endpoint,
            pending,
            closed,
            next_id: AtomicU64::new(1),
            reader,
        };
        client.initialize().await?;
        Ok(client)
    }

    async fn initialize(&self) -> Result<(), McpError> {
        let result = self
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": CLIENT_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                })),
            )
            .await?;
        let server = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(server, "MCP session initialized");

        self.post(&Request::notification("notifications/initialized", None))
            .await
    }

    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        let result = self.request("tools/list", Some(json!({}))).await?;
        let listed: ListToolsResult = serde_json::from_value(result)
            .map_err(|e| McpError::InvalidResponse(e.to_string()))?;
        debug!(count = listed.tools.len(), "Listed MCP tools");
        Ok(listed.tools)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        info!(tool = name, "Calling MCP tool");
        let result = self
            .request(
                "tools/call",
                Some(json!({ "name": name, "arguments": arguments })),
            )
            .await?;
        serde_json::from_value(result).map_err(|e| McpError::InvalidResponse(e.to_string()))
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        if self.closed.load(Ordering::SeqCst) {
            self.pending.remove(&id);
            return Err(McpError::ConnectionClosed);
        }

        debug!(id, method, "Sending MCP request");
        if let Err(e) = self.post(&Request::new(id, method, params)).await {
            self.pending.remove(&id);
            return Err(e);
        }

        let response = rx.await.map_err(|_| McpError::ConnectionClosed)?;
        response.into_result().map_err(|e| McpError::Rpc {
            code: e.code,
            message: e.message,
        })
    }

    async fn post(&self, request: &Request) -> Result<(), McpError> {
        self.http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

// Routes responses from the event stream to their waiting callers. Once the
// stream ends every outstanding sender is dropped, failing its caller.
async fn read_responses(mut events: SseStream, pending: PendingMap, closed: Arc<AtomicBool>) {
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                error!("MCP event stream failed: {}", e);
                break;
            }
        };
        if event.kind() != "message" {
            debug!(kind = event.kind(), "Ignoring SSE event");
            continue;
        }

        let message: Value = match serde_json::from_str(&event.data) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to parse MCP message: {}", e);
                continue;
            }
        };
        // Server-initiated requests and notifications carry a method.
        if message.get("method").is_some() {
            debug!("Ignoring server-initiated MCP message");
            continue;
        }
        let response: Response = match serde_json::from_value(message) {
            Ok(response) => response,
            Err(e) => {
                warn!("Malformed MCP response: {}", e);
                continue;
            }
        };
        let Some(id) = response.id.as_u64() else {
            warn!("MCP response without a numeric id");
            continue;
        };
        match pending.remove(&id) {
            Some((_, tx)) => {
                let _ = tx.send(response);
            }
            None => warn!(id, "MCP response for unknown request"),
        }
    }

    info!("MCP event stream closed");
    closed.store(true, Ordering::SeqCst);
    pending.clear();
}

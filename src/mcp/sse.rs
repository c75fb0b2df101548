// src/mcp/sse.rs

use eventsource_stream::Eventsource;
use futures::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use tokio_util::bytes::Bytes;

use crate::mcp::client::McpError;

#[derive(Debug, Clone)]
pub struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Unnamed events are `message` events.
    pub fn kind(&self) -> &str {
        self.event_type.as_deref().unwrap_or("message")
    }
}

pub type SseStream = Pin<Box<dyn Stream<Item = Result<SseEvent, McpError>> + Send>>;

pub fn parse_sse_stream<S, E>(byte_stream: S) -> SseStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + 'static,
{
    let event_stream = byte_stream
        .map(|result| result.map_err(|e| std::io::Error::other(e.to_string())))
        .eventsource()
        .map(|result| {
            result
                .map(|event| SseEvent {
                    event_type: if event.event.is_empty() {
                        None
                    } else {
                        Some(event.event)
                    },
                    data: event.data,
                })
                .map_err(|e| McpError::Stream(e.to_string()))
        });

    Box::pin(event_stream)
}

// MCP client side: JSON-RPC types, SSE framing and the tool-provider connection
pub mod client;
pub mod protocol;
pub mod sse;

pub use client::{McpClient, McpError};

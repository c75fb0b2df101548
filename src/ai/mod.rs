// src/ai/mod.rs

pub mod agent;
pub mod openai;

pub use agent::{Agent, AgentSettings, McpConnectionMode, Orchestration};
pub use openai::{AiError, OpenAiClient};

// src/chat/outcome.rs

use serde_json::Value;

use crate::{
    blockchain::models::TransactionPayload,
    chat::actions::{ChatError, ToolResult},
};

/// What a tool result means for the conversation, decided once when the
/// result is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The tool prepared a transaction that now needs a signature.
    TransactionPrepared(TransactionPayload),
    /// Anything else: balances, lookups, plain text answers.
    InformationalResult(Value),
}

impl ToolOutcome {
    /// Parse the first text block of a tool result. JSON objects with a
    /// `txBytes` string become a prepared transaction; text that is not JSON
    /// is kept as a string.
    pub fn from_tool_result(result: &ToolResult) -> Result<Self, ChatError> {
        let text = result
            .result
            .first_text()
            .ok_or(ChatError::EmptyToolResult)?;

        let parsed: Value = match serde_json::from_str(text) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(ToolOutcome::InformationalResult(Value::String(text.to_string()))),
        };

        if let Value::Object(object) = &parsed {
            if let Some(payload) = TransactionPayload::from_object(object)? {
                return Ok(ToolOutcome::TransactionPrepared(payload));
            }
        }
        Ok(ToolOutcome::InformationalResult(parsed))
    }
}

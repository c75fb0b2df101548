// src/chat/prompt.rs

use serde_json::Value;

use crate::{
    blockchain::models::{TransactionPayload, TX_BYTES_KEY},
    utils::pretty_json,
};

/// Fields the model must leave out of its answer when editing a transaction.
pub const EXCLUDED_RESPONSE_FIELDS: &[&str] = &[TX_BYTES_KEY];

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes the results of a tool call in context of interacting with a Hedera blockchain.";

/// Build the prompt sent to the model. With a pending transaction the
/// request is wrapped with the current payload so the model edits it instead
/// of starting over.
pub fn build_prompt(input: &str, current: Option<&TransactionPayload>) -> String {
    let Some(current) = current else {
        return input.to_string();
    };

    let context = Value::Object(current.visible_fields(EXCLUDED_RESPONSE_FIELDS));
    format!(
        "You are updating a Hedera transaction that has already been prepared.\n\n\
         Current transaction:\n{}\n\n\
         User request: {}\n\n\
         Update only the fields the user asks to change and keep every other field exactly as it is.\n\
         Do not include these fields in your response: {}.",
        pretty_json(&context),
        input,
        EXCLUDED_RESPONSE_FIELDS.join(", ")
    )
}

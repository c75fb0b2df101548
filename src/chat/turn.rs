// src/chat/turn.rs

use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    blockchain::{
        enrichment::TransactionEnricher,
        models::{AccountId, TransactionPayload},
    },
    chat::{
        actions::{ChatActions, ChatError},
        message::{Message, Transcript},
        outcome::ToolOutcome,
    },
    utils::{pretty_json, truncate_for_log},
};

pub const TRANSACTION_PREPARED_MESSAGE: &str = "We prepared the transaction, please sign and execute it";
pub const GENERIC_ERROR_MESSAGE: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

/// Preconditions checked before anything is sent.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TurnRejected {
    #[error("No account ID found")]
    MissingAccount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Blank input; nothing was appended.
    Ignored,
    /// The model answered in plain text.
    Replied,
    /// A tool ran and its result was summarized.
    Summarized,
    /// A tool prepared a transaction that now awaits confirmation.
    TransactionPrepared(TransactionPayload),
    /// The turn failed; a generic error message was appended.
    Failed,
}

/// Runs one user turn against the chat actions and writes the result into
/// the transcript.
pub struct TurnHandler<'a> {
    actions: &'a dyn ChatActions,
    enricher: Option<&'a dyn TransactionEnricher>,
}

impl<'a> TurnHandler<'a> {
    pub fn new(actions: &'a dyn ChatActions, enricher: Option<&'a dyn TransactionEnricher>) -> Self {
        Self { actions, enricher }
    }

    pub async fn handle_send(
        &self,
        transcript: &mut Transcript,
        account_id: Option<&AccountId>,
        input: &str,
        current: Option<&TransactionPayload>,
    ) -> Result<TurnOutcome, TurnRejected> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }
        let account_id = account_id.ok_or(TurnRejected::MissingAccount)?;

        transcript.push(Message::user(input));

        let span = info_span!("chat_turn", turn_id = %Uuid::new_v4(), account = %account_id);
        let result = self
            .run(transcript, account_id, input, current)
            .instrument(span)
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Chat turn failed: {}", e);
                transcript.push(Message::assistant(GENERIC_ERROR_MESSAGE));
                Ok(TurnOutcome::Failed)
            }
        }
    }

    async fn run(
        &self,
        transcript: &mut Transcript,
        account_id: &AccountId,
        input: &str,
        current: Option<&TransactionPayload>,
    ) -> Result<TurnOutcome, ChatError> {
        info!(input = %truncate_for_log(input, 80), has_context = current.is_some(), "Sending chat turn");
        let response = self
            .actions
            .handle_chat(&account_id.to_string(), input, current)
            .await?;

        let Some(first) = response.tool_results.first() else {
            transcript.push(Message::assistant(response.text));
            return Ok(TurnOutcome::Replied);
        };

        match ToolOutcome::from_tool_result(first)? {
            ToolOutcome::TransactionPrepared(payload) => {
                info!(tool = %first.tool_name, "Tool prepared a transaction");
                transcript.push(Message::tool(TRANSACTION_PREPARED_MESSAGE));
                Ok(TurnOutcome::TransactionPrepared(self.enrich(payload).await))
            }
            ToolOutcome::InformationalResult(json) => {
                let tool_results = serde_json::to_value(&response.tool_results)?;
                let summary = self.actions.summarize_tool_result(&tool_results).await?;
                transcript.push(Message::assistant(summary));
                transcript.push(Message::tool(pretty_json(&json)));
                Ok(TurnOutcome::Summarized)
            }
        }
    }

    // Enrichment is best effort: the raw payload is still signable.
    async fn enrich(&self, payload: TransactionPayload) -> TransactionPayload {
        let Some(enricher) = self.enricher else {
            return payload;
        };
        match enricher.enrich(payload.clone()).await {
            Ok(enriched) => enriched,
            Err(e) => {
                warn!("Keeping unenriched transaction: {}", e);
                payload
            }
        }
    }
}

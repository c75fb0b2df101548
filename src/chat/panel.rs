// src/chat/panel.rs

use serde_json::Value;

use crate::{blockchain::models::TransactionPayload, utils::pretty_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    SignAndExecute,
    Cancel,
}

impl PanelAction {
    pub fn label(&self) -> &'static str {
        match self {
            PanelAction::SignAndExecute => "Sign & Execute",
            PanelAction::Cancel => "Cancel",
        }
    }
}

/// Read-only view of a prepared transaction with its two actions.
/// `txBytes` is never shown.
#[derive(Debug, Clone, Copy)]
pub struct TransactionPanel<'a> {
    payload: &'a TransactionPayload,
}

impl<'a> TransactionPanel<'a> {
    pub const TITLE: &'static str = "Prepared Transaction";
    pub const ACTIONS: [PanelAction; 2] = [PanelAction::SignAndExecute, PanelAction::Cancel];

    pub fn new(payload: &'a TransactionPayload) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &'a TransactionPayload {
        self.payload
    }

    pub fn details(&self) -> String {
        pretty_json(&Value::Object(self.payload.fields.clone()))
    }

    pub fn render(&self) -> String {
        let actions: Vec<&str> = Self::ACTIONS.iter().map(PanelAction::label).collect();
        format!(
            "── {} ──\n{}\n[ {} ]",
            Self::TITLE,
            self.details(),
            actions.join(" | ")
        )
    }
}

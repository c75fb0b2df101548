// src/chat/mod.rs

pub mod actions;
pub mod message;
pub mod outcome;
pub mod panel;
pub mod prompt;
pub mod remote;
pub mod turn;

pub use actions::{ChatActions, ChatError, ChatResponse, ToolResult};
pub use message::{Message, Role, Transcript};
pub use outcome::ToolOutcome;
pub use panel::{PanelAction, TransactionPanel};
pub use turn::{TurnHandler, TurnOutcome, TurnRejected};

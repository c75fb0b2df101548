// src/lib.rs

use std::sync::Arc;

pub mod ai;
pub mod api;
pub mod app;
pub mod blockchain;
pub mod chat;
pub mod config;
pub mod mcp;
pub mod utils;
pub mod wallet;

pub use app::{ChatApp, Notice, NoticeLevel, Phase};
pub use config::Config;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Chat and summary actions served to remote clients
    pub actions: Arc<dyn chat::actions::ChatActions>,
}

impl AppState {
    pub fn new(actions: Arc<dyn chat::actions::ChatActions>) -> Self {
        Self { actions }
    }
}

//! API module
//!
//! Contains HTTP request handlers for agents, API keys, chat sessions and flows

pub mod agents;
pub mod chat;
pub mod flows;
pub mod keys;

use serde::Serialize;

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
    /// Status indicator (e.g., "ok", "error")
    pub status: String,
}

impl MessageResponse {
    /// Successful response carrying `message`
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: "ok".to_string(),
        }
    }
}

//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// All errors that can occur in the application are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Agent with the given ID was not found
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Agent draft is missing required information
    #[error("Invalid agent configuration: {0}")]
    InvalidAgentConfig(String),

    /// Built-in agents cannot be deleted or mutated in place
    #[error("Built-in agent cannot be modified: {0}")]
    BuiltinAgentImmutable(String),

    /// API key record with the given ID was not found
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// API key record is missing a provider or secret
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    /// No usable credential for the request
    #[error("{provider} API key not found. Add an API key for this agent in the builder or add a general key on the API Keys page.")]
    MissingCredential {
        /// Provider the lookup was performed for
        provider: String,
    },

    /// The generation endpoint call failed
    #[error("Dispatch failed: {0}")]
    DispatchFailed(String),

    /// Chat session with the given ID was not found
    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    /// Chat message with the given ID was not found in the session
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// A chat submission was empty or otherwise unusable
    #[error("Invalid chat input: {0}")]
    InvalidChatInput(String),

    /// The session is already waiting for a response
    #[error("A response is already pending for session {0}")]
    TurnInProgress(String),

    /// Error occurred during state persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::state::PersistenceError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short, user-facing title for notifications about this error
    pub fn title(&self) -> &'static str {
        match self {
            AppError::MissingCredential { .. } => "API Key Not Found",
            AppError::InvalidAgentConfig(_) | AppError::InvalidApiKey(_) => "Missing Information",
            _ => "An error occurred",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::AgentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidAgentConfig(_) => StatusCode::BAD_REQUEST,
            AppError::BuiltinAgentImmutable(_) => StatusCode::FORBIDDEN,
            AppError::ApiKeyNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidApiKey(_) => StatusCode::BAD_REQUEST,
            AppError::MissingCredential { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DispatchFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MessageNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidChatInput(_) => StatusCode::BAD_REQUEST,
            AppError::TurnInProgress(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "title": self.title(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

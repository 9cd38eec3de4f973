//! AgentVerse
//!
//! Backend for creating, managing and chatting with AI agents: agent and
//! API key stores, in-memory chat sessions and Gemini-backed flows.
//! The server binary is in `src/main.rs`.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
/// Application state management
///
/// Handles the agent catalog, API keys, persistence and open chat sessions.
pub mod state;

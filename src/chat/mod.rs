//! Chat module
//!
//! In-memory chat sessions with agents. Sessions are not persisted.

pub mod models;
pub mod session;
pub mod turn;

pub use models::{ChatMessage, Feedback, MessageId, MessageRole, Notice};
pub use session::{ChatSession, SessionId, TurnState, TurnTicket};
pub use turn::{run_turn, TurnInput};

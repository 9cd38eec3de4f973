//! Chat session state machine
//!
//! One session is an in-memory, ordered message log with an explicit turn
//! state. A turn moves `Idle -> AwaitingResponse -> Delivered | Failed`;
//! both end states accept the next submission.

use super::models::{ChatMessage, Feedback, MessageId, MessageRole, Notice};
use crate::error::AppError;
use crate::llm::DataUri;
use crate::state::{Agent, AgentId};
use serde::Serialize;

/// Unique identifier for a chat session
pub type SessionId = String;

/// Turn state of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TurnState {
    /// No turn has run yet
    Idle,
    /// A user message was appended and its response is pending
    AwaitingResponse {
        /// ID of the optimistically appended user message
        pending: MessageId,
    },
    /// The last turn appended an agent response
    Delivered,
    /// The last turn failed and its user message was retracted
    Failed,
}

/// Handle for an in-flight turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTicket {
    /// ID of the user message the turn started with
    pub user_message_id: MessageId,
}

/// An in-memory conversation with one agent
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    /// Unique identifier for the session
    pub id: SessionId,
    /// Agent the session talks to
    pub agent_id: AgentId,
    /// Ordered message log
    pub messages: Vec<ChatMessage>,
    /// Current turn state
    pub state: TurnState,
    /// Error notices, one per failed turn
    pub notices: Vec<Notice>,
}

impl ChatSession {
    /// Open a session with the agent's greeting as the first message
    pub fn new(id: SessionId, agent: &Agent) -> Self {
        Self {
            id,
            agent_id: agent.id.clone(),
            messages: vec![ChatMessage::new(MessageRole::Agent, agent.greeting(), None)],
            state: TurnState::Idle,
            notices: Vec::new(),
        }
    }

    /// Whether a response is pending
    pub fn is_busy(&self) -> bool {
        matches!(self.state, TurnState::AwaitingResponse { .. })
    }

    /// Start a turn: validate the input and append the user message
    ///
    /// A malformed image data URI is dropped. Rejects empty input (no text
    /// and no usable image) and submissions while a response is pending;
    /// neither changes the log.
    pub fn begin_turn(
        &mut self,
        text: &str,
        image: Option<String>,
    ) -> Result<TurnTicket, AppError> {
        if self.is_busy() {
            return Err(AppError::TurnInProgress(self.id.clone()));
        }
        let image = image
            .filter(|uri| !uri.trim().is_empty())
            .and_then(|uri| match uri.parse::<DataUri>() {
                Ok(_) => Some(uri),
                Err(reason) => {
                    tracing::warn!(
                        session_id = %self.id,
                        reason = %reason,
                        "Dropping malformed image data URI"
                    );
                    None
                }
            });
        if text.trim().is_empty() && image.is_none() {
            return Err(AppError::InvalidChatInput(
                "Enter a message or attach an image".to_string(),
            ));
        }

        let message = ChatMessage::new(MessageRole::User, text.to_string(), image);
        let ticket = TurnTicket {
            user_message_id: message.id.clone(),
        };
        self.messages.push(message);
        self.state = TurnState::AwaitingResponse {
            pending: ticket.user_message_id.clone(),
        };
        Ok(ticket)
    }

    /// Complete a turn with the agent's response
    pub fn deliver(
        &mut self,
        ticket: &TurnTicket,
        response: String,
    ) -> Result<&ChatMessage, AppError> {
        self.ensure_pending(ticket)?;
        self.messages
            .push(ChatMessage::new(MessageRole::Agent, response, None));
        self.state = TurnState::Delivered;
        let delivered = self.messages.len() - 1;
        Ok(&self.messages[delivered])
    }

    /// Fail a turn: retract its user message and record one notice
    pub fn fail(&mut self, ticket: &TurnTicket, error: &AppError) -> Result<(), AppError> {
        self.ensure_pending(ticket)?;
        self.messages
            .retain(|message| message.id != ticket.user_message_id);
        self.notices.push(Notice {
            title: error.title().to_string(),
            description: error.to_string(),
        });
        self.state = TurnState::Failed;
        Ok(())
    }

    /// Set feedback on an agent message; local only
    pub fn set_feedback(
        &mut self,
        message_id: &str,
        feedback: Feedback,
    ) -> Result<&ChatMessage, AppError> {
        let message = self
            .messages
            .iter_mut()
            .find(|message| message.id == message_id)
            .ok_or_else(|| AppError::MessageNotFound(message_id.to_string()))?;
        if message.role != MessageRole::Agent {
            return Err(AppError::InvalidChatInput(
                "Feedback can only be given on agent messages".to_string(),
            ));
        }
        message.feedback = Some(feedback);
        Ok(message)
    }

    /// Contents of all agent messages, oldest first
    pub fn agent_responses(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|message| message.role == MessageRole::Agent)
            .map(|message| message.content.clone())
            .collect()
    }

    fn ensure_pending(&self, ticket: &TurnTicket) -> Result<(), AppError> {
        match &self.state {
            TurnState::AwaitingResponse { pending } if *pending == ticket.user_message_id => Ok(()),
            _ => Err(AppError::Internal(anyhow::anyhow!(
                "No pending turn for message {} in session {}",
                ticket.user_message_id,
                self.id
            ))),
        }
    }
}

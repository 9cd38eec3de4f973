//! Chat turn orchestration
//!
//! Drives one turn of a session through its state machine against the shared
//! state. The lock is held only while the session is mutated; the model call
//! runs without it.

use super::models::ChatMessage;
use crate::error::AppError;
use crate::llm::{dispatch, MultiModalInput};
use crate::state::SharedState;
use serde::Deserialize;
use tracing::{info, warn};

/// User submission for one turn
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnInput {
    /// Message text
    #[serde(default)]
    pub text: String,
    /// Optional image as a data URI
    #[serde(default)]
    pub image_data_uri: Option<String>,
}

/// Run one chat turn
///
/// On success the agent's message is returned and the log has grown by two
/// entries. On failure the optimistic user message is retracted, one notice
/// is recorded on the session and the error is returned.
pub async fn run_turn(
    state: &SharedState,
    session_id: &str,
    input: TurnInput,
) -> Result<ChatMessage, AppError> {
    let (ticket, key, generator, request) = {
        let mut state = state.write().await;
        let agent_id = state.session(session_id)?.agent_id.clone();
        let agent = state.find_agent(&agent_id)?;
        let key = state.resolve_key_for(&agent);
        let generator = state.generator();

        let session = state.session_mut(session_id)?;
        let ticket = session.begin_turn(&input.text, input.image_data_uri)?;
        let image = session
            .messages
            .last()
            .and_then(|message| message.image.clone());

        let request = MultiModalInput {
            text: input.text,
            image_data_uri: image,
            system_prompt: agent.system_prompt().map(str::to_string),
        };
        (ticket, key, generator, request)
    };

    let result = match key {
        Ok(key) => dispatch(generator.as_ref(), &request, Some(&key)).await,
        Err(e) => Err(e),
    };

    let mut state = state.write().await;
    let session = state.session_mut(session_id)?;
    match result {
        Ok(output) => {
            let message = session.deliver(&ticket, output.response)?.clone();
            info!(
                session_id = %session_id,
                response_len = message.content.len(),
                "Chat turn delivered"
            );
            Ok(message)
        }
        Err(error) => {
            warn!(session_id = %session_id, error = %error, "Chat turn failed");
            session.fail(&ticket, &error)?;
            Err(error)
        }
    }
}

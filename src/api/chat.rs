//! Chat session API handlers
//!
//! Sessions live in memory only. A turn can be submitted as JSON (image as a
//! data URI) or as multipart form data (image as a file upload).

use super::MessageResponse;
use crate::chat::{run_turn, ChatMessage, ChatSession, Feedback, TurnInput};
use crate::error::AppError;
use crate::llm::DataUri;
use crate::state::{AgentId, SharedState};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{info, warn};

/// Largest accepted image upload (7 MB)
pub const MAX_IMAGE_BYTES: usize = 7 * 1024 * 1024;

/// Request body limit for chat turns; room for a base64 encoded image
pub const MAX_TURN_BODY_BYTES: usize = MAX_IMAGE_BYTES * 4 / 3 + 64 * 1024;

/// Feedback request
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// "good" or "bad"
    pub feedback: Feedback,
}

/// POST /api/agents/:id/sessions - Open a chat with an agent
pub async fn open_session(
    State(state): State<SharedState>,
    Path(agent_id): Path<AgentId>,
) -> Result<(StatusCode, Json<ChatSession>), AppError> {
    let mut state = state.write().await;
    let session = state.open_session(&agent_id)?.clone();
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/:id - Read a chat session
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ChatSession>, AppError> {
    let state = state.read().await;
    Ok(Json(state.session(&id)?.clone()))
}

/// DELETE /api/sessions/:id - Close a chat session
pub async fn close_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut state = state.write().await;
    let closed = state.close_session(&id)?;
    info!(session_id = %id, messages = closed.messages.len(), "Chat session closed");
    Ok(Json(MessageResponse::ok("Chat session closed")))
}

/// POST /api/sessions/:id/messages - Run a chat turn
pub async fn post_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<TurnInput>,
) -> Result<Json<ChatMessage>, AppError> {
    let message = run_turn(&state, &id, input).await?;
    Ok(Json(message))
}

/// POST /api/sessions/:id/upload - Run a chat turn from multipart form data
///
/// Fields:
/// - text: message text
/// - image: optional image file, at most 7 MB
pub async fn upload_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ChatMessage>, AppError> {
    let mut input = TurnInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidChatInput(format!("Failed to read form data: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "text" => {
                input.text = field.text().await.map_err(|e| {
                    AppError::InvalidChatInput(format!("Failed to read text field: {}", e))
                })?;
            }
            "image" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidChatInput(format!("Failed to read image data: {}", e))
                })?;

                if data.is_empty() {
                    continue;
                }
                input.image_data_uri = Some(upload_to_data_uri(&mime_type, &data)?);
            }
            _ => {
                warn!("Unknown multipart field: {}", field_name);
            }
        }
    }

    let message = run_turn(&state, &id, input).await?;
    Ok(Json(message))
}

/// Check an uploaded file and encode it as a data URI
fn upload_to_data_uri(mime_type: &str, data: &[u8]) -> Result<String, AppError> {
    if !mime_type.starts_with("image/") {
        return Err(AppError::InvalidChatInput(format!(
            "Unsupported upload type: {}",
            mime_type
        )));
    }
    if data.len() > MAX_IMAGE_BYTES {
        warn!(size = data.len(), "Image upload too large");
        return Err(AppError::InvalidChatInput(
            "Image exceeds the 7 MB limit".to_string(),
        ));
    }

    info!(mime_type = %mime_type, size = data.len(), "Received image upload");
    Ok(DataUri::from_bytes(mime_type, data).to_string())
}

/// PUT /api/sessions/:id/messages/:message_id/feedback - Set message feedback
pub async fn set_feedback(
    State(state): State<SharedState>,
    Path((id, message_id)): Path<(String, String)>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    let mut state = state.write().await;
    let message = state
        .session_mut(&id)?
        .set_feedback(&message_id, req.feedback)?
        .clone();
    Ok(Json(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageRole;
    use crate::llm::{GenerateRequest, Generator};
    use crate::state::AppState;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header::CONTENT_TYPE, Request};
    use std::sync::Arc;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, _api_key: &str, _request: GenerateRequest) -> Result<String, AppError> {
            Ok("Hi there".to_string())
        }
    }

    async fn state_with_key() -> SharedState {
        let state = AppState::in_memory(Arc::new(EchoGenerator)).shared();
        state
            .write()
            .await
            .add_api_key("Gemini", "test-key-123")
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_open_session_starts_with_greeting() {
        let state = state_with_key().await;
        let (status, session) = open_session(State(state), Path("1".to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, MessageRole::Agent);
        assert!(session.messages[0].content.starts_with("Hello! I am"));
    }

    #[tokio::test]
    async fn test_open_session_unknown_agent() {
        let state = state_with_key().await;
        let result = open_session(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(AppError::AgentNotFound(_))));
    }

    #[tokio::test]
    async fn test_post_message_and_feedback() {
        let state = state_with_key().await;
        let (_, session) = open_session(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();

        let reply = post_message(
            State(state.clone()),
            Path(session.id.clone()),
            Json(TurnInput {
                text: "Hello".to_string(),
                image_data_uri: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(reply.content, "Hi there");

        let updated = set_feedback(
            State(state.clone()),
            Path((session.id.clone(), reply.id.clone())),
            Json(FeedbackRequest {
                feedback: Feedback::Good,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.feedback, Some(Feedback::Good));

        let session = get_session(State(state), Path(session.id.clone()))
            .await
            .unwrap();
        assert_eq!(session.messages.len(), 3);
    }

    const BOUNDARY: &str = "agentverse-boundary";

    fn text_field(name: &str, value: &str) -> Vec<u8> {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        )
        .into_bytes()
    }

    fn file_field(name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut field = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"upload.bin\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, name, content_type
        )
        .into_bytes();
        field.extend_from_slice(data);
        field.extend_from_slice(b"\r\n");
        field
    }

    async fn multipart(fields: Vec<Vec<u8>>) -> Multipart {
        let mut body: Vec<u8> = fields.concat();
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/sessions/s/upload")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upload_converts_image_to_data_uri() {
        let state = state_with_key().await;
        let (_, session) = open_session(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();
        let png = b"\x89PNG\r\n\x1a\n";

        let form = multipart(vec![
            text_field("text", "What is this?"),
            file_field("image", "image/png", png),
        ])
        .await;
        let reply = upload_message(State(state.clone()), Path(session.id.clone()), form)
            .await
            .unwrap();
        assert_eq!(reply.content, "Hi there");

        let session = get_session(State(state), Path(session.id.clone()))
            .await
            .unwrap();
        let user = &session.messages[1];
        assert_eq!(user.content, "What is this?");
        assert_eq!(
            user.image.as_deref(),
            Some(DataUri::from_bytes("image/png", png).to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let state = state_with_key().await;
        let (_, session) = open_session(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();

        let form = multipart(vec![
            text_field("text", "Read this"),
            file_field("image", "text/plain", b"hello"),
        ])
        .await;
        let result = upload_message(State(state.clone()), Path(session.id.clone()), form).await;
        assert!(matches!(result, Err(AppError::InvalidChatInput(_))));

        let session = get_session(State(state), Path(session.id.clone()))
            .await
            .unwrap();
        assert_eq!(session.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_text_only() {
        let state = state_with_key().await;
        let (_, session) = open_session(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();

        let form = multipart(vec![text_field("text", "Hello")]).await;
        upload_message(State(state.clone()), Path(session.id.clone()), form)
            .await
            .unwrap();

        let session = get_session(State(state), Path(session.id.clone()))
            .await
            .unwrap();
        assert_eq!(session.messages.len(), 3);
        assert!(session.messages[1].image.is_none());
    }

    #[test]
    fn test_upload_size_limit() {
        let at_limit = vec![0u8; MAX_IMAGE_BYTES];
        assert!(upload_to_data_uri("image/jpeg", &at_limit).is_ok());

        let over_limit = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(
            upload_to_data_uri("image/jpeg", &over_limit),
            Err(AppError::InvalidChatInput(_))
        ));
    }

    #[tokio::test]
    async fn test_close_session() {
        let state = state_with_key().await;
        let (_, session) = open_session(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();

        close_session(State(state.clone()), Path(session.id.clone()))
            .await
            .unwrap();
        let result = get_session(State(state), Path(session.id.clone())).await;
        assert!(matches!(result, Err(AppError::SessionNotFound(_))));
    }
}

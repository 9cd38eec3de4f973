//! API key management handlers
//!
//! Raw key material is accepted on create but never returned.

use super::MessageResponse;
use crate::error::AppError;
use crate::state::{ApiKeyRecord, Provider, SharedState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// API key response type
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResponse {
    /// Record identifier
    pub id: String,
    /// Provider the key belongs to
    pub provider: Provider,
    /// Masked key for display
    pub key: String,
    /// Date the key was added
    pub created_at: NaiveDate,
}

impl From<&ApiKeyRecord> for KeyResponse {
    fn from(record: &ApiKeyRecord) -> Self {
        Self {
            id: record.id.clone(),
            provider: record.provider.clone(),
            key: record.masked_key.clone(),
            created_at: record.created_at,
        }
    }
}

/// Keys list response
#[derive(Serialize)]
pub struct KeysListResponse {
    /// Stored keys, masked
    pub keys: Vec<KeyResponse>,
    /// Total number of keys
    pub count: usize,
}

/// Create key request
#[derive(Deserialize)]
pub struct CreateKeyRequest {
    /// Provider label, e.g. "Gemini"
    pub provider: String,
    /// The raw key
    pub key: String,
}

/// GET /api/keys - List stored keys
pub async fn list_keys(State(state): State<SharedState>) -> Result<Json<KeysListResponse>, AppError> {
    let state = state.read().await;
    let keys: Vec<KeyResponse> = state.api_keys()?.iter().map(KeyResponse::from).collect();

    Ok(Json(KeysListResponse {
        count: keys.len(),
        keys,
    }))
}

/// POST /api/keys - Add a key
pub async fn create_key(
    State(state): State<SharedState>,
    Json(req): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<KeyResponse>), AppError> {
    let mut state = state.write().await;
    let record = state.add_api_key(&req.provider, &req.key)?;
    Ok((StatusCode::CREATED, Json(KeyResponse::from(&record))))
}

/// DELETE /api/keys/:id - Delete a key
pub async fn delete_key(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut state = state.write().await;
    let removed = state.delete_api_key(&id)?;

    Ok(Json(MessageResponse::ok(format!(
        "{} key has been deleted",
        removed.provider.display_name()
    ))))
}

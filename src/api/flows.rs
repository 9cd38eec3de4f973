//! Flow API handlers
//!
//! Description generator and feedback analyzer. A request may carry its own
//! `apiKey`; otherwise the key store is searched for the default provider.

use crate::error::AppError;
use crate::llm::flows::{
    analyze_agent_feedback, generate_agent_description, AnalyzeAgentFeedbackInput,
    AnalyzeAgentFeedbackOutput, GenerateAgentDescriptionInput, GenerateAgentDescriptionOutput,
};
use crate::llm::Generator;
use crate::state::SharedState;
use axum::{extract::State, response::Json};
use serde::Deserialize;
use std::sync::Arc;

/// Description generator request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeRequest {
    /// Flow input
    #[serde(flatten)]
    pub input: GenerateAgentDescriptionInput,
    /// Key to use instead of the key store
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Feedback analyzer request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeFeedbackRequest {
    /// Flow input
    #[serde(flatten)]
    pub input: AnalyzeAgentFeedbackInput,
    /// Chat session the response came from
    ///
    /// When set and `previousAgentResponses` is empty, the session's other
    /// agent messages are used as the history.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Key to use instead of the key store
    #[serde(default)]
    pub api_key: Option<String>,
}

async fn flow_context(
    state: &SharedState,
    explicit_key: Option<&str>,
) -> Result<(String, Arc<dyn Generator>), AppError> {
    let state = state.read().await;
    let key = state.resolve_request_key(explicit_key)?;
    Ok((key, state.generator()))
}

/// POST /api/flows/describe - Expand a high-level agent description
pub async fn describe_agent(
    State(state): State<SharedState>,
    Json(req): Json<DescribeRequest>,
) -> Result<Json<GenerateAgentDescriptionOutput>, AppError> {
    let (key, generator) = flow_context(&state, req.api_key.as_deref()).await?;
    let output = generate_agent_description(generator.as_ref(), &key, &req.input).await?;
    Ok(Json(output))
}

/// POST /api/flows/analyze-feedback - Rewrite a response from user feedback
pub async fn analyze_feedback(
    State(state): State<SharedState>,
    Json(mut req): Json<AnalyzeFeedbackRequest>,
) -> Result<Json<AnalyzeAgentFeedbackOutput>, AppError> {
    if let Some(session_id) = req.session_id.as_deref() {
        if req.input.previous_agent_responses.is_empty() {
            let state = state.read().await;
            req.input.previous_agent_responses = state
                .session(session_id)?
                .agent_responses()
                .into_iter()
                .filter(|response| *response != req.input.agent_response)
                .collect();
        }
    }

    let (key, generator) = flow_context(&state, req.api_key.as_deref()).await?;
    let output = analyze_agent_feedback(generator.as_ref(), &key, &req.input).await?;
    Ok(Json(output))
}

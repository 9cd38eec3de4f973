//! Agent management API handlers
//!
//! Contains HTTP request handlers for the dashboard listing and the builder.

use super::MessageResponse;
use crate::error::AppError;
use crate::state::{
    is_builtin_id, tools, Agent, AgentDraft, AgentId, Performance, Provider, SaveOutcome,
    SharedState, Tool, ToolKind,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

/// Agent response type
///
/// Never carries the agent's API key, only whether one is set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    /// Unique identifier for the agent
    pub id: AgentId,
    /// Human-readable name of the agent
    pub name: String,
    /// What the agent does
    pub description: String,
    /// Avatar image URI
    pub avatar: String,
    /// Attached tools
    pub tools: Vec<ToolKind>,
    /// Dashboard performance figures
    pub performance: Performance,
    /// Whether the agent is deployed
    pub is_deployed: bool,
    /// Selected provider
    pub provider: Option<Provider>,
    /// System prompt
    pub system_prompt: Option<String>,
    /// Whether the agent has its own API key
    pub has_api_key: bool,
    /// Whether this is one of the seeded agents
    pub builtin: bool,
}

impl From<&Agent> for AgentResponse {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            description: agent.description.clone(),
            avatar: agent.avatar.clone(),
            tools: agent.tools.clone(),
            performance: agent.performance,
            is_deployed: agent.is_deployed,
            provider: agent.provider.clone(),
            system_prompt: agent.system_prompt.clone(),
            has_api_key: agent.own_api_key().is_some(),
            builtin: is_builtin_id(&agent.id),
        }
    }
}

/// Agents list response
#[derive(Serialize)]
pub struct AgentsListResponse {
    /// Built-in agents followed by custom agents
    pub agents: Vec<AgentResponse>,
    /// Total number of agents
    pub count: usize,
}

/// Response to a builder save
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAgentResponse {
    /// The stored agent
    pub agent: AgentResponse,
    /// "created", "updated" or "forked"
    pub outcome: &'static str,
    /// Built-in ID the agent was forked from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forked_from: Option<AgentId>,
}

impl SaveAgentResponse {
    fn new(outcome: &SaveOutcome, agent: &Agent) -> Self {
        let (label, forked_from) = match outcome {
            SaveOutcome::Created(_) => ("created", None),
            SaveOutcome::Updated(_) => ("updated", None),
            SaveOutcome::Forked { from, .. } => ("forked", Some(from.clone())),
        };
        Self {
            agent: AgentResponse::from(agent),
            outcome: label,
            forked_from,
        }
    }
}

/// GET /api/agents - List all agents
pub async fn list_agents(
    State(state): State<SharedState>,
) -> Result<Json<AgentsListResponse>, AppError> {
    let state = state.read().await;
    let agents: Vec<AgentResponse> = state.agents()?.iter().map(AgentResponse::from).collect();

    Ok(Json(AgentsListResponse {
        count: agents.len(),
        agents,
    }))
}

/// GET /api/agents/:id - Get a specific agent
pub async fn get_agent(
    State(state): State<SharedState>,
    Path(id): Path<AgentId>,
) -> Result<Json<AgentResponse>, AppError> {
    let state = state.read().await;
    let agent = state.find_agent(&id)?;
    Ok(Json(AgentResponse::from(&agent)))
}

/// POST /api/agents - Create a new agent
pub async fn create_agent(
    State(state): State<SharedState>,
    Json(draft): Json<AgentDraft>,
) -> Result<(StatusCode, Json<SaveAgentResponse>), AppError> {
    let mut state = state.write().await;
    let (outcome, agent) = state.save_agent(None, draft)?;
    Ok((
        StatusCode::CREATED,
        Json(SaveAgentResponse::new(&outcome, &agent)),
    ))
}

/// PUT /api/agents/:id - Update an agent
///
/// Editing a built-in stores the edit as a new custom agent.
pub async fn update_agent(
    State(state): State<SharedState>,
    Path(id): Path<AgentId>,
    Json(draft): Json<AgentDraft>,
) -> Result<Json<SaveAgentResponse>, AppError> {
    let mut state = state.write().await;
    let (outcome, agent) = state.save_agent(Some(&id), draft)?;
    Ok(Json(SaveAgentResponse::new(&outcome, &agent)))
}

/// DELETE /api/agents/:id - Delete a custom agent
pub async fn delete_agent(
    State(state): State<SharedState>,
    Path(id): Path<AgentId>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut state = state.write().await;
    let removed = state.delete_agent(&id)?;

    Ok(Json(MessageResponse::ok(format!(
        "{} has been deleted",
        removed.name
    ))))
}

/// GET /api/tools - Tool catalog
pub async fn list_tools() -> Json<Vec<Tool>> {
    Json(tools())
}

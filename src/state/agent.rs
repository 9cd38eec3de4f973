// Agent records
// Built-in and user-created agents share this shape; persisted as camelCase JSON

use super::catalog::ToolKind;
use super::keys::Provider;
use serde::{Deserialize, Deserializer, Serialize};

/// Unique identifier for an agent
pub type AgentId = String;

/// Avatar assigned to agents created through the builder
pub const DEFAULT_AVATAR: &str = "https://placehold.co/128x128.png";

/// Observed quality figures shown on the dashboard
///
/// Stored values are clamped on load: accuracy to 0-100, response time to
/// non-negative seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Performance {
    /// Accuracy in percent (0-100)
    #[serde(deserialize_with = "accuracy_percent")]
    pub accuracy: u8,
    /// Average response time in seconds
    #[serde(deserialize_with = "non_negative_seconds")]
    pub response_time: f64,
}

fn accuracy_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_nan() {
        return Ok(0);
    }
    Ok(value.clamp(0.0, 100.0).round() as u8)
}

fn non_negative_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(if value.is_nan() || value < 0.0 { 0.0 } else { value })
}

/// Agent structure
/// A named chat persona with an optional system prompt and credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Unique identifier for the agent
    pub id: AgentId,
    /// Display name of the agent
    pub name: String,
    /// What the agent does
    pub description: String,
    /// Avatar image URI
    pub avatar: String,
    /// Tools attached to the agent, in display order
    #[serde(default)]
    pub tools: Vec<ToolKind>,
    /// Dashboard performance figures
    #[serde(default)]
    pub performance: Performance,
    /// Whether the agent is marked as deployed
    #[serde(default)]
    pub is_deployed: bool,
    /// AI provider selected in the builder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Agent-specific API key; takes precedence over the key store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Context and personality sent to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Agent {
    /// Build an agent record from a builder draft under the given ID
    ///
    /// Builder-created records always start with the placeholder avatar,
    /// zeroed performance and `is_deployed = false`.
    pub fn from_draft(id: AgentId, draft: AgentDraft) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            avatar: DEFAULT_AVATAR.to_string(),
            tools: draft.tools,
            performance: Performance::default(),
            is_deployed: false,
            provider: Some(draft.provider.unwrap_or_default()),
            api_key: draft.api_key,
            system_prompt: draft.system_prompt,
        }
    }

    /// The agent's own API key, if it is set and non-empty
    pub fn own_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// The system prompt, if it is set and non-empty
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }

    /// Greeting that opens every chat with this agent
    pub fn greeting(&self) -> String {
        format!("Hello! I am {}. How can I assist you today?", self.name)
    }
}

/// Builder form contents used to create or update an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    /// Display name
    pub name: String,
    /// What the agent does
    pub description: String,
    /// System prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// AI provider (defaults to Gemini)
    #[serde(default)]
    pub provider: Option<Provider>,
    /// Agent-specific API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Tools to attach
    #[serde(default)]
    pub tools: Vec<ToolKind>,
}

impl AgentDraft {
    /// Validate the draft
    /// Returns Ok(()) if valid, Err with message if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.description.trim().is_empty() {
            return Err("Please provide a name and description for your agent.".to_string());
        }
        Ok(())
    }
}

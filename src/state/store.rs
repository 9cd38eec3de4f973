//! Agent store reconciliation
//!
//! Pure operations over the built-in agents and the persisted custom list.
//! Nothing here touches storage; `AppState` loads, mutates and saves.

use super::agent::{Agent, AgentDraft, AgentId};
use super::catalog::is_builtin_id;
use crate::error::AppError;
use std::collections::HashSet;

/// Generate a timestamp-derived ID (`<prefix>-<unix millis>`)
///
/// Bumps the suffix while `taken` reports a collision, so two records created
/// within the same millisecond still get distinct IDs.
pub fn generate_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut millis = chrono::Utc::now().timestamp_millis();
    loop {
        let candidate = format!("{}-{}", prefix, millis);
        if !taken(&candidate) && !is_builtin_id(&candidate) {
            return candidate;
        }
        millis += 1;
    }
}

/// Merge built-in and custom agents into the dashboard list
///
/// Built-ins come first and unchanged. Custom agents follow in stored order,
/// skipping any whose ID is already present.
pub fn merge_agents(builtins: &[Agent], custom: &[Agent]) -> Vec<Agent> {
    let mut seen: HashSet<&str> = builtins.iter().map(|a| a.id.as_str()).collect();
    let mut merged = builtins.to_vec();
    for agent in custom {
        if seen.insert(agent.id.as_str()) {
            merged.push(agent.clone());
        }
    }
    merged
}

/// Result of saving a builder draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new custom agent was appended
    Created(AgentId),
    /// An existing custom agent was replaced in place
    Updated(AgentId),
    /// A built-in was edited; the edit was stored as a new custom agent
    Forked {
        /// The built-in ID that was edited
        from: AgentId,
        /// ID of the new custom agent
        id: AgentId,
    },
}

impl SaveOutcome {
    /// ID of the custom record that now holds the draft
    pub fn id(&self) -> &AgentId {
        match self {
            SaveOutcome::Created(id) | SaveOutcome::Updated(id) => id,
            SaveOutcome::Forked { id, .. } => id,
        }
    }
}

/// Save a builder draft into the custom list
///
/// * `target` - `None` to create, `Some(id)` to edit an existing agent
///
/// Editing a custom agent replaces it in place. Editing a built-in never
/// mutates it: the draft is appended under a freshly generated ID.
pub fn save_agent(
    custom: &mut Vec<Agent>,
    target: Option<&str>,
    draft: AgentDraft,
) -> Result<SaveOutcome, AppError> {
    draft.validate().map_err(AppError::InvalidAgentConfig)?;

    match target {
        Some(id) if is_builtin_id(id) => {
            let new_id = next_agent_id(custom);
            custom.push(Agent::from_draft(new_id.clone(), draft));
            Ok(SaveOutcome::Forked {
                from: id.to_string(),
                id: new_id,
            })
        }
        Some(id) => {
            let index = custom
                .iter()
                .position(|a| a.id == id)
                .ok_or_else(|| AppError::AgentNotFound(id.to_string()))?;
            custom[index] = Agent::from_draft(id.to_string(), draft);
            Ok(SaveOutcome::Updated(id.to_string()))
        }
        None => {
            let new_id = next_agent_id(custom);
            custom.push(Agent::from_draft(new_id.clone(), draft));
            Ok(SaveOutcome::Created(new_id))
        }
    }
}

/// Delete a custom agent
///
/// Built-in IDs are rejected and leave the list untouched.
pub fn delete_agent(custom: &mut Vec<Agent>, id: &str) -> Result<Agent, AppError> {
    if is_builtin_id(id) {
        return Err(AppError::BuiltinAgentImmutable(id.to_string()));
    }
    let index = custom
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| AppError::AgentNotFound(id.to_string()))?;
    Ok(custom.remove(index))
}

fn next_agent_id(custom: &[Agent]) -> AgentId {
    generate_id("agent", |candidate| custom.iter().any(|a| a.id == candidate))
}

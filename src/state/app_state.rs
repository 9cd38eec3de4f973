// Application state management
// Repositories, the generator, the default provider and open chat sessions

use super::agent::{Agent, AgentDraft};
use super::catalog::builtin_agents;
use super::keys::{self, ApiKeyRecord, Provider};
use super::persistence::{
    AgentRepository, CredentialRepository, LocalRepository, MemoryStore, RecoveryPolicy,
};
use super::store::{self, SaveOutcome};
use crate::chat::{ChatSession, SessionId};
use crate::error::AppError;
use crate::llm::resolve::{resolve_key, resolve_provider_key};
use crate::llm::Generator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared across request handlers
pub type SharedState = Arc<RwLock<AppState>>;

/// Main application state
///
/// Storage is reached only through the injected repositories; every mutating
/// operation takes `&mut self` so it runs under the write lock.
pub struct AppState {
    agent_repo: Arc<dyn AgentRepository>,
    credential_repo: Arc<dyn CredentialRepository>,
    generator: Arc<dyn Generator>,
    default_provider: Provider,
    sessions: HashMap<SessionId, ChatSession>,
}

impl AppState {
    /// Create application state from its collaborators
    pub fn new(
        agent_repo: Arc<dyn AgentRepository>,
        credential_repo: Arc<dyn CredentialRepository>,
        generator: Arc<dyn Generator>,
        default_provider: Provider,
    ) -> Self {
        Self {
            agent_repo,
            credential_repo,
            generator,
            default_provider,
            sessions: HashMap::new(),
        }
    }

    /// State backed by a fresh in-memory store (Gemini as default provider)
    pub fn in_memory(generator: Arc<dyn Generator>) -> Self {
        let repo = Arc::new(LocalRepository::new(MemoryStore::new(), RecoveryPolicy::Fail));
        Self::new(repo.clone(), repo, generator, Provider::Gemini)
    }

    /// Wrap in the shared handle used by the router
    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Generator used for chat turns and flows
    pub fn generator(&self) -> Arc<dyn Generator> {
        Arc::clone(&self.generator)
    }

    /// Built-in agents followed by the stored custom agents
    pub fn agents(&self) -> Result<Vec<Agent>, AppError> {
        let custom = self.agent_repo.load_agents()?;
        Ok(store::merge_agents(builtin_agents(), &custom))
    }

    /// Look up an agent in the merged list
    pub fn find_agent(&self, id: &str) -> Result<Agent, AppError> {
        self.agents()?
            .into_iter()
            .find(|agent| agent.id == id)
            .ok_or_else(|| AppError::AgentNotFound(id.to_string()))
    }

    /// Save a builder draft and persist the custom list
    ///
    /// Returns the outcome together with the stored record.
    pub fn save_agent(
        &mut self,
        target: Option<&str>,
        draft: AgentDraft,
    ) -> Result<(SaveOutcome, Agent), AppError> {
        let mut custom = self.agent_repo.load_agents()?;
        let outcome = store::save_agent(&mut custom, target, draft)?;
        self.agent_repo.save_agents(&custom)?;

        let saved = custom
            .into_iter()
            .find(|agent| agent.id == *outcome.id())
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Agent not found after save")))?;

        tracing::info!(agent_id = %saved.id, outcome = ?outcome, "Agent saved");
        Ok((outcome, saved))
    }

    /// Delete a custom agent and persist the custom list
    pub fn delete_agent(&mut self, id: &str) -> Result<Agent, AppError> {
        let mut custom = self.agent_repo.load_agents()?;
        let removed = store::delete_agent(&mut custom, id)?;
        self.agent_repo.save_agents(&custom)?;
        tracing::info!(agent_id = %id, "Agent deleted");
        Ok(removed)
    }

    /// All stored API key records
    pub fn api_keys(&self) -> Result<Vec<ApiKeyRecord>, AppError> {
        Ok(self.credential_repo.load_keys()?)
    }

    /// Store a new API key
    pub fn add_api_key(&mut self, provider: &str, raw: &str) -> Result<ApiKeyRecord, AppError> {
        let mut records = self.credential_repo.load_keys()?;
        let added = keys::add_key(&mut records, provider, raw)?.clone();
        self.credential_repo.save_keys(&records)?;
        tracing::info!(key_id = %added.id, provider = %added.provider, "API key added");
        Ok(added)
    }

    /// Delete an API key
    pub fn delete_api_key(&mut self, id: &str) -> Result<ApiKeyRecord, AppError> {
        let mut records = self.credential_repo.load_keys()?;
        let removed = keys::delete_key(&mut records, id)?;
        self.credential_repo.save_keys(&records)?;
        tracing::info!(key_id = %id, "API key deleted");
        Ok(removed)
    }

    /// Resolve the API key to use for `agent`
    pub fn resolve_key_for(&self, agent: &Agent) -> Result<String, AppError> {
        let records = self.credential_repo.load_keys()?;
        resolve_key(agent, &records, &self.default_provider)
    }

    /// Resolve a key for a request not tied to an agent
    ///
    /// An explicit non-empty key wins; otherwise the key store is searched
    /// for the default provider.
    pub fn resolve_request_key(&self, explicit: Option<&str>) -> Result<String, AppError> {
        if let Some(key) = explicit.map(str::trim).filter(|key| !key.is_empty()) {
            return Ok(key.to_string());
        }
        let records = self.credential_repo.load_keys()?;
        resolve_provider_key(&records, &self.default_provider)
    }

    /// Open a chat session with an agent
    pub fn open_session(&mut self, agent_id: &str) -> Result<&ChatSession, AppError> {
        let agent = self.find_agent(agent_id)?;
        let id = uuid::Uuid::new_v4().to_string();
        tracing::info!(session_id = %id, agent_id = %agent_id, "Chat session opened");
        Ok(self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| ChatSession::new(id, &agent)))
    }

    /// Get a chat session
    pub fn session(&self, id: &str) -> Result<&ChatSession, AppError> {
        self.sessions
            .get(id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Get a chat session for mutation
    pub fn session_mut(&mut self, id: &str) -> Result<&mut ChatSession, AppError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Close a chat session, dropping its log
    pub fn close_session(&mut self, id: &str) -> Result<ChatSession, AppError> {
        self.sessions
            .remove(id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Get the number of open sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

// State management module
// Agent and credential records, their reconciliation, persistence and the shared application state

pub mod agent;
pub mod app_state;
pub mod catalog;
pub mod keys;
pub mod persistence;
pub mod store;

pub use agent::{Agent, AgentDraft, AgentId, Performance};
pub use app_state::{AppState, SharedState};
pub use catalog::{builtin_agents, is_builtin_id, tools, Tool, ToolIcon, ToolKind};
pub use keys::{ApiKeyRecord, Provider};
pub use persistence::{
    AgentRepository, CredentialRepository, FileStore, KeyValueStore, LocalRepository,
    MemoryStore, PersistenceError, RecoveryPolicy,
};
pub use store::{merge_agents, SaveOutcome};

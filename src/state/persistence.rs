// Persistence module
// String-valued key-value storage plus the agent and credential repositories on top of it

use super::agent::Agent;
use super::keys::ApiKeyRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

/// Storage key holding the JSON array of custom agents
pub const CUSTOM_AGENTS_KEY: &str = "customAgents";
/// Storage key holding the JSON array of API key records
pub const API_KEYS_KEY: &str = "apiKeys";

/// Error types for persistence operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// File I/O error
    IoError(String),
    /// JSON serialization error
    JsonError(String),
    /// A stored value could not be parsed
    Corrupt {
        /// Storage key of the unreadable value
        key: String,
        /// Parser message
        reason: String,
    },
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::IoError(msg) => write!(f, "IO Error: {}", msg),
            PersistenceError::JsonError(msg) => write!(f, "JSON Error: {}", msg),
            PersistenceError::Corrupt { key, reason } => {
                write!(f, "Corrupt value under '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

/// What to do when a stored value is not valid JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// Move the bad value aside under `<key>.corrupt` and start empty
    #[default]
    Reset,
    /// Report `PersistenceError::Corrupt`
    Fail,
}

impl FromStr for RecoveryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(RecoveryPolicy::Reset),
            "fail" => Ok(RecoveryPolicy::Fail),
            other => Err(format!("Unknown recovery policy: {}", other)),
        }
    }
}

/// String-valued key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    /// Write `value` under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// One file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| PersistenceError::IoError(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::IoError(e.to_string()))?;
        fs::write(self.path_for(key), value).map_err(|e| PersistenceError::IoError(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::IoError(e.to_string())),
        }
    }
}

/// In-process store, used by tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds consistent strings
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.values().remove(key);
        Ok(())
    }
}

/// Load/save of the user-created agents
pub trait AgentRepository: Send + Sync {
    /// Load custom agents in stored order
    fn load_agents(&self) -> Result<Vec<Agent>, PersistenceError>;
    /// Replace the stored custom agents
    fn save_agents(&self, agents: &[Agent]) -> Result<(), PersistenceError>;
}

/// Load/save of the API key records
pub trait CredentialRepository: Send + Sync {
    /// Load key records in stored order
    fn load_keys(&self) -> Result<Vec<ApiKeyRecord>, PersistenceError>;
    /// Replace the stored key records
    fn save_keys(&self, keys: &[ApiKeyRecord]) -> Result<(), PersistenceError>;
}

/// JSON-array repositories over any `KeyValueStore`
pub struct LocalRepository<S> {
    store: S,
    recovery: RecoveryPolicy,
}

impl<S: KeyValueStore> LocalRepository<S> {
    /// Wrap a store with the given recovery policy
    pub fn new(store: S, recovery: RecoveryPolicy) -> Self {
        Self { store, recovery }
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, PersistenceError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => match self.recovery {
                RecoveryPolicy::Fail => Err(PersistenceError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
                RecoveryPolicy::Reset => {
                    let backup = format!("{}.corrupt", key);
                    tracing::warn!(
                        key = %key,
                        backup = %backup,
                        error = %e,
                        "Stored value is not valid JSON, resetting to empty"
                    );
                    self.store.set(&backup, &raw)?;
                    self.store.remove(key)?;
                    Ok(Vec::new())
                }
            },
        }
    }

    fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| PersistenceError::JsonError(e.to_string()))?;
        self.store.set(key, &json)
    }
}

impl<S: KeyValueStore> AgentRepository for LocalRepository<S> {
    fn load_agents(&self) -> Result<Vec<Agent>, PersistenceError> {
        self.load_list(CUSTOM_AGENTS_KEY)
    }

    fn save_agents(&self, agents: &[Agent]) -> Result<(), PersistenceError> {
        self.save_list(CUSTOM_AGENTS_KEY, agents)
    }
}

impl<S: KeyValueStore> CredentialRepository for LocalRepository<S> {
    fn load_keys(&self) -> Result<Vec<ApiKeyRecord>, PersistenceError> {
        self.load_list(API_KEYS_KEY)
    }

    fn save_keys(&self, keys: &[ApiKeyRecord]) -> Result<(), PersistenceError> {
        self.save_list(API_KEYS_KEY, keys)
    }
}

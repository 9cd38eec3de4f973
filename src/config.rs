//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::llm::config::LlmConfig;
use crate::state::{Provider, RecoveryPolicy};
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// Generation endpoint configuration
    pub llm: LlmConfig,
    /// Provider whose stored keys are used when an agent has no key of its own
    pub default_provider: Provider,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Directory holding the key-value files (`customAgents`, `apiKeys`)
    pub data_dir: PathBuf,
    /// What to do when a stored value is not valid JSON
    pub recovery: RecoveryPolicy,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            persistence: PersistenceConfig {
                data_dir: env::var_os("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_data_dir),
                recovery: env::var("STORAGE_RECOVERY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default(),
            },
            llm: LlmConfig::from_env(),
            default_provider: default_provider(env::var("DEFAULT_PROVIDER").ok().as_deref()),
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Provider whose stored keys back agents without their own key
///
/// Generation only talks to Gemini, so any other provider would hand its key
/// to the wrong endpoint; those values fall back to Gemini.
fn default_provider(value: Option<&str>) -> Provider {
    let Some(label) = value.map(str::trim).filter(|label| !label.is_empty()) else {
        return Provider::Gemini;
    };
    match Provider::parse(label) {
        Provider::Gemini => Provider::Gemini,
        other => {
            tracing::warn!(
                provider = %other,
                "DEFAULT_PROVIDER is not supported for generation, using gemini"
            );
            Provider::Gemini
        }
    }
}

/// Default to ~/.agentverse or a directory in the current working directory
fn default_data_dir() -> PathBuf {
    if let Some(home) = env::var_os("HOME") {
        let mut path = PathBuf::from(home);
        path.push(".agentverse");
        path
    } else {
        PathBuf::from(".agentverse")
    }
}

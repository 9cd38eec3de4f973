//! Generation endpoint configuration

use serde::Serialize;
use std::env;

/// Default Gemini REST base URL
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for chat turns and flows
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Generation endpoint configuration
#[derive(Debug, Clone, Serialize)]
pub struct LlmConfig {
    /// Gemini model name
    pub model: String,
    /// Gemini API base URL
    pub api_base_url: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base_url: GEMINI_API_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Load from `GEMINI_MODEL`, `GEMINI_API_BASE_URL` and `LLM_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model: env::var("GEMINI_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.model),
            api_base_url: env::var("GEMINI_API_BASE_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or(defaults.api_base_url),
            timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .filter(|t| *t > 0)
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

//! API key resolution
//!
//! Decides which credential authorizes a request for an agent.

use crate::error::AppError;
use crate::state::{Agent, ApiKeyRecord, Provider};

/// Resolve the API key for `agent`
///
/// 1. The agent's own key, when set and non-empty.
/// 2. Otherwise the first stored record whose provider matches
///    `default_provider` (case-insensitive) and whose raw key is non-empty.
/// 3. Otherwise `AppError::MissingCredential`.
///
/// Pure lookup; the caller decides how to surface the error.
pub fn resolve_key(
    agent: &Agent,
    keys: &[ApiKeyRecord],
    default_provider: &Provider,
) -> Result<String, AppError> {
    if let Some(own) = agent.own_api_key() {
        return Ok(own.to_string());
    }
    resolve_provider_key(keys, default_provider)
}

/// First non-empty stored key for `provider`
pub fn resolve_provider_key(keys: &[ApiKeyRecord], provider: &Provider) -> Result<String, AppError> {
    keys.iter()
        .filter(|record| record.provider.matches(provider))
        .map(|record| record.key_raw.trim())
        .find(|raw| !raw.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::MissingCredential {
            provider: provider.display_name().to_string(),
        })
}

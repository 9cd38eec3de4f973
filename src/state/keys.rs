//! API key store
//!
//! Provider credentials kept in persisted storage. Each record keeps the raw
//! secret for dispatch and a masked form for display.

use super::store::generate_id;
use crate::error::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// AI provider enumeration
///
/// Parsed case-insensitively so "gemini" and "Gemini" name the same provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    /// Google Gemini
    #[default]
    Gemini,
    /// OpenAI
    OpenAi,
    /// Anthropic Claude
    Claude,
    /// Any other provider label
    Other(String),
}

impl Provider {
    /// Parse a provider label, ignoring case and surrounding whitespace
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        match label.to_ascii_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAi,
            "claude" => Provider::Claude,
            _ => Provider::Other(label.to_string()),
        }
    }

    /// Canonical storage label
    pub fn as_str(&self) -> &str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Claude => "claude",
            Provider::Other(label) => label,
        }
    }

    /// Get a display name for the provider
    pub fn display_name(&self) -> &str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::OpenAi => "OpenAI",
            Provider::Claude => "Claude",
            Provider::Other(label) => label,
        }
    }

    /// Case-insensitive provider comparison
    pub fn matches(&self, other: &Provider) -> bool {
        match (self, other) {
            (Provider::Other(a), Provider::Other(b)) => a.eq_ignore_ascii_case(b),
            _ => self == other,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Provider::parse(s))
    }
}

impl Serialize for Provider {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Provider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Provider::parse(&label))
    }
}

/// Mask a secret for display: first 3 characters, "...", last 4 characters
pub fn mask_key(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let head: String = chars.iter().take(3).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// A stored provider credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    /// Record identifier (`key-<millis>`)
    pub id: String,
    /// Provider this key authorizes
    pub provider: Provider,
    /// Masked key for display
    #[serde(rename = "key")]
    pub masked_key: String,
    /// Raw secret, only read when building a dispatch request
    pub key_raw: String,
    /// Day the key was added
    pub created_at: NaiveDate,
}

impl ApiKeyRecord {
    /// Create a record, masking the raw key
    pub fn new(id: String, provider: Provider, raw: String, created_at: NaiveDate) -> Self {
        Self {
            id,
            provider,
            masked_key: mask_key(&raw),
            key_raw: raw,
            created_at,
        }
    }
}

/// Append a new key to the store and return it
pub fn add_key<'a>(
    keys: &'a mut Vec<ApiKeyRecord>,
    provider: &str,
    raw: &str,
) -> Result<&'a ApiKeyRecord, AppError> {
    let raw = raw.trim();
    if provider.trim().is_empty() || raw.is_empty() {
        return Err(AppError::InvalidApiKey(
            "A provider and an API key are both required".to_string(),
        ));
    }

    let id = generate_id("key", |candidate| keys.iter().any(|k| k.id == candidate));
    let record = ApiKeyRecord::new(
        id,
        Provider::parse(provider),
        raw.to_string(),
        chrono::Utc::now().date_naive(),
    );
    keys.push(record);
    let added = keys.len() - 1;
    Ok(&keys[added])
}

/// Remove a key by ID
pub fn delete_key(keys: &mut Vec<ApiKeyRecord>, id: &str) -> Result<ApiKeyRecord, AppError> {
    let index = keys
        .iter()
        .position(|k| k.id == id)
        .ok_or_else(|| AppError::ApiKeyNotFound(id.to_string()))?;
    Ok(keys.remove(index))
}

//! Multi-modal dispatch
//!
//! Builds the chat-turn prompt (text plus an optional inline image) and sends
//! it through a `Generator`. The generator is a trait so chat sessions and
//! flows can run against a fake model in tests.

use crate::error::AppError;
use crate::llm::api_client::call_gemini_api;
use crate::llm::config::LlmConfig;
use crate::llm::gemini_types::{
    GeminiApiRequest, GenerationConfig, InlineData, RequestContent, RequestPart,
};
use crate::state::Provider;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MULTI_MODAL_PREAMBLE: &str =
    "You are an intelligent agent that can process both text and images to provide relevant responses.";

/// Parsed `data:<mime>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// MIME type, e.g. "image/png"
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

impl DataUri {
    /// Encode raw bytes as a data URI
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: STANDARD.encode(bytes),
        }
    }
}

impl FromStr for DataUri {
    type Err = String;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| "data URI must start with 'data:'".to_string())?;
        let (mime_type, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| "data URI must be base64 encoded".to_string())?;

        if mime_type.is_empty() || !mime_type.contains('/') {
            return Err(format!("invalid MIME type '{}'", mime_type));
        }
        if data.is_empty() {
            return Err("data URI payload is empty".to_string());
        }
        STANDARD
            .decode(data)
            .map_err(|e| format!("invalid base64 payload: {}", e))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Input of one chat turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiModalInput {
    /// Textual input from the user
    pub text: String,
    /// Optional image as a data URI
    #[serde(default)]
    pub image_data_uri: Option<String>,
    /// Optional system prompt of the agent being chatted with
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Output of one chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiModalOutput {
    /// The model's reply
    pub response: String,
}

/// A provider-agnostic generation request
#[derive(Debug, Default)]
pub struct GenerateRequest {
    /// Ordered prompt parts
    pub parts: Vec<RequestPart>,
    /// System instruction, if any
    pub system_prompt: Option<String>,
    /// Ask the model for a JSON reply
    pub json_output: bool,
}

/// Something that turns a request into model text
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one generation call
    async fn generate(&self, api_key: &str, request: GenerateRequest) -> Result<String, AppError>;
}

/// `Generator` backed by the Gemini REST API
pub struct GeminiGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl GeminiGenerator {
    /// Create a generator with its own HTTP client
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, api_key: &str, request: GenerateRequest) -> Result<String, AppError> {
        let body = GeminiApiRequest {
            contents: vec![RequestContent {
                role: Some("user".to_string()),
                parts: request.parts,
            }],
            system_instruction: request.system_prompt.map(|prompt| RequestContent {
                role: None,
                parts: vec![RequestPart::text(prompt)],
            }),
            generation_config: request.json_output.then(|| GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
            }),
        };
        call_gemini_api(&self.client, &self.config, api_key, &body).await
    }
}

/// Build the chat-turn prompt
///
/// The image is included only when it parses as a base64 data URI; a
/// malformed URI is dropped with a warning and the text is still sent.
pub fn build_request(input: &MultiModalInput) -> GenerateRequest {
    let image = input
        .image_data_uri
        .as_deref()
        .filter(|uri| !uri.is_empty())
        .and_then(|uri| match uri.parse::<DataUri>() {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                tracing::warn!(reason = %reason, "Ignoring malformed image data URI");
                None
            }
        });

    let mut parts = Vec::with_capacity(3);
    let mut lead = format!("{}\n\nText: {}\n\n", MULTI_MODAL_PREAMBLE, input.text);
    if let Some(image) = image {
        lead.push_str("Image: ");
        parts.push(RequestPart::text(lead));
        parts.push(RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type,
                data: image.data,
            },
        });
        parts.push(RequestPart::text("\n\nResponse:"));
    } else {
        lead.push_str("Response:");
        parts.push(RequestPart::text(lead));
    }

    GenerateRequest {
        parts,
        system_prompt: input
            .system_prompt
            .clone()
            .filter(|prompt| !prompt.trim().is_empty()),
        json_output: false,
    }
}

/// Dispatch one chat turn
///
/// Fails with `MissingCredential` before any network call when `api_key` is
/// absent or empty. Any generator failure surfaces as `DispatchFailed`.
pub async fn dispatch(
    generator: &dyn Generator,
    input: &MultiModalInput,
    api_key: Option<&str>,
) -> Result<MultiModalOutput, AppError> {
    let api_key = api_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AppError::MissingCredential {
            provider: Provider::Gemini.display_name().to_string(),
        })?;

    let request = build_request(input);
    let response = generator
        .generate(api_key, request)
        .await
        .map_err(into_dispatch_error)?;

    Ok(MultiModalOutput { response })
}

/// Normalize generator errors into the dispatch taxonomy
pub(crate) fn into_dispatch_error(error: AppError) -> AppError {
    match error {
        AppError::DispatchFailed(_) | AppError::MissingCredential { .. } => error,
        other => AppError::DispatchFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGenerator {
        calls: AtomicUsize,
        reply: Result<String, String>,
    }

    impl CountingGenerator {
        fn replying(reply: Result<&str, &str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: reply.map(str::to_string).map_err(str::to_string),
            }
        }
    }

    #[async_trait]
    impl Generator for CountingGenerator {
        async fn generate(&self, _api_key: &str, _request: GenerateRequest) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
        }
    }

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_data_uri_parse() {
        let uri: DataUri = PNG_URI.parse().unwrap();
        assert_eq!(uri.mime_type, "image/png");
        assert_eq!(uri.data, "iVBORw0KGgo=");
        assert_eq!(uri.to_string(), PNG_URI);
    }

    #[test]
    fn test_data_uri_rejects_malformed() {
        for bad in [
            "http://example.com/cat.png",
            "data:image/png,rawdata",
            "data:;base64,AAAA",
            "data:image/png;base64,",
            "data:image/png;base64,not base64!",
        ] {
            assert!(bad.parse::<DataUri>().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_data_uri_from_bytes() {
        let uri = DataUri::from_bytes("image/jpeg", b"abc");
        assert_eq!(uri.to_string(), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_build_request_text_only() {
        let request = build_request(&MultiModalInput {
            text: "Hello".to_string(),
            ..Default::default()
        });
        assert_eq!(request.parts.len(), 1);
        match &request.parts[0] {
            RequestPart::Text { text } => {
                assert!(text.contains("Text: Hello"));
                assert!(text.ends_with("Response:"));
            }
            other => panic!("Expected text part, got: {:?}", other),
        }
        assert!(request.system_prompt.is_none());
    }

    #[test]
    fn test_build_request_with_image() {
        let request = build_request(&MultiModalInput {
            text: "What is this?".to_string(),
            image_data_uri: Some(PNG_URI.to_string()),
            system_prompt: Some("You are terse.".to_string()),
        });
        assert_eq!(request.parts.len(), 3);
        assert_eq!(
            request.parts[1],
            RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: "image/png".to_string(),
                    data: "iVBORw0KGgo=".to_string(),
                }
            }
        );
        assert_eq!(request.system_prompt.as_deref(), Some("You are terse."));
    }

    #[test]
    fn test_build_request_drops_malformed_image() {
        let request = build_request(&MultiModalInput {
            text: "Look".to_string(),
            image_data_uri: Some("not-a-data-uri".to_string()),
            system_prompt: None,
        });
        assert_eq!(request.parts.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_key_never_calls_generator() {
        let generator = CountingGenerator::replying(Ok("unused"));
        let input = MultiModalInput {
            text: "Hello".to_string(),
            ..Default::default()
        };

        for key in [None, Some(""), Some("   ")] {
            let result = dispatch(&generator, &input, key).await;
            assert!(matches!(result, Err(AppError::MissingCredential { .. })));
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let generator = CountingGenerator::replying(Ok("Hi there"));
        let input = MultiModalInput {
            text: "Hello".to_string(),
            ..Default::default()
        };
        let output = dispatch(&generator, &input, Some("key")).await.unwrap();
        assert_eq!(output.response, "Hi there");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_dispatch_failed() {
        let generator = CountingGenerator::replying(Err("connection reset"));
        let input = MultiModalInput {
            text: "Hello".to_string(),
            ..Default::default()
        };
        match dispatch(&generator, &input, Some("key")).await {
            Err(AppError::DispatchFailed(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("Expected DispatchFailed, got: {:?}", other),
        }
    }
}

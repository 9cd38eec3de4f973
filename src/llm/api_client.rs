//! Gemini API client
//!
//! Direct HTTP client for the Gemini `generateContent` endpoint.
//! One call is one non-retried round trip.

use crate::error::AppError;
use crate::llm::config::LlmConfig;
use crate::llm::gemini_types::{GeminiApiRequest, GeminiApiResponse};
use crate::state::Provider;

/// Call Gemini API with a prepared request
///
/// # Arguments
/// * `client` - Shared HTTP client (connection pooling)
/// * `config` - Model name and base URL
/// * `api_key` - Gemini API key
/// * `request` - Request body
///
/// # Returns
/// * `Ok(String)` - The concatenated text parts of the first candidate
/// * `Err(AppError)` - If the key is empty or the call failed
///
/// # Errors
/// * `AppError::MissingCredential` if the API key is empty (no request is sent)
/// * `AppError::DispatchFailed` if the HTTP request fails, the endpoint returns
///   an error status, the prompt is blocked, or the response has no text
pub async fn call_gemini_api(
    client: &reqwest::Client,
    config: &LlmConfig,
    api_key: &str,
    request: &GeminiApiRequest,
) -> Result<String, AppError> {
    if api_key.trim().is_empty() {
        return Err(AppError::MissingCredential {
            provider: Provider::Gemini.display_name().to_string(),
        });
    }

    let url = format!(
        "{}/models/{}:generateContent",
        config.api_base_url.trim_end_matches('/'),
        config.model
    );

    tracing::debug!(
        model = %config.model,
        parts = request.contents.iter().map(|c| c.parts.len()).sum::<usize>(),
        has_system_instruction = request.system_instruction.is_some(),
        "Calling Gemini API"
    );

    let response = client
        .post(&url)
        .query(&[("key", api_key)])
        .json(request)
        .send()
        .await
        .map_err(|e| {
            AppError::DispatchFailed(format!(
                "Failed to send HTTP request to Gemini API: {}",
                e.without_url()
            ))
        })?;

    // Check HTTP status
    let status = response.status();
    if !status.is_success() {
        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());

        tracing::error!(
            status_code = status_code,
            error_body = %error_body,
            "Gemini API returned error status"
        );

        if status_code == 429 {
            return Err(AppError::DispatchFailed(format!(
                "Gemini API rate limit exceeded (HTTP {}): {}",
                status_code, error_body
            )));
        }

        return Err(AppError::DispatchFailed(format!(
            "Gemini API returned error status {}: {}",
            status_code, error_body
        )));
    }

    let response_body = response.text().await.map_err(|e| {
        AppError::DispatchFailed(format!(
            "Failed to read response body from Gemini API: {}",
            e.without_url()
        ))
    })?;

    let parsed: GeminiApiResponse = serde_json::from_str(&response_body).map_err(|e| {
        AppError::DispatchFailed(format!(
            "Failed to parse JSON response from Gemini API: {} - Response body: {}",
            e, response_body
        ))
    })?;

    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_ref())
    {
        return Err(AppError::DispatchFailed(format!(
            "Gemini API blocked the prompt: {}",
            reason
        )));
    }

    let candidate = parsed.candidates.first().ok_or_else(|| {
        AppError::DispatchFailed("Gemini API response contains no candidates".to_string())
    })?;

    let text: String = candidate
        .content
        .parts
        .iter()
        .map(|part| part.text.as_str())
        .collect();
    if text.is_empty() {
        return Err(AppError::DispatchFailed(format!(
            "Gemini API response text is empty (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    tracing::debug!(
        response_len = text.len(),
        "Successfully received response from Gemini API"
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::gemini_types::{RequestContent, RequestPart};
    use mockito::{Matcher, Server};
    use serial_test::serial;

    fn request() -> GeminiApiRequest {
        GeminiApiRequest {
            contents: vec![RequestContent {
                role: Some("user".to_string()),
                parts: vec![RequestPart::text("test prompt")],
            }],
            system_instruction: None,
            generation_config: None,
        }
    }

    fn config_for(server: &Server) -> LlmConfig {
        LlmConfig {
            api_base_url: server.url(),
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_call_gemini_api_empty_api_key() {
        let client = reqwest::Client::new();
        let result = call_gemini_api(&client, &LlmConfig::default(), "", &request()).await;
        assert!(matches!(result, Err(AppError::MissingCredential { .. })));
    }

    #[tokio::test]
    #[serial]
    async fn test_call_gemini_api_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"parts": [{"text": "test prompt"}]}]
            })))
            .with_status(200)
            .with_body(
                r#"{
                    "candidates": [{
                        "content": {
                            "parts": [{"text": "This is "}, {"text": "a test response"}],
                            "role": "model"
                        },
                        "finishReason": "STOP"
                    }]
                }"#,
            )
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let result = call_gemini_api(&client, &config_for(&server), "test-key", &request()).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap(), "This is a test response");
    }

    #[tokio::test]
    #[serial]
    async fn test_call_gemini_api_empty_candidates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let result = call_gemini_api(&client, &config_for(&server), "test-key", &request()).await;

        mock.assert_async().await;
        let error = result.unwrap_err();
        assert!(matches!(error, AppError::DispatchFailed(_)));
        assert!(error.to_string().contains("no candidates"));
    }

    #[tokio::test]
    #[serial]
    async fn test_call_gemini_api_blocked_prompt() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_body(r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let result = call_gemini_api(&client, &config_for(&server), "test-key", &request()).await;

        mock.assert_async().await;
        let error_msg = result.unwrap_err().to_string();
        assert!(
            error_msg.contains("blocked the prompt"),
            "Error message should contain 'blocked the prompt', got: {}",
            error_msg
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_call_gemini_api_rate_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(429)
            .with_body(r#"{"error": "Rate limit exceeded"}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let result = call_gemini_api(&client, &config_for(&server), "test-key", &request()).await;

        mock.assert_async().await;
        let error_msg = result.unwrap_err().to_string();
        assert!(error_msg.contains("rate limit") && error_msg.contains("429"));
    }

    #[tokio::test]
    #[serial]
    async fn test_call_gemini_api_invalid_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_body("This is not JSON")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let result = call_gemini_api(&client, &config_for(&server), "test-key", &request()).await;

        mock.assert_async().await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse JSON"));
    }
}

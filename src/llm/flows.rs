//! Single-prompt flows
//!
//! Description generator and feedback analyzer. Each is one JSON-mode model
//! call mapping a structured input to a structured output; no retry, no cache.

use crate::error::AppError;
use crate::llm::dispatch::{into_dispatch_error, GenerateRequest, Generator};
use crate::llm::gemini_types::RequestPart;
use crate::state::Provider;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Input of the description generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAgentDescriptionInput {
    /// A high-level description of the agent
    pub high_level_description: String,
}

/// Output of the description generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAgentDescriptionOutput {
    /// A detailed and refined description of the agent
    pub detailed_description: String,
}

/// Input of the feedback analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeAgentFeedbackInput {
    /// The response given by the agent
    pub agent_response: String,
    /// Whether the response was helpful or unhelpful, and why
    pub user_feedback: String,
    /// Earlier agent responses in the conversation
    #[serde(default)]
    pub previous_agent_responses: Vec<String>,
}

/// Output of the feedback analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeAgentFeedbackOutput {
    /// The agent response rewritten to incorporate the feedback
    pub updated_agent_response: String,
}

fn description_prompt(input: &GenerateAgentDescriptionInput) -> String {
    format!(
        "You are an expert AI agent designer. A user wants to build an agent with the following \
         high-level description: {}. Generate a more detailed and refined description to help \
         the user get started quickly.\n\n\
         Reply with a JSON object of the form {{\"detailedDescription\": string}}.",
        input.high_level_description
    )
}

fn feedback_prompt(input: &AnalyzeAgentFeedbackInput) -> String {
    let previous = if input.previous_agent_responses.is_empty() {
        "(none)".to_string()
    } else {
        input
            .previous_agent_responses
            .iter()
            .enumerate()
            .map(|(i, response)| format!("{}. {}", i + 1, response))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are an AI agent that is responsible for improving its responses based on user feedback.\n\n\
         You will receive the agent's previous response, the user's feedback, and a list of previous agent responses.\n\n\
         Your goal is to improve the agent's response so that it is more helpful to the user in the future.\n\n\
         Previous agent responses:\n{}\n\
         Agent response: {}\n\
         User feedback: {}\n\n\
         Reply with a JSON object of the form {{\"updatedAgentResponse\": string}}.",
        previous, input.agent_response, input.user_feedback
    )
}

async fn run_json_flow<T: DeserializeOwned>(
    generator: &dyn Generator,
    api_key: &str,
    flow: &'static str,
    prompt: String,
) -> Result<T, AppError> {
    if api_key.trim().is_empty() {
        return Err(AppError::MissingCredential {
            provider: Provider::Gemini.display_name().to_string(),
        });
    }

    tracing::debug!(flow = flow, prompt_len = prompt.len(), "Running flow");

    let request = GenerateRequest {
        parts: vec![RequestPart::text(prompt)],
        system_prompt: None,
        json_output: true,
    };
    let raw = generator
        .generate(api_key, request)
        .await
        .map_err(into_dispatch_error)?;

    serde_json::from_str(strip_code_fence(&raw)).map_err(|e| {
        tracing::error!(flow = flow, error = %e, "Flow returned unparsable output");
        AppError::DispatchFailed(format!("{} returned invalid JSON: {}", flow, e))
    })
}

/// Models sometimes wrap JSON in a ```json fence even in JSON mode
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Expand a short agent description into a detailed one
pub async fn generate_agent_description(
    generator: &dyn Generator,
    api_key: &str,
    input: &GenerateAgentDescriptionInput,
) -> Result<GenerateAgentDescriptionOutput, AppError> {
    if input.high_level_description.trim().is_empty() {
        return Err(AppError::InvalidAgentConfig(
            "A high-level description is required".to_string(),
        ));
    }
    run_json_flow(
        generator,
        api_key,
        "generateAgentDescription",
        description_prompt(input),
    )
    .await
}

/// Rewrite an agent response using the user's feedback
pub async fn analyze_agent_feedback(
    generator: &dyn Generator,
    api_key: &str,
    input: &AnalyzeAgentFeedbackInput,
) -> Result<AnalyzeAgentFeedbackOutput, AppError> {
    run_json_flow(
        generator,
        api_key,
        "analyzeAgentFeedback",
        feedback_prompt(input),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedGenerator {
        reply: String,
        seen: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, _api_key: &str, request: GenerateRequest) -> Result<String, AppError> {
            let prompt = match &request.parts[0] {
                RequestPart::Text { text } => text.clone(),
                RequestPart::InlineData { .. } => String::new(),
            };
            self.seen.lock().unwrap().push((prompt, request.json_output));
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_generate_agent_description() {
        let generator = ScriptedGenerator::new(r#"{"detailedDescription": "A thorough bot."}"#);
        let input = GenerateAgentDescriptionInput {
            high_level_description: "a support bot".to_string(),
        };
        let output = generate_agent_description(&generator, "key", &input)
            .await
            .unwrap();
        assert_eq!(output.detailed_description, "A thorough bot.");

        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].0.contains("a support bot"));
        assert!(seen[0].1, "flows must request JSON output");
    }

    #[tokio::test]
    async fn test_analyze_agent_feedback_with_fenced_json() {
        let generator =
            ScriptedGenerator::new("```json\n{\"updatedAgentResponse\": \"Better answer\"}\n```");
        let input = AnalyzeAgentFeedbackInput {
            agent_response: "Meh answer".to_string(),
            user_feedback: "Too vague".to_string(),
            previous_agent_responses: vec!["First".to_string(), "Second".to_string()],
        };
        let output = analyze_agent_feedback(&generator, "key", &input)
            .await
            .unwrap();
        assert_eq!(output.updated_agent_response, "Better answer");

        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].0.contains("1. First\n2. Second"));
        assert!(seen[0].0.contains("User feedback: Too vague"));
    }

    #[tokio::test]
    async fn test_flow_invalid_json_is_dispatch_failed() {
        let generator = ScriptedGenerator::new("not json at all");
        let input = AnalyzeAgentFeedbackInput {
            agent_response: "a".to_string(),
            user_feedback: "b".to_string(),
            previous_agent_responses: Vec::new(),
        };
        let result = analyze_agent_feedback(&generator, "key", &input).await;
        assert!(matches!(result, Err(AppError::DispatchFailed(_))));
    }

    #[tokio::test]
    async fn test_flow_requires_key() {
        let generator = ScriptedGenerator::new("{}");
        let input = GenerateAgentDescriptionInput {
            high_level_description: "bot".to_string(),
        };
        let result = generate_agent_description(&generator, "", &input).await;
        assert!(matches!(result, Err(AppError::MissingCredential { .. })));
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}

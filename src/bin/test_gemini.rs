//! Smoke test for the Gemini REST endpoint
//! This is a utility binary, not part of the main application

use agentverse::llm::{dispatch, GeminiGenerator, LlmConfig, MultiModalInput};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing Gemini generateContent from Rust...\n");

    let config = LlmConfig::from_env();
    println!("1. Endpoint: {}/models/{}", config.api_base_url, config.model);

    println!("\n2. Checking for GEMINI_API_KEY environment variable...");
    let key = match env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            println!("   ✓ GEMINI_API_KEY is set (length: {} chars)", key.len());
            key
        }
        _ => {
            eprintln!("   ✗ GEMINI_API_KEY not found in environment");
            eprintln!("   Make sure to export it: export GEMINI_API_KEY=\"your-key\"");
            return Err("GEMINI_API_KEY not set".into());
        }
    };

    println!("\n3. Executing test query...");
    println!("   Query: 'What is 2+2? Answer in one sentence.'");

    let generator = GeminiGenerator::new(config)?;
    let input = MultiModalInput {
        text: "What is 2+2? Answer in one sentence.".to_string(),
        ..Default::default()
    };

    match dispatch(&generator, &input, Some(&key)).await {
        Ok(output) => {
            println!("   ✓ Response received:");
            println!("   {}", output.response.trim());
        }
        Err(e) => {
            eprintln!("   ✗ Query failed: {}", e);
            return Err(e.into());
        }
    }

    println!("\n✓ Gemini endpoint is reachable");
    Ok(())
}

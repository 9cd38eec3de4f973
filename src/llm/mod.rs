//! LLM module
//!
//! Everything between an agent and the generation endpoint: key resolution,
//! request construction, the Gemini client and the single-prompt flows.

pub mod api_client;
pub mod config;
pub mod dispatch;
pub mod flows;
pub mod gemini_types;
pub mod resolve;

pub use config::LlmConfig;
pub use dispatch::{
    dispatch, DataUri, GeminiGenerator, GenerateRequest, Generator, MultiModalInput,
    MultiModalOutput,
};
pub use resolve::resolve_key;

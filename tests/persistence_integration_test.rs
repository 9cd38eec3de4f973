//! Agent and key stores over the file-backed key-value store

use agentverse::error::AppError;
use agentverse::llm::{GenerateRequest, Generator};
use agentverse::state::{
    builtin_agents, merge_agents, AgentDraft, AgentRepository, AppState, FileStore,
    LocalRepository, Provider, RecoveryPolicy, SaveOutcome,
};
use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

struct NoopGenerator;

#[async_trait]
impl Generator for NoopGenerator {
    async fn generate(&self, _api_key: &str, _request: GenerateRequest) -> Result<String, AppError> {
        Ok(String::new())
    }
}

fn state_in(dir: &TempDir, recovery: RecoveryPolicy) -> AppState {
    let repo = Arc::new(LocalRepository::new(FileStore::new(dir.path()), recovery));
    AppState::new(repo.clone(), repo, Arc::new(NoopGenerator), Provider::Gemini)
}

fn draft(name: &str) -> AgentDraft {
    AgentDraft {
        name: name.to_string(),
        description: format!("{} description", name),
        system_prompt: Some("Be concise.".to_string()),
        api_key: Some("agent-key".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_saved_agent_survives_reload() {
    let dir = TempDir::new().unwrap();

    let saved = {
        let mut state = state_in(&dir, RecoveryPolicy::Reset);
        state.save_agent(None, draft("Researcher")).unwrap().1
    };

    let state = state_in(&dir, RecoveryPolicy::Reset);
    let reloaded = state.find_agent(&saved.id).unwrap();
    assert_eq!(reloaded, saved);
    assert_eq!(state.agents().unwrap().len(), builtin_agents().len() + 1);
}

#[test]
fn test_stored_json_uses_camel_case_keys() {
    let dir = TempDir::new().unwrap();
    let mut state = state_in(&dir, RecoveryPolicy::Reset);
    state.save_agent(None, draft("Writer")).unwrap();

    let raw = std::fs::read_to_string(dir.path().join("customAgents.json")).unwrap();
    assert!(raw.contains("\"isDeployed\""));
    assert!(raw.contains("\"systemPrompt\""));
    assert!(raw.contains("\"apiKey\""));
    assert!(raw.contains("\"response_time\""));
}

#[test]
fn test_builtin_delete_rejected_and_list_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut state = state_in(&dir, RecoveryPolicy::Reset);
    state.save_agent(None, draft("Custom")).unwrap();
    let before = state.agents().unwrap();

    for id in ["1", "2", "3", "4"] {
        let result = state.delete_agent(id);
        assert!(matches!(result, Err(AppError::BuiltinAgentImmutable(_))));
    }
    assert_eq!(state.agents().unwrap(), before);
}

#[test]
fn test_custom_agent_with_builtin_id_is_shadowed() {
    let dir = TempDir::new().unwrap();
    let repo = LocalRepository::new(FileStore::new(dir.path()), RecoveryPolicy::Reset);
    let mut impostor = builtin_agents()[0].clone();
    impostor.name = "Impostor".to_string();
    repo.save_agents(&[impostor]).unwrap();

    let custom = repo.load_agents().unwrap();
    let merged = merge_agents(builtin_agents(), &custom);
    assert_eq!(merged.len(), builtin_agents().len());
    assert_eq!(merged[0], builtin_agents()[0]);
}

#[test]
fn test_editing_shadowed_builtin_id_stays_visible() {
    let dir = TempDir::new().unwrap();
    let repo = LocalRepository::new(FileStore::new(dir.path()), RecoveryPolicy::Reset);
    let mut shadow = builtin_agents()[0].clone();
    shadow.name = "Shadow".to_string();
    repo.save_agents(&[shadow]).unwrap();

    let mut state = state_in(&dir, RecoveryPolicy::Reset);
    let (outcome, saved) = state.save_agent(Some("1"), draft("My Edit")).unwrap();
    assert!(matches!(outcome, SaveOutcome::Forked { .. }));
    assert_ne!(saved.id, "1");

    let names: Vec<String> = state.agents().unwrap().into_iter().map(|a| a.name).collect();
    assert!(names.contains(&"My Edit".to_string()));
    assert_eq!(names[0], "Market Analyst");
}

#[test]
fn test_out_of_range_performance_is_clamped_on_load() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("customAgents.json"),
        r#"[{"id": "agent-7", "name": "Odd", "description": "Bad figures",
             "avatar": "https://placehold.co/128x128.png",
             "performance": {"accuracy": 180, "response_time": -2.0}}]"#,
    )
    .unwrap();

    let state = state_in(&dir, RecoveryPolicy::Fail);
    let agent = state.find_agent("agent-7").unwrap();
    assert_eq!(agent.performance.accuracy, 100);
    assert_eq!(agent.performance.response_time, 0.0);
}

#[test]
fn test_corrupt_store_is_reset_and_backed_up() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("customAgents.json"), "{not json").unwrap();

    let state = state_in(&dir, RecoveryPolicy::Reset);
    assert_eq!(state.agents().unwrap().len(), builtin_agents().len());

    let backup = std::fs::read_to_string(dir.path().join("customAgents.corrupt.json")).unwrap();
    assert_eq!(backup, "{not json");
    assert!(!dir.path().join("customAgents.json").exists());
}

#[test]
fn test_corrupt_store_fails_when_configured() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("apiKeys.json"), "[{]").unwrap();

    let state = state_in(&dir, RecoveryPolicy::Fail);
    let result = state.api_keys();
    assert!(matches!(result, Err(AppError::Persistence(_))));
}

#[test]
fn test_api_keys_persist_with_raw_and_masked_values() {
    let dir = TempDir::new().unwrap();
    {
        let mut state = state_in(&dir, RecoveryPolicy::Reset);
        state.add_api_key("Gemini", "AIzaSecretValue9876").unwrap();
    }

    let state = state_in(&dir, RecoveryPolicy::Reset);
    let keys = state.api_keys().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].masked_key, "AIz...9876");
    assert_eq!(keys[0].key_raw, "AIzaSecretValue9876");

    let agent = state.find_agent("1").unwrap();
    assert_eq!(state.resolve_key_for(&agent).unwrap(), "AIzaSecretValue9876");
}

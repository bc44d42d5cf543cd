//! Integration tests for configuration loading and router construction

use prabhai_core::config::{
    from_yaml_str, load_from_json, load_from_path, load_from_yaml, ConfigError, PrabhaiConfig,
    ProviderKind, ValidationErrorKind,
};
use prabhai_core::protocol::Capability;
use prabhai_core::providers::{Router, RoutingTableError};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const FULL_YAML: &str = r#"
version: "0.1"

retry:
  max_attempts: 4
  initial_delay_ms: 250
  backoff_multiplier: 3.0

connection:
  connect_timeout_ms: 2000
  request_timeout_ms: 30000

providers:
  - name: groq-llm
    kind: openai
    capability: llm
    base_url: https://api.groq.com/openai/v1
    model: llama-3.1-8b-instant
    api_key_env: GROQ_API_KEY
  - name: claude-llm
    kind: anthropic
    capability: llm
  - name: openai-tts
    kind: openai
    capability: tts
    voice: nova
  - name: gemini-tts
    kind: unimplemented
    capability: tts
  - name: whisper
    kind: openai
    capability: stt
    enabled: false
  - name: groq-whisper
    kind: openai
    capability: stt
    base_url: https://api.groq.com/openai/v1
    model: whisper-large-v3
    api_key_env: GROQ_API_KEY

routing:
  llm: [groq-llm, claude-llm]
  tts: [gemini-tts, openai-tts]
  stt: [whisper, groq-whisper]
"#;

#[test]
fn test_load_full_yaml_config() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "prabhai.yaml", FULL_YAML);

    let config = load_from_yaml(&path).unwrap();

    assert_eq!(config.providers.len(), 6);
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.connection.connect_timeout_ms, 2000);

    let claude = config.provider("claude-llm").unwrap();
    assert_eq!(claude.kind, ProviderKind::Anthropic);
    assert_eq!(claude.base_url(), Some("https://api.anthropic.com/v1"));
    assert_eq!(claude.api_key_env(), Some("ANTHROPIC_API_KEY"));
    assert_eq!(claude.model(), Some("claude-3-5-haiku-latest"));

    let policy = config.retry.to_policy().unwrap();
    assert_eq!(policy.max_attempts(), 4);
    assert_eq!(policy.delay_before_retry(2), Duration::from_millis(750));
}

#[test]
fn test_router_from_config_skips_disabled_providers() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "prabhai.yml", FULL_YAML);

    let router = Router::load(&path).unwrap();
    let table = router.table();

    assert_eq!(table.provider_names(Capability::Llm), vec!["groq-llm", "claude-llm"]);
    assert_eq!(table.provider_names(Capability::Tts), vec!["gemini-tts", "openai-tts"]);
    assert_eq!(table.provider_names(Capability::Stt), vec!["groq-whisper"]);
    assert!(!table.is_configured(Capability::Vision));
    assert_eq!(router.policy().max_attempts(), 4);
}

#[test]
fn test_load_json_config() {
    let json = r#"{
        "version": "0.1",
        "providers": [
            {"name": "gpt-vision", "kind": "openai", "capability": "vision"}
        ],
        "routing": {"vision": ["gpt-vision"]}
    }"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "prabhai.json", json);

    let config = load_from_json(&path).unwrap();
    assert_eq!(config.providers[0].capability, Capability::Vision);
    assert_eq!(config.providers[0].model(), Some("gpt-4o-mini"));

    // Extension-based loading picks the same parser.
    assert_eq!(load_from_path(&path).unwrap().providers.len(), 1);
}

#[test]
fn test_env_var_interpolation() {
    std::env::set_var("PRABHAI_TEST_GROQ_BASE", "https://proxy.internal/groq/v1");
    let yaml = r#"
version: "0.1"
providers:
  - name: groq-llm
    kind: openai
    capability: llm
    base_url: ${PRABHAI_TEST_GROQ_BASE}
    model: ${PRABHAI_TEST_UNSET_MODEL:-llama-3.1-8b-instant}
routing:
  llm: [groq-llm]
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "interp.yaml", yaml);

    let config = load_from_yaml(&path).unwrap();
    let provider = config.provider("groq-llm").unwrap();
    assert_eq!(provider.base_url(), Some("https://proxy.internal/groq/v1"));
    assert_eq!(provider.model(), Some("llama-3.1-8b-instant"));
}

#[test]
fn test_missing_env_var_is_reported() {
    let yaml = r#"
version: "0.1"
providers:
  - name: groq-llm
    kind: openai
    capability: llm
    base_url: ${PRABHAI_TEST_DEFINITELY_UNSET}
routing:
  llm: [groq-llm]
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "missing.yaml", yaml);

    match load_from_yaml(&path) {
        Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "PRABHAI_TEST_DEFINITELY_UNSET"),
        other => panic!("expected EnvVarNotFound, got {:?}", other),
    }
}

#[test]
fn test_routing_to_unknown_provider_is_rejected() {
    let yaml = r#"
version: "0.1"
providers:
  - name: groq-llm
    kind: openai
    capability: llm
routing:
  llm: [groq-llm, mistral]
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "unknown.yaml", yaml);

    match load_from_yaml(&path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "routing.llm[1]");
            assert_eq!(
                e.kind,
                ValidationErrorKind::UnknownReference {
                    name: "mistral".into()
                }
            );
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_capability_mismatch_in_routing_is_rejected() {
    let yaml = r#"
version: "0.1"
providers:
  - name: openai-tts
    kind: openai
    capability: tts
routing:
  llm: [openai-tts]
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "mismatch.yaml", yaml);

    assert!(matches!(
        load_from_yaml(&path),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_anthropic_speech_is_rejected() {
    let yaml = r#"
version: "0.1"
providers:
  - name: claude-tts
    kind: anthropic
    capability: tts
routing:
  tts: [claude-tts]
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "claude-tts.yaml", yaml);

    assert!(matches!(
        load_from_yaml(&path),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_invalid_retry_policy_is_rejected() {
    let yaml = r#"
version: "0.1"
retry:
  max_attempts: 0
providers:
  - name: groq-llm
    kind: openai
    capability: llm
routing:
  llm: [groq-llm]
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "retry.yaml", yaml);

    assert!(load_from_yaml(&path).is_err());
}

#[test]
fn test_router_load_surfaces_config_errors() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.yaml");

    assert!(matches!(
        Router::load(&missing),
        Err(RoutingTableError::Config(ConfigError::IoError { .. }))
    ));
}

fn code_built_config() -> PrabhaiConfig {
    from_yaml_str(
        r#"
version: "0.1"
providers:
  - name: groq-llm
    kind: openai
    capability: llm
    base_url: https://api.groq.com/openai/v1
    model: llama-3.1-8b-instant
    api_key_env: GROQ_API_KEY
routing:
  llm: [groq-llm]
"#,
    )
    .unwrap()
}

fn assert_router_rejects(config: &PrabhaiConfig, field_path: &str) {
    match Router::from_config(config) {
        Err(RoutingTableError::Config(ConfigError::ValidationError(e))) => {
            assert_eq!(e.field_path, field_path)
        }
        Err(other) => panic!("expected validation error, got {:?}", other),
        Ok(_) => panic!("expected {} to be rejected", field_path),
    }
}

#[test]
fn test_router_from_config_accepts_valid_code_built_config() {
    let router = Router::from_config(&code_built_config()).unwrap();
    assert_eq!(router.table().provider_names(Capability::Llm), vec!["groq-llm"]);
}

#[test]
fn test_router_from_config_rejects_zero_request_timeout() {
    let mut config = code_built_config();
    config.connection.request_timeout_ms = 0;
    assert_router_rejects(&config, "connection.request_timeout_ms");
}

#[test]
fn test_router_from_config_rejects_duplicate_provider_names() {
    let mut config = code_built_config();
    let duplicate = config.providers[0].clone();
    config.providers.push(duplicate);

    assert!(matches!(
        Router::from_config(&config),
        Err(RoutingTableError::Config(ConfigError::ValidationError(ref e)))
            if matches!(e.kind, ValidationErrorKind::DuplicateValue { .. })
    ));
}

#[test]
fn test_router_from_config_rejects_bad_base_url() {
    let mut config = code_built_config();
    config.providers[0].base_url = Some("ftp://api.groq.com".into());
    assert_router_rejects(&config, "providers[0].base_url");
}

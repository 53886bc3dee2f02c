//! End-to-end dispatch tests over the real tool catalog.
//!
//! The platform base URL points at a closed local port, so every vendor
//! call fails fast at the transport. That exercises the declared failure
//! contracts: eval and dataset tools answer with an `{"error": ...}`
//! payload, protect surfaces a handler failure, and validation rejections
//! never reach the network at all.

use std::io::Write;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::NamedTempFile;

use evalgate::config::Credentials;
use evalgate::registry::ToolRegistry;
use evalgate::tools::catalog;

fn unreachable_catalog() -> Arc<ToolRegistry> {
    let creds = Credentials {
        api_key: "test-key".into(),
        secret_key: "test-secret".into(),
        // Nothing listens here; connections are refused immediately.
        base_url: "http://127.0.0.1:1".into(),
    };
    Arc::new(catalog(&creds).unwrap())
}

async fn call(registry: &ToolRegistry, tool: &str, args: Value) -> (String, bool) {
    let result = registry.execute(tool, &args).await;
    let response = result.normalize(tool);
    (response.content, response.is_error)
}

#[tokio::test]
async fn evaluate_on_collaborator_failure_returns_error_payload() {
    let registry = unreachable_catalog();
    let (content, is_error) = call(
        &registry,
        "evaluate",
        json!({
            "eval_templates": [
                {"eval_id": "1", "config": {"criteria": "Test criteria", "model": "gpt-4o"}}
            ],
            "inputs": [
                {"text": "Test input 1", "output": "Test output 1", "criteria": "Test criteria"}
            ],
        }),
    )
    .await;

    // Vendor failures come back as data, not as a failed call.
    assert!(!is_error);
    let payload: Value = serde_json::from_str(&content).unwrap();
    assert!(payload.get("error").is_some());
}

#[tokio::test]
async fn evaluate_rejects_malformed_templates_before_dispatch() {
    let registry = unreachable_catalog();
    let (content, is_error) = call(
        &registry,
        "evaluate",
        json!({"eval_templates": [{"config": {}}], "inputs": []}),
    )
    .await;

    assert!(is_error);
    assert!(content.contains("eval_templates[0].eval_id"));
}

#[tokio::test]
async fn upload_dataset_with_nonexistent_source_still_reaches_the_platform() {
    let registry = unreachable_catalog();
    let (content, is_error) = call(
        &registry,
        "upload_dataset",
        json!({
            "dataset_name": "missing_source_ds",
            "model_type": "GenerativeLLM",
            "source": "/no/such/file.csv",
        }),
    )
    .await;

    // The missing file falls back to an empty create; the only failure
    // left is the unreachable platform, reported as an error payload.
    assert!(!is_error);
    let payload: Value = serde_json::from_str(&content).unwrap();
    assert!(payload.get("error").is_some());
}

#[tokio::test]
async fn upload_dataset_with_existing_source_reads_the_file() {
    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(tmp, "input,output\nWhat is 2+2?,4").unwrap();

    let registry = unreachable_catalog();
    let (content, is_error) = call(
        &registry,
        "upload_dataset",
        json!({
            "dataset_name": "seeded_ds",
            "model_type": "GenerativeLLM",
            "source": tmp.path().to_str().unwrap(),
        }),
    )
    .await;

    assert!(!is_error);
    let payload: Value = serde_json::from_str(&content).unwrap();
    assert!(payload.get("error").is_some());
}

#[tokio::test]
async fn add_evaluation_to_dataset_applies_column_defaults() {
    let registry = unreachable_catalog();
    let (content, is_error) = call(
        &registry,
        "add_evaluation_to_dataset",
        json!({
            "dataset_name": "rag_chat_eval_dataset",
            "name": "adherence_eval_final",
            "eval_id": "5",
            "output_column_name": "response_best_model",
            "context_column_name": "RAG_documents",
        }),
    )
    .await;

    assert!(!is_error);
    let payload: Value = serde_json::from_str(&content).unwrap();
    assert!(payload.get("error").is_some());
}

#[tokio::test]
async fn protect_handler_failure_surfaces_as_error_response() {
    let registry = unreachable_catalog();
    let (content, is_error) = call(
        &registry,
        "protect",
        json!({
            "inputs": "hello there",
            "protect_rules": [{"metric": "Toxicity"}],
        }),
    )
    .await;

    // protect propagates vendor failures instead of wrapping them.
    assert!(is_error);
    assert!(content.starts_with("Error executing tool protect:"));
}

#[tokio::test]
async fn protect_tone_rule_without_contains_fails_validation() {
    let registry = unreachable_catalog();
    let (content, is_error) = call(
        &registry,
        "protect",
        json!({
            "inputs": "hello",
            "protect_rules": [{"metric": "Tone"}],
        }),
    )
    .await;

    assert!(is_error);
    assert!(content.contains("contains"));
    assert!(content.contains("required when metric"));
}

#[tokio::test]
async fn protect_contains_on_toxicity_fails_validation() {
    let registry = unreachable_catalog();
    let (_, is_error) = call(
        &registry,
        "protect",
        json!({
            "inputs": "hello",
            "protect_rules": [{"metric": "Toxicity", "contains": ["joy"]}],
        }),
    )
    .await;

    assert!(is_error);
}

#[tokio::test]
async fn protect_type_all_outside_tone_fails_validation() {
    let registry = unreachable_catalog();
    let (content, is_error) = call(
        &registry,
        "protect",
        json!({
            "inputs": "hello",
            "protect_rules": [{"metric": "Sexism", "type": "all"}],
        }),
    )
    .await;

    assert!(is_error);
    assert!(content.contains("type"));
}

#[tokio::test]
async fn unknown_tool_yields_error_response_without_network() {
    let registry = unreachable_catalog();
    let (content, is_error) = call(&registry, "nonexistent", json!({})).await;

    assert!(is_error);
    assert_eq!(
        content,
        "Error executing tool nonexistent: unknown tool: nonexistent"
    );
}

#[tokio::test]
async fn validating_twice_yields_identical_calls() {
    let registry = unreachable_catalog();
    let raw = json!({
        "inputs": "same input",
        "protect_rules": [{"metric": "Tone", "contains": ["joy"]}],
        "timeout": 5000,
    });

    let first = registry.validate("protect", &raw).unwrap();
    let second = registry.validate("protect", &raw).unwrap();
    assert_eq!(first, second);

    // Defaults resolved during validation, including inside nested rules.
    assert_eq!(first.args()["protect_rules"][0]["type"], json!("any"));
    assert_eq!(first.args()["reason"], json!(false));
}

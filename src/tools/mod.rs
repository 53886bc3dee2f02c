//! Tool catalog: the operations exposed over MCP.
//!
//! Each tool owns its descriptor (name, description, typed schema) and a
//! handler that calls one platform adapter. The catalog is assembled once
//! at startup; handlers receive arguments the validator has already
//! resolved, so extraction here is a formality kept defensive anyway.

pub mod datasets;
pub mod evals;
pub mod protect;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};
use tracing::error;

use crate::config::Credentials;
use crate::platform::{DatasetApi, EvalApi, PlatformClient, ProtectApi};
use crate::registry::{RegistryError, ToolRegistry};

/// Build the process-wide registry with every tool bound to its platform
/// adapter.
pub fn catalog(creds: &Credentials) -> Result<ToolRegistry, RegistryError> {
    let client = PlatformClient::new(creds);
    let eval_api = EvalApi::new(client.clone());
    let dataset_api = DatasetApi::new(client.clone());
    let protect_api = ProtectApi::new(client);

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(evals::GetEvalStructure::new(eval_api.clone())))?;
    registry.register(Arc::new(evals::GetEvalsListForCreateEval::new(
        eval_api.clone(),
    )))?;
    registry.register(Arc::new(evals::CreateEval::new(eval_api.clone())))?;
    registry.register(Arc::new(evals::Evaluate::new(eval_api.clone())))?;
    registry.register(Arc::new(evals::AllEvaluators::new(eval_api)))?;
    registry.register(Arc::new(datasets::UploadDataset::new(dataset_api.clone())))?;
    registry.register(Arc::new(datasets::AddEvaluationToDataset::new(dataset_api)))?;
    registry.register(Arc::new(protect::Protect::new(protect_api)))?;
    Ok(registry)
}

// ---------------------------------------------------------------------------
// Argument extraction helpers
// ---------------------------------------------------------------------------

pub(crate) fn required_str<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Missing '{}' argument", name))
}

pub(crate) fn required_array<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a [Value]> {
    args.get(name)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| anyhow!("Missing '{}' argument", name))
}

/// Optional string argument; absent and explicit-null both read as "".
pub(crate) fn str_or_empty<'a>(args: &'a Map<String, Value>, name: &str) -> &'a str {
    args.get(name).and_then(Value::as_str).unwrap_or("")
}

/// Optional boolean argument; absent and explicit-null both read as the
/// given fallback.
pub(crate) fn bool_or(args: &Map<String, Value>, name: &str, fallback: bool) -> bool {
    args.get(name).and_then(Value::as_bool).unwrap_or(fallback)
}

pub(crate) fn u64_or(args: &Map<String, Value>, name: &str, fallback: u64) -> u64 {
    args.get(name).and_then(Value::as_u64).unwrap_or(fallback)
}

/// Optional object argument; absent and explicit-null both read as `{}`.
pub(crate) fn object_or_empty(args: &Map<String, Value>, name: &str) -> Value {
    match args.get(name) {
        Some(value) if value.is_object() => value.clone(),
        _ => json!({}),
    }
}

/// Fold a platform failure into the `{"error": ...}` payload the eval and
/// dataset tools return as a normal (non-error) result.
pub(crate) fn vendor_error(tool: &str, err: anyhow::Error) -> Value {
    error!(tool, "platform call failed: {err:#}");
    json!({"error": err.to_string()})
}

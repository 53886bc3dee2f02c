//! Content-safety tool: rule checks against a single input.
//!
//! Unlike the eval and dataset tools, a platform failure here propagates
//! to the dispatcher and comes back as an error response: a safety check
//! that cannot run must not read as a passing one.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{bool_or, required_array, required_str, str_or_empty, u64_or};
use crate::platform::ProtectApi;
use crate::registry::Tool;
use crate::schema::{Field, FieldKind, ParamSchema};

/// Message returned in place of the input when a rule fails and the caller
/// supplied no action.
pub const DEFAULT_ACTION: &str =
    "Response cannot be generated as the input fails the checks";

/// Default evaluation deadline, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const METRICS: &[&str] = &["Toxicity", "Tone", "Sexism", "Prompt Injection", "Data Privacy"];

const TONES: &[&str] = &[
    "neutral",
    "joy",
    "love",
    "fear",
    "surprise",
    "sadness",
    "anger",
    "annoyance",
    "confusion",
];

/// Evaluate an input string against protection rules.
pub struct Protect {
    api: ProtectApi,
    schema: ParamSchema,
}

impl Protect {
    pub fn new(api: ProtectApi) -> Self {
        let rule = ParamSchema::new()
            .field(
                Field::required("metric", FieldKind::StrEnum(METRICS))
                    .describe("Name of the metric to evaluate"),
            )
            .field(
                Field::optional("contains", FieldKind::List(Box::new(FieldKind::StrEnum(TONES))))
                    .required_when("metric", "Tone")
                    .describe("Tones to match; required for the Tone metric only"),
            )
            .field(
                Field::optional("type", FieldKind::StrEnum(&["any", "all"]))
                    .with_default(json!("any"))
                    .allowed_when("metric", "Tone")
                    .describe("Whether any or all listed tones must match; Tone metric only"),
            );

        Self {
            api,
            schema: ParamSchema::new()
                .field(Field::required("inputs", FieldKind::Str).describe(
                    "String to evaluate: text, or an image/audio file path or URL",
                ))
                .field(
                    Field::required(
                        "protect_rules",
                        FieldKind::List(Box::new(FieldKind::Object(rule))),
                    )
                    .describe("Protection rules to apply, evaluated in order"),
                )
                .field(
                    Field::optional("action", FieldKind::Str)
                        .with_default(json!(DEFAULT_ACTION))
                        .describe("Message substituted for the input when a rule fails"),
                )
                .field(
                    Field::optional("reason", FieldKind::Bool)
                        .with_default(json!(false))
                        .describe("Include the failure reason in the output"),
                )
                .field(
                    Field::optional("timeout", FieldKind::Int)
                        .with_default(json!(DEFAULT_TIMEOUT_MS))
                        .describe("Evaluation deadline in milliseconds"),
                ),
        }
    }

    /// Rewrite the verdict's message to the caller's action string when a
    /// rule failed, appending the vendor reason when requested.
    fn apply_action(mut verdict: Value, action: &str, want_reason: bool) -> Value {
        let failed = verdict.get("status").and_then(Value::as_str) == Some("failed");
        if failed {
            let message = match verdict.get("reason").and_then(Value::as_str) {
                Some(reason) if want_reason => format!("{action}. Reason: {reason}"),
                _ => action.to_string(),
            };
            if let Some(object) = verdict.as_object_mut() {
                object.insert("messages".into(), json!(message));
            }
        }
        verdict
    }
}

#[async_trait]
impl Tool for Protect {
    fn name(&self) -> &str {
        "protect"
    }

    fn description(&self) -> &str {
        "Evaluate an input string against protection rules (toxicity, tone, \
         sexism, prompt injection, data privacy). Returns the verdict, the \
         rules completed, and the failed rule if any."
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let inputs = required_str(&args, "inputs")?;
        let rules = required_array(&args, "protect_rules")?;
        let action = match str_or_empty(&args, "action") {
            "" => DEFAULT_ACTION,
            action => action,
        };
        let want_reason = bool_or(&args, "reason", false);
        let timeout_ms = u64_or(&args, "timeout", DEFAULT_TIMEOUT_MS);

        let verdict = self
            .api
            .check(inputs, rules, action, want_reason, timeout_ms)
            .await?;

        Ok(Self::apply_action(verdict, action, want_reason))
    }
}

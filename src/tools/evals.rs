//! Evaluation tools: template discovery, template creation, and batch
//! evaluation runs.
//!
//! These tools fold platform failures into an `{"error": ...}` payload
//! instead of failing the call, so a vendor outage reads as data the
//! model can react to rather than a dead tool.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{object_or_empty, required_array, required_str, vendor_error};
use crate::platform::EvalApi;
use crate::registry::Tool;
use crate::schema::{Field, FieldKind, ParamSchema};

// ---------------------------------------------------------------------------
// get_eval_structure
// ---------------------------------------------------------------------------

/// Fetch the structure of an evaluation template by its UUID: required and
/// optional input keys, output format, and configuration parameters.
pub struct GetEvalStructure {
    api: EvalApi,
    schema: ParamSchema,
}

impl GetEvalStructure {
    pub fn new(api: EvalApi) -> Self {
        Self {
            api,
            schema: ParamSchema::new().field(
                Field::required("template_id", FieldKind::Str)
                    .describe("UUID of the evaluation template"),
            ),
        }
    }
}

#[async_trait]
impl Tool for GetEvalStructure {
    fn name(&self) -> &str {
        "get_eval_structure"
    }

    fn description(&self) -> &str {
        "Get the structure of an evaluation template using its template_id: \
         name, description, tags, required and optional input keys, output \
         format, and config parameters."
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let template_id = required_str(&args, "template_id")?;
        match self.api.template_structure(template_id).await {
            Ok(structure) => Ok(structure),
            Err(err) => Ok(vendor_error(self.name(), err)),
        }
    }
}

// ---------------------------------------------------------------------------
// get_evals_list_for_create_eval
// ---------------------------------------------------------------------------

/// List the evaluation templates usable as a base for creating new
/// evaluations.
pub struct GetEvalsListForCreateEval {
    api: EvalApi,
    schema: ParamSchema,
}

impl GetEvalsListForCreateEval {
    pub fn new(api: EvalApi) -> Self {
        Self {
            api,
            schema: ParamSchema::new().field(
                Field::required("eval_type", FieldKind::StrEnum(&["preset", "user"])).describe(
                    "'preset' for built-in templates, 'user' for custom templates",
                ),
            ),
        }
    }
}

#[async_trait]
impl Tool for GetEvalsListForCreateEval {
    fn name(&self) -> &str {
        "get_evals_list_for_create_eval"
    }

    fn description(&self) -> &str {
        "List available evaluation templates for creating new evaluations. \
         Not for adding existing evaluations to datasets."
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let eval_type = required_str(&args, "eval_type")?;
        match self.api.list_templates(eval_type).await {
            Ok(templates) => Ok(templates),
            Err(err) => Ok(vendor_error(self.name(), err)),
        }
    }
}

// ---------------------------------------------------------------------------
// create_eval
// ---------------------------------------------------------------------------

/// Create a new evaluation template from an existing base template.
pub struct CreateEval {
    api: EvalApi,
    schema: ParamSchema,
}

impl CreateEval {
    pub fn new(api: EvalApi) -> Self {
        Self {
            api,
            schema: ParamSchema::new()
                .field(
                    Field::required("eval_name", FieldKind::Str)
                        .describe("Name for the new evaluation template"),
                )
                .field(
                    Field::required("template_id", FieldKind::Str)
                        .describe("UUID of the base evaluation template"),
                )
                .field(Field::required("config", FieldKind::Map).describe(
                    "Template configuration: mapping of required fields with \
                     example values, template-specific config, and model name",
                )),
        }
    }
}

#[async_trait]
impl Tool for CreateEval {
    fn name(&self) -> &str {
        "create_eval"
    }

    fn description(&self) -> &str {
        "Create a new evaluation template based on an existing one. Fetch \
         the base list with get_evals_list_for_create_eval and the structure \
         with get_eval_structure first, then build the config from them."
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let eval_name = required_str(&args, "eval_name")?;
        let template_id = required_str(&args, "template_id")?;
        let config = object_or_empty(&args, "config");

        match self.api.create_template(eval_name, template_id, &config).await {
            Ok(created) => Ok(created),
            Err(err) => Ok(vendor_error(self.name(), err)),
        }
    }
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

/// Run evaluation templates against a batch of test-case inputs.
pub struct Evaluate {
    api: EvalApi,
    schema: ParamSchema,
}

impl Evaluate {
    pub fn new(api: EvalApi) -> Self {
        let template = ParamSchema::new()
            .field(
                Field::required("eval_id", FieldKind::Str)
                    .describe("Numeric id of the eval template, as a string"),
            )
            .field(
                Field::optional("config", FieldKind::Map)
                    .with_default(json!({}))
                    .describe("Optional criteria/model configuration"),
            );

        Self {
            api,
            schema: ParamSchema::new()
                .field(
                    Field::required(
                        "eval_templates",
                        FieldKind::List(Box::new(FieldKind::Object(template))),
                    )
                    .describe("Evaluations to run; find eval_id via all_evaluators"),
                )
                .field(
                    Field::required("inputs", FieldKind::List(Box::new(FieldKind::Map)))
                        .describe(
                            "Test cases; each carries the input keys its eval \
                             template requires (text, output, criteria, ...)",
                        ),
                ),
        }
    }
}

#[async_trait]
impl Tool for Evaluate {
    fn name(&self) -> &str {
        "evaluate"
    }

    fn description(&self) -> &str {
        "Evaluate a batch of test-case inputs against eval templates. Fetch \
         evaluators with all_evaluators first and take eval_id from there; \
         each input must contain the fields its template requires."
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let templates = required_array(&args, "eval_templates")?;
        let inputs = required_array(&args, "inputs")?;

        // The wire template carries the effective config nested one level
        // down; flatten it for the run request.
        let specs: Vec<Value> = templates
            .iter()
            .map(|t| {
                let eval_id = t.get("eval_id").cloned().unwrap_or_default();
                let config = t
                    .get("config")
                    .and_then(|c| c.get("config"))
                    .cloned()
                    .unwrap_or_else(|| json!({}));
                json!({"eval_id": eval_id, "config": config})
            })
            .collect();

        match self.api.run_evaluation(&specs, inputs).await {
            Ok(results) => Ok(results),
            Err(err) => Ok(vendor_error(self.name(), err)),
        }
    }
}

// ---------------------------------------------------------------------------
// all_evaluators
// ---------------------------------------------------------------------------

/// Fetch every evaluator with its configuration, custom evaluators first.
pub struct AllEvaluators {
    api: EvalApi,
    schema: ParamSchema,
}

impl AllEvaluators {
    pub fn new(api: EvalApi) -> Self {
        Self {
            api,
            schema: ParamSchema::new(),
        }
    }

    /// Order evaluators so CUSTOM-tagged entries come first; the rest keep
    /// their server order.
    fn sort_custom_first(evaluators: &mut [Value]) {
        evaluators.sort_by_key(|evaluator| {
            let custom = evaluator
                .get("eval_tags")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().any(|t| t.as_str() == Some("CUSTOM")))
                .unwrap_or(false);
            !custom
        });
    }
}

#[async_trait]
impl Tool for AllEvaluators {
    fn name(&self) -> &str {
        "all_evaluators"
    }

    fn description(&self) -> &str {
        "Get all evaluators and their configurations, custom evaluators \
         listed first. Use the eval_id field of an entry when calling \
         evaluate."
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn invoke(&self, _args: Map<String, Value>) -> Result<Value> {
        match self.api.list_evaluators().await {
            Ok(Value::Array(mut evaluators)) => {
                Self::sort_custom_first(&mut evaluators);
                Ok(Value::Array(evaluators))
            }
            Ok(other) => Ok(other),
            Err(err) => Ok(vendor_error(self.name(), err)),
        }
    }
}

//! Evaluation-engine adapter: evaluator catalog, template structure and
//! listing, template creation, and batch evaluation runs.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use super::client::PlatformClient;

const EVALUATORS: &str = "/api/v1/evaluators";
const TEMPLATES_LIST: &str = "/api/v1/eval-templates/list";
const RUN_EVAL: &str = "/api/v1/evals/run";
const EVALUATE: &str = "/api/v1/evals/evaluate";

/// Client for the vendor evaluation engine.
#[derive(Debug, Clone)]
pub struct EvalApi {
    client: PlatformClient,
}

// -- Request types ----------------------------------------------------------

#[derive(Debug, Serialize)]
struct StructureRequest<'a> {
    eval_type: &'a str,
}

#[derive(Debug, Serialize)]
struct TemplatesListRequest<'a> {
    eval_type: &'a str,
    search_text: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTemplateRequest<'a> {
    template_id: &'a str,
    is_run: bool,
    #[serde(rename = "saveAsTemplate")]
    save_as_template: bool,
    log_ids: [&'a str; 0],
    name: &'a str,
    config: &'a Value,
}

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    eval_templates: &'a [Value],
    inputs: &'a [Value],
}

impl EvalApi {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    /// Fetch all evaluators with their configurations.
    pub async fn list_evaluators(&self) -> Result<Value> {
        self.client.get_json(EVALUATORS).await
    }

    /// Fetch the structure of one evaluation template.
    pub async fn template_structure(&self, template_id: &str) -> Result<Value> {
        let path = format!("/api/v1/eval-templates/{template_id}/structure");
        self.client
            .post_json(&path, &StructureRequest { eval_type: "preset" })
            .await
    }

    /// List evaluation templates of the given type ("preset" or "user").
    pub async fn list_templates(&self, eval_type: &str) -> Result<Value> {
        self.client
            .post_json(
                TEMPLATES_LIST,
                &TemplatesListRequest {
                    eval_type,
                    search_text: "",
                },
            )
            .await
    }

    /// Create a new template from a base template. Saved as a template,
    /// not executed (is_run stays false).
    pub async fn create_template(
        &self,
        name: &str,
        template_id: &str,
        config: &Value,
    ) -> Result<Value> {
        self.client
            .post_json(
                RUN_EVAL,
                &CreateTemplateRequest {
                    template_id,
                    is_run: false,
                    save_as_template: true,
                    log_ids: [],
                    name,
                    config,
                },
            )
            .await
    }

    /// Run the given templates against a batch of test cases.
    pub async fn run_evaluation(
        &self,
        eval_templates: &[Value],
        inputs: &[Value],
    ) -> Result<Value> {
        self.client
            .post_json(
                EVALUATE,
                &EvaluateRequest {
                    eval_templates,
                    inputs,
                },
            )
            .await
    }
}

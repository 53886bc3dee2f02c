//! Dataset tools: dataset upload and evaluation-column wiring.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::Path;

use super::{bool_or, object_or_empty, required_str, str_or_empty, vendor_error};
use crate::platform::{ColumnMapping, DatasetApi};
use crate::registry::Tool;
use crate::schema::{Field, FieldKind, ParamSchema};

// ---------------------------------------------------------------------------
// upload_dataset
// ---------------------------------------------------------------------------

/// Create a dataset on the platform, seeded from a local file when one
/// exists at the given source path.
pub struct UploadDataset {
    api: DatasetApi,
    schema: ParamSchema,
}

impl UploadDataset {
    pub fn new(api: DatasetApi) -> Self {
        Self {
            api,
            schema: ParamSchema::new()
                .field(
                    Field::required("dataset_name", FieldKind::Str)
                        .describe("Name of the dataset to create"),
                )
                .field(
                    Field::required("model_type", FieldKind::Str)
                        .describe("Model type, e.g. \"GenerativeLLM\" or \"GenerativeImage\""),
                )
                .field(Field::required("source", FieldKind::Str).describe(
                    "Local file path to seed the dataset from; a path that \
                     does not exist creates an empty dataset",
                )),
        }
    }

    /// Resolve the source argument to a readable local path, if any.
    ///
    /// A missing file is not an error: the declared fallback is to create
    /// the dataset empty.
    fn source_path(source: &str) -> Option<&Path> {
        let path = Path::new(source);
        (!source.is_empty() && path.exists()).then_some(path)
    }
}

#[async_trait]
impl Tool for UploadDataset {
    fn name(&self) -> &str {
        "upload_dataset"
    }

    fn description(&self) -> &str {
        "Create a dataset on the evaluation platform, uploading rows from a \
         local file when the source path exists. Returns the new dataset id."
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let dataset_name = required_str(&args, "dataset_name")?;
        let model_type = required_str(&args, "model_type")?;
        let source = required_str(&args, "source")?;

        let result = self
            .api
            .create(dataset_name, model_type, Self::source_path(source))
            .await;

        match result {
            Ok(created) => match created.get("id").filter(|id| !id.is_null()) {
                Some(id) => {
                    let id = id
                        .as_str()
                        .map(String::from)
                        .unwrap_or_else(|| id.to_string());
                    Ok(json!({"status": "success", "dataset_id": id}))
                }
                None => Ok(json!({"error": "Dataset creation/upload failed unexpectedly."})),
            },
            Err(err) => Ok(vendor_error(self.name(), err)),
        }
    }
}

// ---------------------------------------------------------------------------
// add_evaluation_to_dataset
// ---------------------------------------------------------------------------

/// Attach an existing evaluation as a new column on a dataset.
pub struct AddEvaluationToDataset {
    api: DatasetApi,
    schema: ParamSchema,
}

impl AddEvaluationToDataset {
    pub fn new(api: DatasetApi) -> Self {
        Self {
            api,
            schema: ParamSchema::new()
                .field(
                    Field::required("dataset_name", FieldKind::Str)
                        .describe("Dataset to attach the evaluation to"),
                )
                .field(
                    Field::required("name", FieldKind::Str)
                        .describe("Name for the new evaluation column"),
                )
                .field(
                    Field::required("eval_id", FieldKind::Str)
                        .describe("Id of the evaluation to run over the dataset"),
                )
                .field(
                    Field::optional("input_column_name", FieldKind::Str)
                        .with_default(json!(""))
                        .describe("Dataset column bound to the eval's input key"),
                )
                .field(
                    Field::optional("output_column_name", FieldKind::Str)
                        .with_default(json!(""))
                        .describe("Dataset column bound to the eval's output key"),
                )
                .field(
                    Field::optional("context_column_name", FieldKind::Str)
                        .with_default(json!(""))
                        .describe("Dataset column bound to the eval's context key"),
                )
                .field(
                    Field::optional("expected_column_name", FieldKind::Str)
                        .with_default(json!(""))
                        .describe("Dataset column bound to the eval's expected key"),
                )
                .field(
                    Field::optional("save_as_template", FieldKind::Bool)
                        .with_default(json!(false)),
                )
                .field(
                    Field::optional("reason_column", FieldKind::Bool)
                        .with_default(json!(false))
                        .describe("Also add a column with the evaluation reasoning"),
                )
                .field(
                    Field::optional("config", FieldKind::Map)
                        .with_default(json!({}))
                        .describe("Extra evaluation configuration"),
                ),
        }
    }
}

#[async_trait]
impl Tool for AddEvaluationToDataset {
    fn name(&self) -> &str {
        "add_evaluation_to_dataset"
    }

    fn description(&self) -> &str {
        "Add an evaluation as a new column on an existing dataset, mapping \
         the eval's input keys to dataset columns."
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let dataset_name = required_str(&args, "dataset_name")?;
        let column_name = required_str(&args, "name")?;
        let eval_id = required_str(&args, "eval_id")?;
        let config = object_or_empty(&args, "config");

        let mapping = ColumnMapping {
            input: str_or_empty(&args, "input_column_name"),
            output: str_or_empty(&args, "output_column_name"),
            context: str_or_empty(&args, "context_column_name"),
            expected: str_or_empty(&args, "expected_column_name"),
        };

        let result = self
            .api
            .add_evaluation_column(
                dataset_name,
                column_name,
                eval_id,
                mapping,
                bool_or(&args, "save_as_template", false),
                bool_or(&args, "reason_column", false),
                &config,
            )
            .await;

        match result {
            Ok(status) => Ok(status),
            Err(err) => Ok(vendor_error(self.name(), err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn existing_source_resolves_to_a_path() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "input,output\na,b").unwrap();

        let source = tmp.path().to_str().unwrap();
        assert_eq!(UploadDataset::source_path(source), Some(tmp.path()));
    }

    #[test]
    fn nonexistent_source_falls_back_to_empty_create() {
        assert_eq!(UploadDataset::source_path("/no/such/file.csv"), None);
        assert_eq!(UploadDataset::source_path(""), None);
    }
}

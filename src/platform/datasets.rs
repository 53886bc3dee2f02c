//! Dataset-store adapter: dataset creation and evaluation-column wiring.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::client::PlatformClient;

const DATASETS: &str = "/api/v1/datasets";

/// Client for the vendor dataset store.
#[derive(Debug, Clone)]
pub struct DatasetApi {
    client: PlatformClient,
}

// -- Request types ----------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateDatasetRequest<'a> {
    name: &'a str,
    model_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows_csv: Option<String>,
}

/// Mapping from evaluation input keys to dataset column names. Empty
/// strings mean "no column bound for this key".
#[derive(Debug, Serialize)]
pub struct ColumnMapping<'a> {
    pub input: &'a str,
    pub output: &'a str,
    pub context: &'a str,
    pub expected: &'a str,
}

#[derive(Debug, Serialize)]
struct AddEvaluationRequest<'a> {
    name: &'a str,
    eval_id: &'a str,
    column_mapping: ColumnMapping<'a>,
    save_as_template: bool,
    reason_column: bool,
    config: &'a Value,
}

impl DatasetApi {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    /// Create a dataset, optionally seeded from a local CSV file.
    ///
    /// The returned document carries the created dataset's `id`.
    pub async fn create(
        &self,
        name: &str,
        model_type: &str,
        source: Option<&Path>,
    ) -> Result<Value> {
        let rows_csv = match source {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read dataset source {}", path.display()))?,
            ),
            None => None,
        };

        self.client
            .post_json(
                DATASETS,
                &CreateDatasetRequest {
                    name,
                    model_type,
                    rows_csv,
                },
            )
            .await
    }

    /// Attach an evaluation as a new column on an existing dataset.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_evaluation_column(
        &self,
        dataset_name: &str,
        column_name: &str,
        eval_id: &str,
        mapping: ColumnMapping<'_>,
        save_as_template: bool,
        reason_column: bool,
        config: &Value,
    ) -> Result<Value> {
        let path = format!("{DATASETS}/{dataset_name}/evaluations");
        self.client
            .post_json(
                &path,
                &AddEvaluationRequest {
                    name: column_name,
                    eval_id,
                    column_mapping: mapping,
                    save_as_template,
                    reason_column,
                    config,
                },
            )
            .await
    }
}

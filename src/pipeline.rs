//! The canvas → hypotheses → experiments stages.
//!
//! Every stage persists what it produced under the project's id; the later
//! stages fall back to the stored output of the previous one when the caller
//! does not supply it.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, Span, info, info_span};
use uuid::Uuid;

use crate::agents::{self, AgentError, CanvasInput, ExperimentInput, HypothesisInput, JsonObject};
use crate::core::StoreError;
use crate::json::denormalize;
use crate::llm::TextModel;
use crate::warehouse::{TableSpec, UpsertFailure, UpsertReport, Warehouse};

pub const PROJECTS_TABLE: &str = "Projects";
pub const BMC_TABLE: &str = "BMC";
pub const HYPOTHESES_TABLE: &str = "Hypotheses";
pub const EXPERIMENTS_TABLE: &str = "Experiments";

/// Key attached to every stored artifact; sanitized to [`IDENTIFIER_COLUMN`].
pub const PROJECT_ID_KEY: &str = "project-id";
pub const IDENTIFIER_COLUMN: &str = "project_id";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No {table} data found for project_id {project_id}")]
    MissingUpstream { table: String, project_id: ProjectId },

    #[error("Failed to persist {table}: {} row(s) rejected", .errors.len())]
    Persistence {
        table: String,
        errors: Vec<UpsertFailure>,
    },
}

/// Project identifier. Accepted as a JSON string or integer, stored as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawProjectId", into = "String")]
pub struct ProjectId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProjectId {
    Text(String),
    Number(i64),
}

impl From<RawProjectId> for ProjectId {
    fn from(raw: RawProjectId) -> Self {
        match raw {
            RawProjectId::Text(text) => Self(text),
            RawProjectId::Number(n) => Self(n.to_string()),
        }
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for ProjectId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of [`Pipeline::run_full`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullRun {
    pub project_id: ProjectId,
    pub business_model_canvas: JsonObject,
    pub hypotheses: JsonObject,
    pub experiments: JsonObject,
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Clone)]
pub struct Pipeline {
    model: Arc<dyn TextModel>,
    warehouse: Warehouse,
}

impl Pipeline {
    pub fn new(model: Arc<dyn TextModel>, warehouse: Warehouse) -> Self {
        Self { model, warehouse }
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    /// Artifact table keyed by `project_id`.
    pub fn table(name: &str) -> TableSpec {
        TableSpec::new(name).with_identifier(IDENTIFIER_COLUMN)
    }

    /// Generates the canvas and stores the project details and the canvas.
    pub async fn run_canvas(
        &self,
        project_id: &ProjectId,
        input: &CanvasInput,
    ) -> PipelineResult<JsonObject> {
        let span = pipeline_span("canvas", project_id);
        self.canvas_stage(project_id, input).instrument(span).await
    }

    /// Generates hypotheses from `canvas`, or from the stored canvas when
    /// `canvas` is blank.
    pub async fn run_hypotheses(
        &self,
        project_id: &ProjectId,
        canvas: Option<JsonValue>,
        project_description: &str,
        sector: &str,
    ) -> PipelineResult<JsonObject> {
        let span = pipeline_span("hypotheses", project_id);
        self.hypotheses_stage(project_id, canvas, project_description, sector)
            .instrument(span)
            .await
    }

    /// Designs experiments from `hypotheses`, or from the stored hypotheses
    /// when `hypotheses` is blank.
    pub async fn run_experiments(
        &self,
        project_id: &ProjectId,
        hypotheses: Option<JsonValue>,
        project_description: &str,
        sector: &str,
    ) -> PipelineResult<JsonObject> {
        let span = pipeline_span("experiments", project_id);
        self.experiments_stage(project_id, hypotheses, project_description, sector)
            .instrument(span)
            .await
    }

    /// All three stages, each fed by the previous stage's output.
    pub async fn run_full(
        &self,
        project_id: &ProjectId,
        input: &CanvasInput,
    ) -> PipelineResult<FullRun> {
        let span = pipeline_span("full", project_id);
        async {
            let canvas = self.canvas_stage(project_id, input).await?;
            let hypotheses = self
                .hypotheses_stage(
                    project_id,
                    Some(JsonValue::Object(canvas.clone())),
                    &input.project_description,
                    &input.sector,
                )
                .await?;
            let experiments = self
                .experiments_stage(
                    project_id,
                    hypotheses.get("hypotheses").cloned(),
                    &input.project_description,
                    &input.sector,
                )
                .await?;
            info!("full pipeline finished");
            Ok(FullRun {
                project_id: project_id.clone(),
                business_model_canvas: canvas,
                hypotheses,
                experiments,
            })
        }
        .instrument(span)
        .await
    }

    async fn canvas_stage(
        &self,
        project_id: &ProjectId,
        input: &CanvasInput,
    ) -> PipelineResult<JsonObject> {
        let canvas = agents::canvas::generate(self.model.as_ref(), input).await?;

        let mut project = match serde_json::to_value(input) {
            Ok(JsonValue::Object(details)) => details,
            _ => JsonObject::new(),
        };
        project.insert(PROJECT_ID_KEY.into(), json!(project_id));
        self.persist(PROJECTS_TABLE, project).await?;

        let mut stored = canvas.clone();
        stored.insert(PROJECT_ID_KEY.into(), json!(project_id));
        self.persist(BMC_TABLE, stored).await?;

        info!(sections = canvas.len(), "canvas stored");
        Ok(canvas)
    }

    async fn hypotheses_stage(
        &self,
        project_id: &ProjectId,
        canvas: Option<JsonValue>,
        project_description: &str,
        sector: &str,
    ) -> PipelineResult<JsonObject> {
        let canvas = match canvas.filter(|value| !is_blank(value)) {
            Some(canvas) => canvas,
            None => self.load_upstream(BMC_TABLE, project_id).await?,
        };

        let input = HypothesisInput {
            canvas,
            project_description: project_description.to_string(),
            sector: sector.to_string(),
        };
        let hypotheses = agents::hypothesis::generate(self.model.as_ref(), &input).await?;

        let mut stored = hypotheses.clone();
        stored.insert(PROJECT_ID_KEY.into(), json!(project_id));
        self.persist(HYPOTHESES_TABLE, stored).await?;

        info!(total = ?hypotheses.get("total_hypotheses"), "hypotheses stored");
        Ok(hypotheses)
    }

    async fn experiments_stage(
        &self,
        project_id: &ProjectId,
        hypotheses: Option<JsonValue>,
        project_description: &str,
        sector: &str,
    ) -> PipelineResult<JsonObject> {
        let hypotheses = match hypotheses.filter(|value| !is_blank(value)) {
            Some(hypotheses) => hypotheses,
            None => self.load_upstream(HYPOTHESES_TABLE, project_id).await?,
        };

        let input = ExperimentInput {
            hypotheses,
            project_description: project_description.to_string(),
            sector: sector.to_string(),
        };
        let experiments = agents::experiment::generate(self.model.as_ref(), &input).await?;

        let mut stored = experiments.clone();
        stored.insert(PROJECT_ID_KEY.into(), json!(project_id));
        self.persist(EXPERIMENTS_TABLE, stored).await?;

        info!(count = ?experiments.get("experiment_count"), "experiments stored");
        Ok(experiments)
    }

    /// First stored row for the project, decoded, without its identifier.
    async fn load_upstream(
        &self,
        table: &str,
        project_id: &ProjectId,
    ) -> PipelineResult<JsonValue> {
        let missing = || PipelineError::MissingUpstream {
            table: table.to_string(),
            project_id: project_id.clone(),
        };

        let rows = match self.warehouse.query(Self::table(table), Some(project_id.as_str())).await {
            Ok(rows) => rows,
            Err(StoreError::TableNotFound(_)) => return Err(missing()),
            Err(err) => return Err(err.into()),
        };
        let mut row = rows.into_iter().next().ok_or_else(missing)?;
        row.shift_remove(IDENTIFIER_COLUMN);

        info!(table, "using stored upstream data");
        Ok(denormalize(&row))
    }

    async fn persist(&self, table: &str, record: JsonObject) -> PipelineResult<()> {
        match self
            .warehouse
            .upsert(Self::table(table), &JsonValue::Object(record))
            .await
        {
            UpsertReport::Ok { .. } => Ok(()),
            UpsertReport::Error { errors } => Err(PipelineError::Persistence {
                table: table.to_string(),
                errors,
            }),
        }
    }
}

/// One span per run, tagged with a fresh run id.
fn pipeline_span(stage: &'static str, project_id: &ProjectId) -> Span {
    info_span!("pipeline", run_id = %Uuid::new_v4(), stage, %project_id)
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_accepts_numbers_and_text() {
        let from_number: ProjectId = serde_json::from_value(json!(7)).unwrap();
        let from_text: ProjectId = serde_json::from_value(json!("7")).unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(serde_json::to_value(&from_number).unwrap(), json!("7"));
    }

    #[test]
    fn blank_values() {
        assert!(is_blank(&JsonValue::Null));
        assert!(is_blank(&json!({})));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!("  ")));
        assert!(!is_blank(&json!([{}])));
        assert!(!is_blank(&json!(0)));
    }
}

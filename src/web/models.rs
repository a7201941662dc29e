use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::agents::{CanvasInput, JsonObject};
use crate::core::Row;
use crate::pipeline::ProjectId;

#[derive(Debug, Clone, Deserialize)]
pub struct BmcRequest {
    pub project_id: ProjectId,
    #[serde(flatten)]
    pub project: CanvasInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HypothesisRequest {
    pub project_id: ProjectId,
    #[serde(default)]
    pub bmc_data: Option<JsonValue>,
    pub project_description: String,
    pub sector: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentRequest {
    pub project_id: ProjectId,
    #[serde(default)]
    pub hypotheses: Option<JsonValue>,
    pub project_description: String,
    pub sector: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetDataQuery {
    pub table_name: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CanvasResponse {
    pub project_id: ProjectId,
    pub project_name: String,
    pub business_model_canvas: JsonObject,
}

#[derive(Debug, Serialize)]
pub struct HypothesesResponse {
    pub project_id: ProjectId,
    pub department: String,
    pub project: String,
    pub hypothesis_data: JsonObject,
}

#[derive(Debug, Serialize)]
pub struct ExperimentsResponse {
    pub project_id: ProjectId,
    pub department: String,
    pub project: String,
    pub experiment_data: JsonObject,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub data: Vec<Row>,
}

#[derive(Debug, Serialize)]
pub struct AllDataResponse {
    pub bmc_data: Vec<Row>,
    pub hypotheses_data: Vec<Row>,
    pub experiments_data: Vec<Row>,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects_data: Vec<Row>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub endpoints: &'static [&'static str],
}

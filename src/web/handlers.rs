use axum::{
    Json,
    extract::{Query, State},
};
use tracing::info;

use super::{
    error::{AppError, AppResult},
    models::{
        AllDataResponse, Banner, BmcRequest, CanvasResponse, DataResponse, ExperimentRequest,
        ExperimentsResponse, GetDataQuery, HealthResponse, HypothesesResponse, HypothesisRequest,
        ProjectsResponse,
    },
    state::AppState,
};
use crate::pipeline::{
    BMC_TABLE, EXPERIMENTS_TABLE, FullRun, HYPOTHESES_TABLE, PROJECTS_TABLE, Pipeline,
};

pub const ENDPOINTS: &[&str] = &[
    "/health",
    "/run_bmc_pipeline",
    "/run_hypotheses_agent",
    "/run_experiments_agent",
    "/run_full_pipeline",
    "/get_data",
    "/get_all_data",
    "/get_all_project_data",
];

pub async fn root() -> Json<Banner> {
    Json(Banner {
        message: "canvasflow pipeline API",
        status: "active",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS,
    })
}

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn run_bmc_pipeline(
    State(state): State<AppState>,
    Json(payload): Json<BmcRequest>,
) -> AppResult<Json<CanvasResponse>> {
    ensure_present("project_name", &payload.project.project_name)?;

    let canvas = state
        .pipeline
        .run_canvas(&payload.project_id, &payload.project)
        .await?;

    Ok(Json(CanvasResponse {
        project_id: payload.project_id,
        project_name: payload.project.project_name,
        business_model_canvas: canvas,
    }))
}

pub async fn run_hypotheses_agent(
    State(state): State<AppState>,
    Json(payload): Json<HypothesisRequest>,
) -> AppResult<Json<HypothesesResponse>> {
    let hypotheses = state
        .pipeline
        .run_hypotheses(
            &payload.project_id,
            payload.bmc_data,
            &payload.project_description,
            &payload.sector,
        )
        .await?;

    Ok(Json(HypothesesResponse {
        project_id: payload.project_id,
        department: payload.sector,
        project: payload.project_description,
        hypothesis_data: hypotheses,
    }))
}

pub async fn run_experiments_agent(
    State(state): State<AppState>,
    Json(payload): Json<ExperimentRequest>,
) -> AppResult<Json<ExperimentsResponse>> {
    let experiments = state
        .pipeline
        .run_experiments(
            &payload.project_id,
            payload.hypotheses,
            &payload.project_description,
            &payload.sector,
        )
        .await?;

    Ok(Json(ExperimentsResponse {
        project_id: payload.project_id,
        department: payload.sector,
        project: payload.project_description,
        experiment_data: experiments,
    }))
}

pub async fn run_full_pipeline(
    State(state): State<AppState>,
    Json(payload): Json<BmcRequest>,
) -> AppResult<Json<FullRun>> {
    ensure_present("project_name", &payload.project.project_name)?;

    let run = state
        .pipeline
        .run_full(&payload.project_id, &payload.project)
        .await?;
    Ok(Json(run))
}

pub async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<GetDataQuery>,
) -> AppResult<Json<DataResponse>> {
    let data = state
        .warehouse()
        .query(
            query.table_name.as_str(),
            query.project_id.as_deref().filter(|id| !id.is_empty()),
        )
        .await?;

    info!(table = %query.table_name, rows = data.len(), "data read");
    Ok(Json(DataResponse { data }))
}

pub async fn get_all_data(State(state): State<AppState>) -> AppResult<Json<AllDataResponse>> {
    let warehouse = state.warehouse();

    Ok(Json(AllDataResponse {
        bmc_data: warehouse.query(Pipeline::table(BMC_TABLE), None).await?,
        hypotheses_data: warehouse.query(Pipeline::table(HYPOTHESES_TABLE), None).await?,
        experiments_data: warehouse.query(Pipeline::table(EXPERIMENTS_TABLE), None).await?,
    }))
}

pub async fn get_all_project_data(
    State(state): State<AppState>,
) -> AppResult<Json<ProjectsResponse>> {
    let projects_data = state
        .warehouse()
        .query(Pipeline::table(PROJECTS_TABLE), None)
        .await?;
    Ok(Json(ProjectsResponse { projects_data }))
}

fn ensure_present(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be blank")));
    }
    Ok(())
}

//! HTTP surface over the pipeline and the warehouse.

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use error::{AppError, AppResult};
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::healthcheck))
        .route("/run_bmc_pipeline", post(handlers::run_bmc_pipeline))
        .route("/run_hypotheses_agent", post(handlers::run_hypotheses_agent))
        .route("/run_experiments_agent", post(handlers::run_experiments_agent))
        .route("/run_full_pipeline", post(handlers::run_full_pipeline))
        .route("/get_data", post(handlers::get_data))
        .route("/get_all_data", get(handlers::get_all_data))
        .route("/get_all_project_data", get(handlers::get_all_project_data))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

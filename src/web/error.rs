use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::agents::AgentError;
use crate::core::StoreError;
use crate::json::JsonError;
use crate::pipeline::PipelineError;
use crate::warehouse::UpsertFailure;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Model(String),

    #[error("{message}")]
    Persistence {
        message: String,
        errors: Vec<UpsertFailure>,
    },

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<UpsertFailure>>,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::MalformedResponse(_) => (StatusCode::BAD_GATEWAY, "malformed_model_response"),
            Self::Model(_) => (StatusCode::BAD_GATEWAY, "model_error"),
            Self::Persistence { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TableNotFound(_) | StoreError::DatasetNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            StoreError::InvalidIdentifier(_) | StoreError::NoIdentifierColumn(_) => {
                Self::Validation(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Agent(AgentError::Json(JsonError::MalformedResponse(msg))) => {
                Self::MalformedResponse(format!("Malformed model response: {msg}"))
            }
            PipelineError::Agent(AgentError::Model(err)) => Self::Model(err.to_string()),
            PipelineError::Agent(other) => Self::Internal(other.to_string()),
            PipelineError::Store(err) => err.into(),
            PipelineError::MissingUpstream { .. } => Self::NotFound(err.to_string()),
            PipelineError::Persistence { table, errors } => Self::Persistence {
                message: format!("Failed to persist {table}"),
                errors,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), code, error = %self, "request failed");
        }

        let error = self.to_string();
        let errors = match self {
            Self::Persistence { errors, .. } => Some(errors),
            _ => None,
        };

        (status, Json(ErrorResponse { error, code, errors })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::pipeline::ProjectId;

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().status_and_code().0
    }

    #[test]
    fn pipeline_errors_map_to_statuses() {
        let malformed =
            PipelineError::Agent(AgentError::Json(JsonError::MalformedResponse("x".into())));
        assert_eq!(status(malformed), StatusCode::BAD_GATEWAY);

        let model = PipelineError::Agent(AgentError::Model(LlmError::EmptyResponse));
        assert_eq!(status(model), StatusCode::BAD_GATEWAY);

        let missing = PipelineError::MissingUpstream {
            table: "BMC".into(),
            project_id: ProjectId::from("7"),
        };
        assert_eq!(status(missing), StatusCode::NOT_FOUND);

        let persistence = PipelineError::Persistence {
            table: "BMC".into(),
            errors: Vec::new(),
        };
        assert_eq!(status(persistence), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(status(StoreError::TableNotFound("t".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(StoreError::InvalidIdentifier("t".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(StoreError::Unavailable("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use nodecheck::{BaselineError, ConfigurationError, EvaluationError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Evaluation(EvaluationError::BaselineResolutionFailed(BaselineError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            AppError::Evaluation(EvaluationError::BaselineResolutionFailed(_)) => StatusCode::BAD_REQUEST,
            AppError::Evaluation(EvaluationError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Configuration(ConfigurationError::InvalidNodeUrl { .. }) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody { error: self.to_string() })
    }
}

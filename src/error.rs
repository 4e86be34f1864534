use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::analyzer::AnalysisError;

/// Every failure a handler can surface to a client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: bool,
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Analysis(AnalysisError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Analysis(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Analysis(AnalysisError::InvalidInput(_)) => {
                "validation_error"
            }
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Analysis(AnalysisError::NotConfigured) => "provider_not_configured",
            Self::Analysis(AnalysisError::Provider(_)) => "provider_error",
            Self::Analysis(AnalysisError::Parse(_)) => "parse_error",
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Text shown to the client; infrastructure details stay in the log.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Analysis(e) => e.public_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, code = self.code(), "request failed");
        }
        let body = ErrorBody {
            error: true,
            code: self.code(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

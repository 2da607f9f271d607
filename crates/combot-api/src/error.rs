use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use combot_ml::MlError;
use combot_persist::PersistError;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, field: Option<String> },

    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("The classifier is busy, please try again shortly")]
    Busy { max_concurrent: usize },

    #[error("System is experiencing high memory usage. Please try again later.")]
    Memory { usage: f64, threshold: f64 },

    #[error("ML classification error: {0}")]
    Ml(MlError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Busy { .. } | ApiError::Memory { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ml(_) | ApiError::Persist(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Busy { .. } => "SERVICE_UNAVAILABLE_ERROR",
            ApiError::Memory { .. } => "MEMORY_ERROR",
            ApiError::Ml(_) => "ML_CLASSIFICATION_ERROR",
            ApiError::Persist(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<MlError> for ApiError {
    fn from(err: MlError) -> Self {
        match err {
            MlError::Busy { max_concurrent } => ApiError::Busy { max_concurrent },
            other => ApiError::Ml(other),
        }
    }
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_code: String,
    #[schema(value_type = Object)]
    pub details: Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match &self {
            ApiError::Validation { field, .. } => {
                tracing::warn!(field = ?field, "Validation error: {}", self);
                let details = match field {
                    Some(field) => json!({ "field": field }),
                    None => json!({}),
                };
                (self.to_string(), details)
            }
            ApiError::NotFound(_) => (self.to_string(), json!({})),
            ApiError::Busy { max_concurrent } => {
                tracing::warn!(max_concurrent, "Classifier busy");
                (self.to_string(), json!({ "service": "ml", "max_concurrent": max_concurrent }))
            }
            ApiError::Memory { usage, threshold } => {
                tracing::error!(usage, threshold, "Memory pressure, refusing request");
                (self.to_string(), json!({ "current_usage": usage, "threshold": threshold }))
            }
            ApiError::Ml(e) => {
                tracing::error!("ML classification error: {}", e);
                ("An error occurred during text classification.".to_string(), json!({}))
            }
            ApiError::Persist(e) => {
                tracing::error!("Persistence error: {}", e);
                ("An error occurred while saving the conversation.".to_string(), json!({}))
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                ("Internal server error".to_string(), json!({}))
            }
        };

        let body = ErrorBody {
            error: message,
            error_code: self.error_code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

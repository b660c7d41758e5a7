use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid API key")]
    Unauthorized,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Failed to send message")]
    MailFailed(anyhow::Error),

    #[error("{0}")]
    Internal(&'static str, anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::MailFailed { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            AppError::MailFailed(err) => {
                log::error!("cannot send contact email: {err:?}");
                json!({ "error": self.to_string(), "details": err.to_string() })
            }
            AppError::Internal(_, err) => {
                log::error!("{self}: {err:?}");
                json!({ "error": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Maps storage failures to a logged 500 carrying `message`.
pub trait Context<T> {
    fn or_internal(self, message: &'static str) -> Result<T, AppError>;
}

impl<T> Context<T> for anyhow::Result<T> {
    fn or_internal(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|err| AppError::Internal(message, err))
    }
}

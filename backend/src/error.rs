use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Game engine not set yet")]
    EngineMissing,

    #[error("Could not connect to runner: {0}")]
    Transport(String),

    #[error("Error from runner: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad runner output: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Object storage error: {0}")]
    ObjectStorage(#[from] object_store::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl AppError {
    /// Splits a reqwest failure into the transport/protocol taxonomy: an error
    /// that never produced a status line is a connection problem, a bad status
    /// means the runner answered and rejected us.
    pub fn from_runner(err: reqwest::Error) -> Self {
        if err.is_status() {
            AppError::Protocol(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::EngineMissing | AppError::Parse(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

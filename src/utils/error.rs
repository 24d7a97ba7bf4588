use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// 所有伺服器端失敗對外只回傳這段固定訊息
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Datastore request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Datastore returned HTTP {status}: {message}")]
    StoreError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed entity: {message}")]
    MalformedEntity { message: String },

    #[error("Expected a single entity, got {count}")]
    AmbiguousEntity { count: usize },

    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid form submission: {message}")]
    InvalidForm { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingParameter { .. } | AppError::InvalidForm { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// 串接整條 source chain，方便記錄完整錯誤
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self.chain(), "An error occurred during a request");
            return internal_error_response();
        }

        tracing::debug!(error = %self, status = status.as_u16(), "Rejected request");
        (status, self.to_string()).into_response()
    }
}

pub fn internal_error_response() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
}

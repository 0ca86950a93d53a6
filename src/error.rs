use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Reply depth limit exceeded (max depth {max_depth})")]
    DepthExceeded { max_depth: i32 },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    ValidatorError(#[from] validator::ValidationErrors),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "AUTHENTICATION_ERROR")
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, msg.clone(), "AUTHORIZATION_ERROR")
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "VALIDATION_ERROR")
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, msg.clone(), "NOT_FOUND")
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, msg.clone(), "CONFLICT")
            }
            AppError::DepthExceeded { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string(), "DEPTH_EXCEEDED")
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "BAD_REQUEST")
            }
            AppError::Network(msg) => {
                tracing::error!("Network error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream network error".to_string(), "NETWORK_ERROR")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), "INTERNAL_ERROR")
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string(), "SERIALIZATION_ERROR")
            }
            AppError::ValidatorError(e) => {
                let validation_errors = e
                    .field_errors()
                    .iter()
                    .map(|(field, errors)| {
                        (
                            field.to_string(),
                            errors.iter().map(|e| e.message.as_ref().unwrap_or(&"Invalid value".into()).to_string()).collect::<Vec<_>>()
                        )
                    })
                    .collect::<std::collections::HashMap<String, Vec<String>>>();

                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": {
                            "code": "VALIDATION_ERROR",
                            "message": "Validation failed",
                            "details": validation_errors
                        }
                    }))
                ).into_response();
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": error_message
            }
        }));

        (status, body).into_response()
    }
}

// 便利函数，用于创建常见错误
impl AppError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", resource))
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::Authentication(msg.to_string())
    }

    pub fn forbidden(msg: &str) -> Self {
        Self::Authorization(msg.to_string())
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        Self::Internal(msg.to_string())
    }

    pub fn conflict(msg: &str) -> Self {
        Self::Conflict(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        Self::Validation(msg.to_string())
    }

    /// 判断错误是否代表瞬时网络故障，调用方可以安全重试
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_))
    }
}

// 从其他错误类型转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

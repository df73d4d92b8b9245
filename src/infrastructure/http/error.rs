//! HTTP Error Handling
//!
//! 业务错误统一以 HTTP 200 返回，错误码放在 errno 中

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const BAD_GATEWAY: i32 = 502;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Conflict(String),
    /// 生成服务返回了无法解析的内容
    BadGateway(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::BadGateway(_) => errno::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let message = self.message();

        match &self {
            ApiError::NotFound(_) => {
                tracing::warn!(errno, error = %message, "Resource not found")
            }
            ApiError::BadRequest(_) => tracing::warn!(errno, error = %message, "Bad request"),
            ApiError::Conflict(_) => tracing::warn!(errno, error = %message, "Resource conflict"),
            ApiError::Internal(_) => {
                tracing::error!(errno, error = %message, "Internal server error")
            }
            ApiError::BadGateway(_) => {
                tracing::error!(errno, error = %message, "Unparseable generation output")
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::error!(errno, error = %message, "Generation service unavailable")
            }
        }

        let body = ErrorResponse::new(errno, message);
        (StatusCode::OK, Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { resource_type, id } => {
                ApiError::NotFound(format!("{} not found: {}", resource_type, id))
            }
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::BusinessRuleViolation(msg) => ApiError::BadRequest(msg),
            ApplicationError::InvalidState(msg) => ApiError::BadRequest(msg),
            ApplicationError::Conflict(msg) => ApiError::Conflict(msg),
            ApplicationError::RepositoryError(msg) => ApiError::Internal(msg),
            ApplicationError::ExternalServiceError(msg) => ApiError::ServiceUnavailable(msg),
            ApplicationError::ContentFormat(msg) => ApiError::BadGateway(msg),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_application_error_mapping() {
        let cases = [
            (ApplicationError::not_found("Novel", Uuid::nil()), errno::NOT_FOUND),
            (ApplicationError::Conflict("running".into()), errno::CONFLICT),
            (ApplicationError::ContentFormat("bad json".into()), errno::BAD_GATEWAY),
            (
                ApplicationError::ExternalServiceError("503".into()),
                errno::SERVICE_UNAVAILABLE,
            ),
            (ApplicationError::invalid_state("stage"), errno::BAD_REQUEST),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).errno(), expected);
        }
    }
}

//! LLM Provider Port - 文本生成服务抽象
//!
//! 定义生成式文本服务的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// 生成服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// 服务繁忙状态码
pub const SERVICE_BUSY_STATUS: u16 = 503;

/// 过载标识（出现在错误信息中）
pub const OVERLOADED_MARKER: &str = "overloaded";

impl LlmError {
    /// 是否为临时过载（重试可能成功）
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Status { status, message } => {
                *status == SERVICE_BUSY_STATUS || mentions_overload(message)
            }
            LlmError::NetworkError(message) | LlmError::InvalidResponse(message) => {
                mentions_overload(message)
            }
            LlmError::Timeout | LlmError::NotConfigured(_) => false,
        }
    }
}

fn mentions_overload(message: &str) -> bool {
    message.to_lowercase().contains(OVERLOADED_MARKER)
}

/// 生成请求
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    /// 模型标识
    pub model: String,
    /// 提示词
    pub prompt: String,
    /// 系统指令
    pub system_instruction: Option<String>,
    /// 结构化输出的 JSON Schema（要求返回 JSON）
    pub response_schema: Option<serde_json::Value>,
    /// 思考预算（token 数）
    pub thinking_budget: Option<u32>,
}

/// 生成响应
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// 返回的文本；结构化输出时为 JSON 文本
    pub text: String,
}

/// LLM Provider Port
#[async_trait]
pub trait LlmProviderPort: Send + Sync {
    /// 执行一次生成
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_status_is_transient() {
        let err = LlmError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_overloaded_message_is_transient() {
        let err = LlmError::Status {
            status: 500,
            message: "The model is Overloaded. Please try again later.".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_other_errors_are_not_transient() {
        assert!(!LlmError::Timeout.is_transient());
        assert!(!LlmError::Status {
            status: 400,
            message: "invalid argument".to_string()
        }
        .is_transient());
        assert!(!LlmError::NotConfigured("api key".to_string()).is_transient());
    }
}

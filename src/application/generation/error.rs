//! 生成错误

use thiserror::Error;

use crate::application::ports::LlmError;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// 服务调用失败（临时过载已重试耗尽，或非临时错误）
    #[error("Provider call failed: {0}")]
    Provider(#[from] LlmError),

    /// 返回内容无法解析为预期结构
    #[error("Malformed provider output: {0}")]
    ContentFormat(String),
}

impl GenerationError {
    pub fn content_format(message: impl Into<String>) -> Self {
        Self::ContentFormat(message.into())
    }
}

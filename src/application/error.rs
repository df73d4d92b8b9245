//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::application::generation::GenerationError;
use crate::application::ports::{RepositoryError, RunError};
use crate::domain::novel::NovelError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: Uuid,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 业务规则违反
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// 状态无效（阶段不满足）
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 已有生成任务在运行
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务错误（重试耗尽后仍失败）
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 外部服务返回的内容无法解析
    #[error("Content format error: {0}")]
    ContentFormat(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建业务规则违反错误
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<NovelError> for ApplicationError {
    fn from(err: NovelError) -> Self {
        match err {
            NovelError::NotFound(id) => Self::not_found("Novel", *id.as_uuid()),
            NovelError::ChapterNotFound(id) => Self::not_found("Chapter", *id.as_uuid()),
            NovelError::InvalidStageTransition { .. } => Self::InvalidState(err.to_string()),
            NovelError::DuplicateChapter(_) => Self::BusinessRuleViolation(err.to_string()),
            NovelError::InvalidConfig(msg) => Self::ValidationError(msg),
        }
    }
}

impl From<RunError> for ApplicationError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::AlreadyRunning { .. } => Self::Conflict(err.to_string()),
            RunError::NotRunning(_) => Self::InvalidState(err.to_string()),
        }
    }
}

impl From<GenerationError> for ApplicationError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Provider(e) => Self::ExternalServiceError(e.to_string()),
            GenerationError::ContentFormat(msg) => Self::ContentFormat(msg),
        }
    }
}

//! Novel Context - Errors

use thiserror::Error;

use super::{ChapterId, NovelId, NovelStage};

#[derive(Debug, Error)]
pub enum NovelError {
    #[error("小说不存在: {0}")]
    NotFound(NovelId),

    #[error("章节不存在: {0}")]
    ChapterNotFound(ChapterId),

    #[error("章节 ID 重复: {0}")]
    DuplicateChapter(ChapterId),

    #[error("无效的阶段切换: {from} -> {to}")]
    InvalidStageTransition { from: NovelStage, to: NovelStage },

    #[error("无效的配置: {0}")]
    InvalidConfig(String),
}

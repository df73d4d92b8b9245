//! Generation Queries

use crate::domain::novel::NovelId;

/// 查询生成任务状态
#[derive(Debug, Clone)]
pub struct GetGenerationStatus {
    pub novel_id: NovelId,
}

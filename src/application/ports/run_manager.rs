//! Run Manager Port - 生成任务登记
//!
//! 保证每部小说同一时刻只有一个生成任务，并持有其取消令牌

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::progress::RunMode;
use crate::domain::novel::NovelId;

/// Run Manager 错误
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Generation already running for novel {novel_id} ({mode:?})")]
    AlreadyRunning { novel_id: NovelId, mode: RunMode },

    #[error("No generation running for novel {0}")]
    NotRunning(NovelId),
}

/// 运行中任务的状态快照
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub novel_id: NovelId,
    pub mode: RunMode,
    pub current: usize,
    pub total: usize,
    pub cancelling: bool,
    pub started_at: DateTime<Utc>,
}

/// Run Manager Port
pub trait RunManagerPort: Send + Sync {
    /// 登记新任务，返回该任务的取消令牌
    fn begin(&self, novel_id: NovelId, mode: RunMode) -> Result<CancellationToken, RunError>;

    /// 请求取消（协作式，下一个迭代边界生效）
    fn cancel(&self, novel_id: NovelId) -> Result<(), RunError>;

    /// 记录进度
    fn record_progress(&self, novel_id: NovelId, current: usize, total: usize);

    /// 任务结束，移除登记
    fn finish(&self, novel_id: NovelId);

    /// 获取运行状态
    fn get(&self, novel_id: NovelId) -> Option<RunSnapshot>;

    fn is_running(&self, novel_id: NovelId) -> bool {
        self.get(novel_id).is_some()
    }
}

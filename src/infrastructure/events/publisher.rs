//! Event Publisher Implementation
//!
//! 把生成进度和小说变更广播给 WebSocket 订阅者

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{ProgressEvent, ProgressSink, RunMode, RunStatus};
use crate::domain::novel::{ChapterId, NovelId, NovelStage};

/// 广播通道容量
const CHANNEL_CAPACITY: usize = 256;

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum GenerationEvent {
    /// 生成任务开始
    RunStarted {
        novel_id: NovelId,
        mode: RunMode,
        total: usize,
    },
    /// 进度 {current, total}
    Progress {
        novel_id: NovelId,
        mode: RunMode,
        current: usize,
        total: usize,
    },
    /// 章节已写入
    ChapterWritten {
        novel_id: NovelId,
        chapter_id: ChapterId,
        position: usize,
    },
    /// 生成内容为空，章节未改动
    ChapterSkipped {
        novel_id: NovelId,
        chapter_id: ChapterId,
        position: usize,
    },
    /// 可读日志行
    Log { novel_id: NovelId, line: String },
    /// 生成任务结束
    RunFinished {
        novel_id: NovelId,
        mode: RunMode,
        status: RunStatus,
        completed: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// 小说被修改（用户编辑、回退阶段）
    NovelUpdated {
        novel_id: NovelId,
        stage: NovelStage,
    },
    /// 小说已删除
    NovelDeleted { novel_id: NovelId },
}

impl GenerationEvent {
    pub fn novel_id(&self) -> NovelId {
        match self {
            GenerationEvent::RunStarted { novel_id, .. }
            | GenerationEvent::Progress { novel_id, .. }
            | GenerationEvent::ChapterWritten { novel_id, .. }
            | GenerationEvent::ChapterSkipped { novel_id, .. }
            | GenerationEvent::Log { novel_id, .. }
            | GenerationEvent::RunFinished { novel_id, .. }
            | GenerationEvent::NovelUpdated { novel_id, .. }
            | GenerationEvent::NovelDeleted { novel_id } => *novel_id,
        }
    }
}

impl From<ProgressEvent> for GenerationEvent {
    fn from(event: ProgressEvent) -> Self {
        match event {
            ProgressEvent::Started {
                novel_id,
                mode,
                total,
            } => GenerationEvent::RunStarted {
                novel_id,
                mode,
                total,
            },
            ProgressEvent::Advanced {
                novel_id,
                mode,
                current,
                total,
            } => GenerationEvent::Progress {
                novel_id,
                mode,
                current,
                total,
            },
            ProgressEvent::ChapterWritten {
                novel_id,
                chapter_id,
                position,
            } => GenerationEvent::ChapterWritten {
                novel_id,
                chapter_id,
                position,
            },
            ProgressEvent::ChapterSkipped {
                novel_id,
                chapter_id,
                position,
            } => GenerationEvent::ChapterSkipped {
                novel_id,
                chapter_id,
                position,
            },
            ProgressEvent::Log { novel_id, line } => GenerationEvent::Log { novel_id, line },
            ProgressEvent::Finished {
                novel_id,
                mode,
                status,
                completed,
                message,
            } => GenerationEvent::RunFinished {
                novel_id,
                mode,
                status,
                completed,
                message,
            },
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<GenerationEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全部事件
    pub fn subscribe(&self) -> broadcast::Receiver<GenerationEvent> {
        self.channel.subscribe()
    }

    /// 发布小说更新事件
    pub fn publish_novel_updated(&self, novel_id: NovelId, stage: NovelStage) {
        self.publish(GenerationEvent::NovelUpdated { novel_id, stage });
    }

    /// 发布小说删除事件
    pub fn publish_novel_deleted(&self, novel_id: NovelId) {
        self.publish(GenerationEvent::NovelDeleted { novel_id });
    }

    fn publish(&self, event: GenerationEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::trace!(error = %e, "Event dropped (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for EventPublisher {
    fn report(&self, event: ProgressEvent) {
        self.publish(event.into());
    }
}

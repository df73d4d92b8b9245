//! Progress Port - 生成进度上报
//!
//! 编排器通过该端口向展示层报告 {current, total}、日志行和终态

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::novel::{ChapterId, NovelId};

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// 章节规划（批量生成标题和梗概）
    Planning,
    /// 连续写作
    Streak,
    /// 单章写作
    Chapter,
    /// 大纲生成
    Outline,
    /// 配置推荐
    Config,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Planning => "planning",
            RunMode::Streak => "streak",
            RunMode::Chapter => "chapter",
            RunMode::Outline => "outline",
            RunMode::Config => "config",
        }
    }
}

/// 运行终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
    Failed,
}

/// 进度事件
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started {
        novel_id: NovelId,
        mode: RunMode,
        total: usize,
    },
    Advanced {
        novel_id: NovelId,
        mode: RunMode,
        current: usize,
        total: usize,
    },
    ChapterWritten {
        novel_id: NovelId,
        chapter_id: ChapterId,
        position: usize,
    },
    /// 服务返回空文本，章节保持不变
    ChapterSkipped {
        novel_id: NovelId,
        chapter_id: ChapterId,
        position: usize,
    },
    Log {
        novel_id: NovelId,
        line: String,
    },
    Finished {
        novel_id: NovelId,
        mode: RunMode,
        status: RunStatus,
        completed: usize,
        message: Option<String>,
    },
}

impl ProgressEvent {
    pub fn novel_id(&self) -> NovelId {
        match self {
            ProgressEvent::Started { novel_id, .. }
            | ProgressEvent::Advanced { novel_id, .. }
            | ProgressEvent::ChapterWritten { novel_id, .. }
            | ProgressEvent::ChapterSkipped { novel_id, .. }
            | ProgressEvent::Log { novel_id, .. }
            | ProgressEvent::Finished { novel_id, .. } => *novel_id,
        }
    }
}

/// Progress Sink Port
///
/// 同步、不阻塞；实现方不得把错误回传给编排器
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// 将同一事件分发给多个 sink
pub struct ProgressFanout {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl ProgressFanout {
    pub fn new(sinks: Vec<Arc<dyn ProgressSink>>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for ProgressFanout {
    fn report(&self, event: ProgressEvent) {
        for sink in &self.sinks {
            sink.report(event.clone());
        }
    }
}

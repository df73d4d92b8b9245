//! In-Memory Run Manager Implementation

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ProgressEvent, ProgressSink, RunError, RunManagerPort, RunMode, RunSnapshot,
};
use crate::domain::novel::NovelId;

struct ActiveRun {
    mode: RunMode,
    token: CancellationToken,
    current: usize,
    total: usize,
    started_at: DateTime<Utc>,
}

/// 内存任务登记表
///
/// 同时作为 ProgressSink 记录各任务的 {current, total}
pub struct InMemoryRunManager {
    /// novel_id -> ActiveRun
    runs: DashMap<NovelId, ActiveRun>,
}

impl InMemoryRunManager {
    pub fn new() -> Self {
        Self {
            runs: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 取消所有任务（关闭服务时）
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for run in self.runs.iter() {
            run.token.cancel();
            cancelled += 1;
        }
        cancelled
    }
}

impl Default for InMemoryRunManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RunManagerPort for InMemoryRunManager {
    fn begin(&self, novel_id: NovelId, mode: RunMode) -> Result<CancellationToken, RunError> {
        match self.runs.entry(novel_id) {
            Entry::Occupied(existing) => Err(RunError::AlreadyRunning {
                novel_id,
                mode: existing.get().mode,
            }),
            Entry::Vacant(slot) => {
                let token = CancellationToken::new();
                slot.insert(ActiveRun {
                    mode,
                    token: token.clone(),
                    current: 0,
                    total: 0,
                    started_at: Utc::now(),
                });
                tracing::debug!(novel_id = %novel_id, mode = mode.as_str(), "Run registered");
                Ok(token)
            }
        }
    }

    fn cancel(&self, novel_id: NovelId) -> Result<(), RunError> {
        let run = self
            .runs
            .get(&novel_id)
            .ok_or(RunError::NotRunning(novel_id))?;
        run.token.cancel();
        tracing::debug!(novel_id = %novel_id, mode = run.mode.as_str(), "Run cancel flag set");
        Ok(())
    }

    fn record_progress(&self, novel_id: NovelId, current: usize, total: usize) {
        if let Some(mut run) = self.runs.get_mut(&novel_id) {
            run.current = current;
            run.total = total;
        }
    }

    fn finish(&self, novel_id: NovelId) {
        if let Some((_, run)) = self.runs.remove(&novel_id) {
            tracing::debug!(
                novel_id = %novel_id,
                mode = run.mode.as_str(),
                current = run.current,
                total = run.total,
                "Run unregistered"
            );
        }
    }

    fn get(&self, novel_id: NovelId) -> Option<RunSnapshot> {
        self.runs.get(&novel_id).map(|run| RunSnapshot {
            novel_id,
            mode: run.mode,
            current: run.current,
            total: run.total,
            cancelling: run.token.is_cancelled(),
            started_at: run.started_at,
        })
    }
}

impl ProgressSink for InMemoryRunManager {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { novel_id, total, .. } => {
                self.record_progress(novel_id, 0, total)
            }
            ProgressEvent::Advanced {
                novel_id,
                current,
                total,
                ..
            } => self.record_progress(novel_id, current, total),
            _ => {}
        }
    }
}

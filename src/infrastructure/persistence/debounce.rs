//! Debounced Persistence - 用户编辑的延迟写入
//!
//! 同一小说在等待期内的多次编辑合并为一次写入。
//! 写入时从工作区读取最新状态，只写编辑涉及的部分，
//! 因此不会用旧快照覆盖生成任务在等待期内写入的章节。

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    EditScope, NovelPersistencePort, PendingWritePort, WorkspacePort,
};
use crate::domain::novel::NovelId;

struct PendingWrite {
    generation: u64,
    scope: EditScope,
    cancel: CancellationToken,
}

pub struct DebouncedPersistence {
    target: Arc<dyn NovelPersistencePort>,
    workspace: Arc<dyn WorkspacePort>,
    delay: Duration,
    pending: Arc<DashMap<NovelId, PendingWrite>>,
    generation: AtomicU64,
}

impl DebouncedPersistence {
    pub fn new(
        target: Arc<dyn NovelPersistencePort>,
        workspace: Arc<dyn WorkspacePort>,
        delay: Duration,
    ) -> Self {
        Self {
            target,
            workspace,
            delay,
            pending: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// 立即写入某部小说的待写内容
    pub async fn flush(&self, novel_id: NovelId) {
        if let Some((_, write)) = self.pending.remove(&novel_id) {
            write.cancel.cancel();
            write_latest(self.target.as_ref(), self.workspace.as_ref(), novel_id, write.scope).await;
        }
    }

    /// 立即写入全部待写内容（关闭服务时）
    pub async fn flush_all(&self) {
        let ids: Vec<NovelId> = self.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            self.flush(id).await;
        }
    }
}

/// 读取工作区中的最新状态并写入编辑涉及的部分，失败只记录日志
async fn write_latest(
    target: &dyn NovelPersistencePort,
    workspace: &dyn WorkspacePort,
    novel_id: NovelId,
    scope: EditScope,
) {
    let novel = match workspace.get(novel_id) {
        Ok(novel) => novel,
        Err(_) => {
            tracing::debug!(novel_id = %novel_id, "Novel gone before debounced write");
            return;
        }
    };

    let mut results = Vec::with_capacity(3);
    if scope.config {
        results.push(("save_config", target.save_config(&novel).await));
    }
    if scope.outline {
        results.push(("save_outline", target.save_outline(&novel).await));
    }
    if scope.chapters {
        results.push(("save_all_chapters", target.save_all_chapters(&novel).await));
    }

    for (operation, result) in results {
        if let Err(e) = result {
            tracing::warn!(
                novel_id = %novel_id,
                backend = target.backend(),
                operation,
                error = %e,
                "Debounced write failed"
            );
        }
    }
    tracing::debug!(novel_id = %novel_id, ?scope, "Debounced write completed");
}

impl PendingWritePort for DebouncedPersistence {
    fn schedule(&self, novel_id: NovelId, scope: EditScope) {
        if scope.is_empty() {
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancellationToken::new();

        let mut scope = scope;
        if let Some((_, previous)) = self.pending.remove(&novel_id) {
            previous.cancel.cancel();
            scope = scope.merge(previous.scope);
        }
        self.pending.insert(
            novel_id,
            PendingWrite {
                generation,
                scope,
                cancel: cancel.clone(),
            },
        );

        let pending = self.pending.clone();
        let target = self.target.clone();
        let workspace = self.workspace.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let Some((_, write)) = pending.remove_if(&novel_id, |_, w| w.generation == generation)
            else {
                return;
            };
            write_latest(target.as_ref(), workspace.as_ref(), novel_id, write.scope).await;
        });
    }

    fn discard(&self, novel_id: NovelId) {
        if let Some((_, write)) = self.pending.remove(&novel_id) {
            write.cancel.cancel();
            tracing::debug!(novel_id = %novel_id, "Pending write discarded");
        }
    }
}

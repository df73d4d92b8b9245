//! Novel Command Handlers

use std::sync::Arc;

use crate::application::commands::{CreateNovel, DeleteNovel, SelectNovel, StageBack, UpdateNovel};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    EditScope, NovelPersistencePort, NovelRepositoryPort, PendingWritePort, RunManagerPort,
    WorkspacePort,
};
use crate::domain::novel::{Novel, NovelError, NovelPatch};

// ============================================================================
// CreateNovel
// ============================================================================

/// CreateNovel Handler - 创建空白小说并设为活动
pub struct CreateNovelHandler {
    workspace: Arc<dyn WorkspacePort>,
    persistence: Arc<dyn NovelPersistencePort>,
}

impl CreateNovelHandler {
    pub fn new(workspace: Arc<dyn WorkspacePort>, persistence: Arc<dyn NovelPersistencePort>) -> Self {
        Self {
            workspace,
            persistence,
        }
    }

    pub async fn handle(&self, command: CreateNovel) -> Result<Novel, ApplicationError> {
        let novel = self.workspace.create_empty();
        if let Some(config) = command.config {
            if let Err(e) = config.check_bounds() {
                self.workspace.delete(novel.id())?;
                return Err(e.into());
            }
            self.workspace.apply(novel.id(), NovelPatch::config(config))?;
        }
        let novel = self.workspace.select(novel.id())?;

        if let Err(e) = self.persistence.save_config(&novel).await {
            tracing::warn!(novel_id = %novel.id(), error = %e, "Failed to persist new novel");
        }

        tracing::info!(novel_id = %novel.id(), title = %novel.title(), "Novel created");
        Ok(novel)
    }
}

// ============================================================================
// SelectNovel
// ============================================================================

/// SelectNovel Handler
pub struct SelectNovelHandler {
    workspace: Arc<dyn WorkspacePort>,
}

impl SelectNovelHandler {
    pub fn new(workspace: Arc<dyn WorkspacePort>) -> Self {
        Self { workspace }
    }

    pub fn handle(&self, command: SelectNovel) -> Result<Novel, ApplicationError> {
        let novel = self.workspace.select(command.novel_id)?;
        tracing::debug!(novel_id = %novel.id(), "Active novel selected");
        Ok(novel)
    }
}

// ============================================================================
// UpdateNovel
// ============================================================================

/// UpdateNovel Handler - 用户编辑
///
/// 立即合并到工作区，持久化经过延迟写入调度
pub struct UpdateNovelHandler {
    workspace: Arc<dyn WorkspacePort>,
    pending: Arc<dyn PendingWritePort>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl UpdateNovelHandler {
    pub fn new(
        workspace: Arc<dyn WorkspacePort>,
        pending: Arc<dyn PendingWritePort>,
        run_manager: Arc<dyn RunManagerPort>,
    ) -> Self {
        Self {
            workspace,
            pending,
            run_manager,
        }
    }

    pub async fn handle(&self, command: UpdateNovel) -> Result<Novel, ApplicationError> {
        let novel = self.workspace.get(command.novel_id)?;

        if let Some(config) = &command.config {
            config.check_bounds()?;
        }

        let scope = EditScope {
            config: command.config.is_some(),
            outline: command.outline.is_some(),
            chapters: !command.chapters.is_empty(),
        };
        let mut patch = NovelPatch {
            config: command.config,
            outline: command.outline,
            ..Default::default()
        };

        if !command.chapters.is_empty() {
            // 生成过程中整体替换章节列表会覆盖刚写入的章节
            if let Some(run) = self.run_manager.get(novel.id()) {
                return Err(ApplicationError::Conflict(format!(
                    "生成任务（{}）运行中，暂不能编辑章节",
                    run.mode.as_str()
                )));
            }

            let mut chapters = novel.chapters().to_vec();
            for edit in command.chapters {
                let chapter = chapters
                    .iter_mut()
                    .find(|c| c.id() == edit.chapter_id)
                    .ok_or(NovelError::ChapterNotFound(edit.chapter_id))?;
                chapter.edit(edit.title, edit.synopsis, edit.content);
            }
            patch.chapters = Some(chapters);
        }

        let updated = self.workspace.apply(novel.id(), patch)?;
        self.pending.schedule(updated.id(), scope);

        tracing::debug!(novel_id = %updated.id(), "Novel updated");
        Ok(updated)
    }
}

// ============================================================================
// DeleteNovel
// ============================================================================

/// DeleteNovel Handler
pub struct DeleteNovelHandler {
    workspace: Arc<dyn WorkspacePort>,
    novel_repo: Arc<dyn NovelRepositoryPort>,
    pending: Arc<dyn PendingWritePort>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl DeleteNovelHandler {
    pub fn new(
        workspace: Arc<dyn WorkspacePort>,
        novel_repo: Arc<dyn NovelRepositoryPort>,
        pending: Arc<dyn PendingWritePort>,
        run_manager: Arc<dyn RunManagerPort>,
    ) -> Self {
        Self {
            workspace,
            novel_repo,
            pending,
            run_manager,
        }
    }

    pub async fn handle(&self, command: DeleteNovel) -> Result<Novel, ApplicationError> {
        let novel_id = command.novel_id;

        if self.run_manager.is_running(novel_id) {
            return Err(ApplicationError::Conflict(
                "生成任务运行中，请先取消再删除".to_string(),
            ));
        }

        let novel = self.workspace.delete(novel_id)?;
        self.pending.discard(novel_id);
        self.novel_repo.delete(novel_id).await?;

        tracing::info!(
            novel_id = %novel_id,
            title = %novel.title(),
            "Novel deleted"
        );

        Ok(novel)
    }
}

// ============================================================================
// StageBack
// ============================================================================

/// StageBack Handler - 用户显式回退阶段
pub struct StageBackHandler {
    workspace: Arc<dyn WorkspacePort>,
    persistence: Arc<dyn NovelPersistencePort>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl StageBackHandler {
    pub fn new(
        workspace: Arc<dyn WorkspacePort>,
        persistence: Arc<dyn NovelPersistencePort>,
        run_manager: Arc<dyn RunManagerPort>,
    ) -> Self {
        Self {
            workspace,
            persistence,
            run_manager,
        }
    }

    pub async fn handle(&self, command: StageBack) -> Result<Novel, ApplicationError> {
        if self.run_manager.is_running(command.novel_id) {
            return Err(ApplicationError::Conflict(
                "生成任务运行中，不能回退阶段".to_string(),
            ));
        }

        let novel = self
            .workspace
            .apply(command.novel_id, NovelPatch::rewind(command.stage))?;

        if let Err(e) = self.persistence.save_config(&novel).await {
            tracing::warn!(novel_id = %novel.id(), error = %e, "Failed to persist stage");
        }

        tracing::info!(novel_id = %novel.id(), stage = %novel.stage(), "Stage rewound");
        Ok(novel)
    }
}

//! Generation Command Handlers
//!
//! 每个生成操作都先在 RunManager 登记，保证同一小说同时只有一个任务。
//! 章节规划和连续写作在后台运行，完成情况通过进度事件观察。

use std::sync::Arc;

use crate::application::commands::{
    CancelGeneration, GenerateOutline, GenerateOutlineResponse, PlanChapters, RecommendConfig,
    RecommendConfigResponse, RunStarted, StreakWrite, WriteChapter, WriteChapterResponse,
};
use crate::application::error::ApplicationError;
use crate::application::generation::GenerationOrchestrator;
use crate::application::ports::{RunManagerPort, RunMode};
use crate::domain::novel::NovelId;

/// 任务登记守卫，离开作用域时结束登记
struct RunGuard {
    run_manager: Arc<dyn RunManagerPort>,
    novel_id: NovelId,
}

impl RunGuard {
    fn new(run_manager: Arc<dyn RunManagerPort>, novel_id: NovelId) -> Self {
        Self {
            run_manager,
            novel_id,
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.run_manager.finish(self.novel_id);
    }
}

// ============================================================================
// 单步操作
// ============================================================================

/// RecommendConfig Handler
pub struct RecommendConfigHandler {
    orchestrator: Arc<GenerationOrchestrator>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl RecommendConfigHandler {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self {
            orchestrator,
            run_manager,
        }
    }

    pub async fn handle(
        &self,
        command: RecommendConfig,
    ) -> Result<RecommendConfigResponse, ApplicationError> {
        self.run_manager.begin(command.novel_id, RunMode::Config)?;
        let _guard = RunGuard::new(self.run_manager.clone(), command.novel_id);

        let config = self.orchestrator.recommend_config(command.novel_id).await?;
        Ok(RecommendConfigResponse {
            novel_id: command.novel_id,
            config,
        })
    }
}

/// GenerateOutline Handler
pub struct GenerateOutlineHandler {
    orchestrator: Arc<GenerationOrchestrator>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl GenerateOutlineHandler {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self {
            orchestrator,
            run_manager,
        }
    }

    pub async fn handle(
        &self,
        command: GenerateOutline,
    ) -> Result<GenerateOutlineResponse, ApplicationError> {
        self.run_manager.begin(command.novel_id, RunMode::Outline)?;
        let _guard = RunGuard::new(self.run_manager.clone(), command.novel_id);

        let outline = self.orchestrator.draft_outline(command.novel_id).await?;
        Ok(GenerateOutlineResponse {
            novel_id: command.novel_id,
            outline,
        })
    }
}

/// WriteChapter Handler - 撰写或重写单章
pub struct WriteChapterHandler {
    orchestrator: Arc<GenerationOrchestrator>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl WriteChapterHandler {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self {
            orchestrator,
            run_manager,
        }
    }

    pub async fn handle(&self, command: WriteChapter) -> Result<WriteChapterResponse, ApplicationError> {
        self.run_manager.begin(command.novel_id, RunMode::Chapter)?;
        let _guard = RunGuard::new(self.run_manager.clone(), command.novel_id);

        let outcome = self
            .orchestrator
            .write_chapter(command.novel_id, command.position)
            .await?;
        Ok(WriteChapterResponse {
            novel_id: command.novel_id,
            position: outcome.position,
            chapter: outcome.chapter,
            empty: outcome.empty,
        })
    }
}

// ============================================================================
// 后台运行
// ============================================================================

/// PlanChapters Handler - 后台规划章节
pub struct PlanChaptersHandler {
    orchestrator: Arc<GenerationOrchestrator>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl PlanChaptersHandler {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self {
            orchestrator,
            run_manager,
        }
    }

    pub fn handle(&self, command: PlanChapters) -> Result<RunStarted, ApplicationError> {
        let novel_id = command.novel_id;
        self.orchestrator.check_planning(novel_id)?;
        let cancel = self.run_manager.begin(novel_id, RunMode::Planning)?;
        let guard = RunGuard::new(self.run_manager.clone(), novel_id);
        let orchestrator = self.orchestrator.clone();

        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = orchestrator.plan_chapters(novel_id, &cancel).await {
                tracing::error!(novel_id = %novel_id, error = %e, "Chapter planning aborted");
            }
        });

        Ok(RunStarted {
            novel_id,
            mode: RunMode::Planning,
        })
    }
}

/// StreakWrite Handler - 后台连续写作
pub struct StreakWriteHandler {
    orchestrator: Arc<GenerationOrchestrator>,
    run_manager: Arc<dyn RunManagerPort>,
}

impl StreakWriteHandler {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self {
            orchestrator,
            run_manager,
        }
    }

    pub fn handle(&self, command: StreakWrite) -> Result<RunStarted, ApplicationError> {
        let novel_id = command.novel_id;
        let novel = self.orchestrator.check_writing(novel_id)?;
        if command.selected >= novel.chapter_count() {
            return Err(ApplicationError::validation(format!(
                "章节位置 {} 超出范围（共 {} 章）",
                command.selected,
                novel.chapter_count()
            )));
        }
        match command.run_length {
            Some(0) => {
                return Err(ApplicationError::validation("连续写作章数必须大于 0"));
            }
            Some(n) if n > novel.chapter_count() => {
                return Err(ApplicationError::validation(format!(
                    "连续写作章数 {} 超过章节总数 {}",
                    n,
                    novel.chapter_count()
                )));
            }
            _ => {}
        }

        let cancel = self.run_manager.begin(novel_id, RunMode::Streak)?;
        let guard = RunGuard::new(self.run_manager.clone(), novel_id);
        let orchestrator = self.orchestrator.clone();

        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = orchestrator
                .streak_write(novel_id, command.selected, command.run_length, &cancel)
                .await
            {
                tracing::error!(novel_id = %novel_id, error = %e, "Streak write aborted");
            }
        });

        Ok(RunStarted {
            novel_id,
            mode: RunMode::Streak,
        })
    }
}

/// CancelGeneration Handler
pub struct CancelGenerationHandler {
    run_manager: Arc<dyn RunManagerPort>,
}

impl CancelGenerationHandler {
    pub fn new(run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self { run_manager }
    }

    pub fn handle(&self, command: CancelGeneration) -> Result<(), ApplicationError> {
        self.run_manager.cancel(command.novel_id)?;
        tracing::info!(novel_id = %command.novel_id, "Generation cancel requested");
        Ok(())
    }
}

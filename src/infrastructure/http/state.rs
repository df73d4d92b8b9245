//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CancelGenerationHandler, CreateNovelHandler, DeleteNovelHandler, GenerateOutlineHandler,
    PlanChaptersHandler, RecommendConfigHandler, SelectNovelHandler, StageBackHandler,
    StreakWriteHandler, UpdateNovelHandler, WriteChapterHandler,
    // Query handlers
    ExportNovelHandler, GetActiveNovelHandler, GetGenerationStatusHandler, GetNovelHandler,
    ListNovelsHandler,
    // Engine & ports
    GenerationOrchestrator, NovelPersistencePort, NovelRepositoryPort, PendingWritePort,
    RunManagerPort, WorkspacePort,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub create_novel_handler: CreateNovelHandler,
    pub select_novel_handler: SelectNovelHandler,
    pub update_novel_handler: UpdateNovelHandler,
    pub delete_novel_handler: DeleteNovelHandler,
    pub stage_back_handler: StageBackHandler,
    pub recommend_config_handler: RecommendConfigHandler,
    pub generate_outline_handler: GenerateOutlineHandler,
    pub plan_chapters_handler: PlanChaptersHandler,
    pub write_chapter_handler: WriteChapterHandler,
    pub streak_write_handler: StreakWriteHandler,
    pub cancel_generation_handler: CancelGenerationHandler,

    // ========== Query Handlers ==========
    pub get_novel_handler: GetNovelHandler,
    pub list_novels_handler: ListNovelsHandler,
    pub get_active_novel_handler: GetActiveNovelHandler,
    pub export_novel_handler: ExportNovelHandler,
    pub generation_status_handler: GetGenerationStatusHandler,
}

/// 构建 AppState 所需的端口和引擎
pub struct AppComponents {
    pub workspace: Arc<dyn WorkspacePort>,
    pub novel_repo: Arc<dyn NovelRepositoryPort>,
    pub persistence: Arc<dyn NovelPersistencePort>,
    pub pending: Arc<dyn PendingWritePort>,
    pub run_manager: Arc<dyn RunManagerPort>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    /// 创建应用状态
    pub fn new(components: AppComponents) -> Self {
        let AppComponents {
            workspace,
            novel_repo,
            persistence,
            pending,
            run_manager,
            orchestrator,
            event_publisher,
        } = components;

        Self {
            event_publisher,

            // Command handlers
            create_novel_handler: CreateNovelHandler::new(workspace.clone(), persistence.clone()),
            select_novel_handler: SelectNovelHandler::new(workspace.clone()),
            update_novel_handler: UpdateNovelHandler::new(
                workspace.clone(),
                pending.clone(),
                run_manager.clone(),
            ),
            delete_novel_handler: DeleteNovelHandler::new(
                workspace.clone(),
                novel_repo,
                pending,
                run_manager.clone(),
            ),
            stage_back_handler: StageBackHandler::new(
                workspace.clone(),
                persistence,
                run_manager.clone(),
            ),
            recommend_config_handler: RecommendConfigHandler::new(
                orchestrator.clone(),
                run_manager.clone(),
            ),
            generate_outline_handler: GenerateOutlineHandler::new(
                orchestrator.clone(),
                run_manager.clone(),
            ),
            plan_chapters_handler: PlanChaptersHandler::new(
                orchestrator.clone(),
                run_manager.clone(),
            ),
            write_chapter_handler: WriteChapterHandler::new(
                orchestrator.clone(),
                run_manager.clone(),
            ),
            streak_write_handler: StreakWriteHandler::new(orchestrator, run_manager.clone()),
            cancel_generation_handler: CancelGenerationHandler::new(run_manager.clone()),

            // Query handlers
            get_novel_handler: GetNovelHandler::new(workspace.clone()),
            list_novels_handler: ListNovelsHandler::new(workspace.clone()),
            get_active_novel_handler: GetActiveNovelHandler::new(workspace.clone()),
            export_novel_handler: ExportNovelHandler::new(workspace),
            generation_status_handler: GetGenerationStatusHandler::new(run_manager),
        }
    }
}

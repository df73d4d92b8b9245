//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（LlmProvider、Workspace、RunManager、Persistence 等）
//! - generation: 生成编排引擎（重试、单步生成、顺序编排）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod generation;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Novel commands
    ChapterEdit,
    CreateNovel,
    DeleteNovel,
    SelectNovel,
    StageBack,
    UpdateNovel,
    // Generation commands
    CancelGeneration,
    GenerateOutline,
    GenerateOutlineResponse,
    PlanChapters,
    RecommendConfig,
    RecommendConfigResponse,
    RunStarted,
    StreakWrite,
    WriteChapter,
    WriteChapterResponse,
    // Handlers
    handlers::{
        CancelGenerationHandler, CreateNovelHandler, DeleteNovelHandler, GenerateOutlineHandler,
        PlanChaptersHandler, RecommendConfigHandler, SelectNovelHandler, StageBackHandler,
        StreakWriteHandler, UpdateNovelHandler, WriteChapterHandler,
    },
};

pub use error::ApplicationError;

pub use generation::{
    ChapterGenerator, GenerationError, GenerationOrchestrator, GeneratorConfig,
    OrchestratorConfig, RetryPolicy, RunEnd, RunOutcome,
};

pub use ports::{
    // LLM provider
    LlmError,
    LlmProviderPort,
    LlmRequest,
    LlmResponse,
    // Progress
    ProgressEvent,
    ProgressFanout,
    ProgressSink,
    RunMode,
    RunStatus,
    // Persistence
    EditScope,
    NovelPersistencePort,
    NovelRepositoryPort,
    PendingWritePort,
    RepositoryError,
    // Run manager
    RunError,
    RunManagerPort,
    RunSnapshot,
    // Workspace
    WorkspacePort,
};

pub use queries::{
    ExportNovel,
    GetActiveNovel,
    GetGenerationStatus,
    GetNovel,
    ListNovels,
    // Handlers
    handlers::{
        ExportNovelHandler, GetActiveNovelHandler, GetGenerationStatusHandler, GetNovelHandler,
        ListNovelsHandler, NovelSummary,
    },
};

//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod llm_provider;
mod progress;
mod repositories;
mod run_manager;
mod workspace;

pub use llm_provider::{
    LlmError, LlmProviderPort, LlmRequest, LlmResponse, OVERLOADED_MARKER, SERVICE_BUSY_STATUS,
};
pub use progress::{ProgressEvent, ProgressFanout, ProgressSink, RunMode, RunStatus};
pub use repositories::{
    EditScope, NovelPersistencePort, NovelRepositoryPort, PendingWritePort, RepositoryError,
};
pub use run_manager::{RunError, RunManagerPort, RunSnapshot};
pub use workspace::WorkspacePort;

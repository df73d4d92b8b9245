//! Memory Layer - In-Memory State Management
//!
//! 实现 Workspace 和 RunManager，管理工作文档和生成任务的内存状态

mod run_manager;
mod workspace;

pub use run_manager::InMemoryRunManager;
pub use workspace::InMemoryWorkspace;

//! 生成编排引擎
//!
//! - retry: 临时过载时指数退避重试
//! - prompts: 提示词与结构化输出 Schema
//! - generator: 单步生成（配置推荐、大纲、章节规划、章节正文）
//! - orchestrator: 顺序编排（章节规划、连续写作），支持协作式取消

mod error;
mod generator;
mod orchestrator;
mod prompts;
mod retry;

pub use error::GenerationError;
pub use generator::{ChapterBody, ChapterGenerator, GeneratorConfig};
pub use orchestrator::{
    ChapterWriteOutcome, GenerationOrchestrator, OrchestratorConfig, RunEnd, RunOutcome, RunState,
};
pub use retry::{RetryPolicy, TransientError};

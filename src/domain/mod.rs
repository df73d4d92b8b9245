//! Domain Layer - 领域层
//!
//! 包含:
//! - Novel Context: 小说、章节、配置与生命周期阶段
//! - Context Window: 章节续写上下文窗口（纯函数）

pub mod novel;

mod context_window;

pub use context_window::{
    build_chapter_context, excerpt, find_streak_start, ContextWindowConfig, NO_PRIOR_CONTEXT,
    PREVIOUS_SYNOPSIS_MARKER,
};

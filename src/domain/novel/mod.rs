//! Novel Context - 小说限界上下文
//!
//! 职责:
//! - 小说聚合管理（配置、大纲、有序章节列表）
//! - 章节实体
//! - 生命周期阶段与局部更新

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::{Novel, NovelPatch};
pub use entities::Chapter;
pub use errors::NovelError;
pub use value_objects::{
    chapter_label, ChapterId, NovelConfig, NovelId, NovelStage, MAX_CHAPTER_COUNT,
};

//! Novel Commands - 小说管理命令

use crate::domain::novel::{ChapterId, NovelConfig, NovelId, NovelStage};

/// 创建小说命令（创建后成为活动小说）
#[derive(Debug, Clone, Default)]
pub struct CreateNovel {
    pub config: Option<NovelConfig>,
}

/// 选择活动小说命令
#[derive(Debug, Clone)]
pub struct SelectNovel {
    pub novel_id: NovelId,
}

/// 单个章节的手动编辑
#[derive(Debug, Clone)]
pub struct ChapterEdit {
    pub chapter_id: ChapterId,
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub content: Option<String>,
}

/// 更新小说命令（用户编辑，延迟写入）
#[derive(Debug, Clone)]
pub struct UpdateNovel {
    pub novel_id: NovelId,
    pub config: Option<NovelConfig>,
    pub outline: Option<String>,
    pub chapters: Vec<ChapterEdit>,
}

/// 删除小说命令
#[derive(Debug, Clone)]
pub struct DeleteNovel {
    pub novel_id: NovelId,
}

/// 回退阶段命令
#[derive(Debug, Clone)]
pub struct StageBack {
    pub novel_id: NovelId,
    pub stage: NovelStage,
}

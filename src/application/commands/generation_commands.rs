//! Generation Commands - 生成相关命令

use crate::application::ports::RunMode;
use crate::domain::novel::{Chapter, NovelConfig, NovelId};

/// 推荐配置命令
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    pub novel_id: NovelId,
}

/// 推荐配置响应
#[derive(Debug, Clone)]
pub struct RecommendConfigResponse {
    pub novel_id: NovelId,
    pub config: NovelConfig,
}

/// 生成大纲命令
#[derive(Debug, Clone)]
pub struct GenerateOutline {
    pub novel_id: NovelId,
}

/// 生成大纲响应
#[derive(Debug, Clone)]
pub struct GenerateOutlineResponse {
    pub novel_id: NovelId,
    pub outline: String,
}

/// 章节规划命令（后台运行）
#[derive(Debug, Clone)]
pub struct PlanChapters {
    pub novel_id: NovelId,
}

/// 撰写单章命令
#[derive(Debug, Clone)]
pub struct WriteChapter {
    pub novel_id: NovelId,
    pub position: usize,
}

/// 撰写单章响应
#[derive(Debug, Clone)]
pub struct WriteChapterResponse {
    pub novel_id: NovelId,
    pub position: usize,
    pub chapter: Chapter,
    /// 服务返回空文本，章节未改动
    pub empty: bool,
}

/// 连续写作命令（后台运行）
#[derive(Debug, Clone)]
pub struct StreakWrite {
    pub novel_id: NovelId,
    /// 选中的章节位置
    pub selected: usize,
    /// 连续写作章数，None 使用默认值
    pub run_length: Option<usize>,
}

/// 后台运行已启动
#[derive(Debug, Clone)]
pub struct RunStarted {
    pub novel_id: NovelId,
    pub mode: RunMode,
}

/// 取消生成命令
#[derive(Debug, Clone)]
pub struct CancelGeneration {
    pub novel_id: NovelId,
}

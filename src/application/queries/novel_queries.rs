//! Novel Queries

use crate::domain::novel::NovelId;

/// 获取小说详情查询
#[derive(Debug, Clone)]
pub struct GetNovel {
    pub novel_id: NovelId,
}

/// 列出所有小说查询
#[derive(Debug, Clone)]
pub struct ListNovels;

/// 获取活动小说查询
#[derive(Debug, Clone)]
pub struct GetActiveNovel;

/// 导出小说（整本 JSON）查询
#[derive(Debug, Clone)]
pub struct ExportNovel {
    pub novel_id: NovelId,
}

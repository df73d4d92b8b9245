//! Workspace Port - 内存中的工作文档
//!
//! 展示层观察、编排器读写的小说集合；同一时刻最多一个活动小说

use crate::domain::novel::{Novel, NovelError, NovelId, NovelPatch};

/// Workspace Port
///
/// 所有更新按 ID 匹配，不按位置；并发更新的顺序由调用方保证
pub trait WorkspacePort: Send + Sync {
    /// 创建空白小说并加入集合
    fn create_empty(&self) -> Novel;

    /// 放入已有小说（启动时从存储恢复）
    fn insert(&self, novel: Novel);

    /// 选择活动小说
    fn select(&self, id: NovelId) -> Result<Novel, NovelError>;

    /// 当前活动小说
    fn active(&self) -> Option<Novel>;

    /// 获取小说快照
    fn get(&self, id: NovelId) -> Result<Novel, NovelError>;

    /// 所有小说（按更新时间倒序）
    fn list(&self) -> Vec<Novel>;

    /// 合并局部更新并刷新时间戳，返回更新后的快照
    fn apply(&self, id: NovelId, patch: NovelPatch) -> Result<Novel, NovelError>;

    /// 删除小说；删除活动小说会清空活动选择
    fn delete(&self, id: NovelId) -> Result<Novel, NovelError>;
}

//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite、目录镜像）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::novel::{Chapter, Novel, NovelId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

// ============================================================================
// Novel Persistence (写入端)
// ============================================================================

/// Novel Persistence Port
///
/// 编排器在每步之后调用；调用方等待完成，但失败不会回滚内存状态，
/// 也不会中断生成流程
#[async_trait]
pub trait NovelPersistencePort: Send + Sync {
    /// 后端名称（用于日志）
    fn backend(&self) -> &'static str;

    /// 保存配置（及阶段）
    async fn save_config(&self, novel: &Novel) -> Result<(), RepositoryError>;

    /// 保存大纲
    async fn save_outline(&self, novel: &Novel) -> Result<(), RepositoryError>;

    /// 保存单个章节，position 为其当前位置
    async fn save_chapter(
        &self,
        novel: &Novel,
        chapter: &Chapter,
        position: usize,
    ) -> Result<(), RepositoryError>;

    /// 按当前顺序重写全部章节
    async fn save_all_chapters(&self, novel: &Novel) -> Result<(), RepositoryError>;
}

/// 一次编辑涉及的部分
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditScope {
    pub config: bool,
    pub outline: bool,
    pub chapters: bool,
}

impl EditScope {
    pub fn merge(self, other: EditScope) -> Self {
        Self {
            config: self.config || other.config,
            outline: self.outline || other.outline,
            chapters: self.chapters || other.chapters,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.config || self.outline || self.chapters)
    }
}

/// Pending Write Port - 用户编辑的延迟写入
///
/// 同一小说的新调度会取消尚未执行的旧调度并合并编辑范围。
/// 写入时读取小说的最新状态，只写入编辑涉及的部分
pub trait PendingWritePort: Send + Sync {
    /// 调度一次延迟写入
    fn schedule(&self, novel_id: NovelId, scope: EditScope);

    /// 放弃尚未执行的写入（删除小说时）
    fn discard(&self, novel_id: NovelId);
}

// ============================================================================
// Novel Repository (读取/删除)
// ============================================================================

/// Novel Repository Port
#[async_trait]
pub trait NovelRepositoryPort: Send + Sync {
    /// 获取所有小说（含章节）
    async fn find_all(&self) -> Result<Vec<Novel>, RepositoryError>;

    /// 根据 ID 查找小说
    async fn find_by_id(&self, id: NovelId) -> Result<Option<Novel>, RepositoryError>;

    /// 删除小说及其章节
    async fn delete(&self, id: NovelId) -> Result<(), RepositoryError>;
}

//! Novel Query Handlers

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::WorkspacePort;
use crate::application::queries::{ExportNovel, GetActiveNovel, GetNovel, ListNovels};
use crate::domain::novel::{Novel, NovelId, NovelStage};

// ============================================================================
// Response DTOs
// ============================================================================

/// 小说列表项
#[derive(Debug, Clone)]
pub struct NovelSummary {
    pub id: NovelId,
    pub title: String,
    pub stage: NovelStage,
    pub chapter_count: usize,
    pub written_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Novel> for NovelSummary {
    fn from(novel: &Novel) -> Self {
        Self {
            id: novel.id(),
            title: novel.title().to_string(),
            stage: novel.stage(),
            chapter_count: novel.chapter_count(),
            written_count: novel.written_count(),
            updated_at: novel.updated_at(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GetNovel Handler
pub struct GetNovelHandler {
    workspace: Arc<dyn WorkspacePort>,
}

impl GetNovelHandler {
    pub fn new(workspace: Arc<dyn WorkspacePort>) -> Self {
        Self { workspace }
    }

    pub fn handle(&self, query: GetNovel) -> Result<Novel, ApplicationError> {
        Ok(self.workspace.get(query.novel_id)?)
    }
}

/// ListNovels Handler
pub struct ListNovelsHandler {
    workspace: Arc<dyn WorkspacePort>,
}

impl ListNovelsHandler {
    pub fn new(workspace: Arc<dyn WorkspacePort>) -> Self {
        Self { workspace }
    }

    pub fn handle(&self, _query: ListNovels) -> Vec<NovelSummary> {
        self.workspace
            .list()
            .iter()
            .map(NovelSummary::from)
            .collect()
    }
}

/// GetActiveNovel Handler
pub struct GetActiveNovelHandler {
    workspace: Arc<dyn WorkspacePort>,
}

impl GetActiveNovelHandler {
    pub fn new(workspace: Arc<dyn WorkspacePort>) -> Self {
        Self { workspace }
    }

    pub fn handle(&self, _query: GetActiveNovel) -> Option<Novel> {
        self.workspace.active()
    }
}

/// ExportNovel Handler - 整本导出为 JSON
pub struct ExportNovelHandler {
    workspace: Arc<dyn WorkspacePort>,
}

impl ExportNovelHandler {
    pub fn new(workspace: Arc<dyn WorkspacePort>) -> Self {
        Self { workspace }
    }

    pub fn handle(&self, query: ExportNovel) -> Result<serde_json::Value, ApplicationError> {
        let novel = self.workspace.get(query.novel_id)?;
        let body = serde_json::to_value(&novel)
            .map_err(|e| ApplicationError::internal(format!("导出失败: {}", e)))?;

        tracing::info!(novel_id = %novel.id(), chapters = novel.chapter_count(), "Novel exported");

        Ok(json!({
            "version": 1,
            "exportedAt": Utc::now().to_rfc3339(),
            "novel": body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::novel::{Chapter, NovelPatch};
    use crate::infrastructure::memory::InMemoryWorkspace;

    #[test]
    fn test_export_contains_ordered_chapters() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        let novel = workspace.create_empty();
        workspace
            .apply(
                novel.id(),
                NovelPatch::chapters(vec![Chapter::planned("甲", "a"), Chapter::planned("乙", "b")]),
            )
            .unwrap();

        let export = ExportNovelHandler::new(workspace)
            .handle(ExportNovel {
                novel_id: novel.id(),
            })
            .unwrap();

        let chapters = export["novel"]["chapters"].as_array().unwrap();
        assert_eq!(chapters[0]["title"], "甲");
        assert_eq!(chapters[1]["title"], "乙");
        assert_eq!(export["version"], 1);
    }

    #[test]
    fn test_list_summarises_progress() {
        let workspace = Arc::new(InMemoryWorkspace::new());
        let novel = workspace.create_empty();
        let mut written = Chapter::planned("甲", "a");
        written.write("正文".to_string());
        workspace
            .apply(
                novel.id(),
                NovelPatch::chapters(vec![written, Chapter::planned("乙", "b")]),
            )
            .unwrap();

        let list = ListNovelsHandler::new(workspace).handle(ListNovels);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].chapter_count, 2);
        assert_eq!(list[0].written_count, 1);
    }
}

//! In-Memory Workspace Implementation

use dashmap::DashMap;
use std::sync::{Arc, RwLock};

use crate::application::ports::WorkspacePort;
use crate::domain::novel::{Novel, NovelError, NovelId, NovelPatch};

/// 内存工作区
pub struct InMemoryWorkspace {
    /// novel_id -> Novel
    novels: DashMap<NovelId, Novel>,
    /// 当前活动小说
    active: RwLock<Option<NovelId>>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self {
            novels: DashMap::new(),
            active: RwLock::new(None),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.novels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.novels.is_empty()
    }

    fn active_id(&self) -> Option<NovelId> {
        match self.active.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_active(&self, id: Option<NovelId>) {
        match self.active.write() {
            Ok(mut guard) => *guard = id,
            Err(poisoned) => *poisoned.into_inner() = id,
        }
    }
}

impl Default for InMemoryWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspacePort for InMemoryWorkspace {
    fn create_empty(&self) -> Novel {
        let novel = Novel::new();
        self.novels.insert(novel.id(), novel.clone());
        tracing::debug!(novel_id = %novel.id(), "Empty novel created");
        novel
    }

    fn insert(&self, novel: Novel) {
        self.novels.insert(novel.id(), novel);
    }

    fn select(&self, id: NovelId) -> Result<Novel, NovelError> {
        let novel = self.get(id)?;
        self.set_active(Some(id));
        Ok(novel)
    }

    fn active(&self) -> Option<Novel> {
        let id = self.active_id()?;
        self.novels.get(&id).map(|n| n.clone())
    }

    fn get(&self, id: NovelId) -> Result<Novel, NovelError> {
        self.novels
            .get(&id)
            .map(|n| n.clone())
            .ok_or(NovelError::NotFound(id))
    }

    fn list(&self) -> Vec<Novel> {
        let mut novels: Vec<Novel> = self.novels.iter().map(|n| n.value().clone()).collect();
        novels.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        novels
    }

    fn apply(&self, id: NovelId, patch: NovelPatch) -> Result<Novel, NovelError> {
        let mut entry = self.novels.get_mut(&id).ok_or(NovelError::NotFound(id))?;
        entry.apply(patch)?;
        Ok(entry.clone())
    }

    fn delete(&self, id: NovelId) -> Result<Novel, NovelError> {
        let (_, novel) = self.novels.remove(&id).ok_or(NovelError::NotFound(id))?;
        if self.active_id() == Some(id) {
            self.set_active(None);
        }
        tracing::debug!(novel_id = %id, "Novel removed from workspace");
        Ok(novel)
    }
}

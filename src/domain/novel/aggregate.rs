//! Novel Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Chapter, ChapterId, NovelConfig, NovelError, NovelId, NovelStage};

/// Novel 聚合根
///
/// 不变量:
/// - 章节 ID 唯一且不复用
/// - 章节顺序即叙事顺序，不会被隐式重排
/// - 阶段只能向前推进，回退必须显式发起
/// - 每次修改都会刷新 updated_at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Novel {
    id: NovelId,
    config: NovelConfig,
    outline: String,
    chapters: Vec<Chapter>,
    stage: NovelStage,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// 局部更新
///
/// 所有字段均可选，apply 时要么全部生效，要么全部不生效
#[derive(Debug, Clone, Default)]
pub struct NovelPatch {
    pub config: Option<NovelConfig>,
    pub outline: Option<String>,
    /// 整体替换章节列表（章节规划）
    pub chapters: Option<Vec<Chapter>>,
    /// 按 ID 替换单个章节
    pub chapter: Option<Chapter>,
    /// 向前推进阶段（已达到或超过时忽略）
    pub advance_to: Option<NovelStage>,
    /// 用户显式回退阶段
    pub rewind_to: Option<NovelStage>,
}

impl NovelPatch {
    pub fn config(config: NovelConfig) -> Self {
        Self {
            config: Some(config),
            ..Default::default()
        }
    }

    pub fn outline(outline: impl Into<String>) -> Self {
        Self {
            outline: Some(outline.into()),
            ..Default::default()
        }
    }

    pub fn chapters(chapters: Vec<Chapter>) -> Self {
        Self {
            chapters: Some(chapters),
            ..Default::default()
        }
    }

    pub fn chapter(chapter: Chapter) -> Self {
        Self {
            chapter: Some(chapter),
            ..Default::default()
        }
    }

    pub fn advance(mut self, stage: NovelStage) -> Self {
        self.advance_to = Some(stage);
        self
    }

    pub fn rewind(stage: NovelStage) -> Self {
        Self {
            rewind_to: Some(stage),
            ..Default::default()
        }
    }
}

impl Novel {
    /// 创建空白小说（setup 阶段）
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: NovelId::new(),
            config: NovelConfig::default(),
            outline: String::new(),
            chapters: Vec::new(),
            stage: NovelStage::Setup,
            created_at: now,
            updated_at: now,
        }
    }

    /// 从存储中恢复
    pub fn restore(
        id: NovelId,
        config: NovelConfig,
        outline: String,
        chapters: Vec<Chapter>,
        stage: NovelStage,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            config,
            outline,
            chapters,
            stage,
            created_at,
            updated_at,
        }
    }

    /// 应用局部更新
    pub fn apply(&mut self, patch: NovelPatch) -> Result<(), NovelError> {
        let mut next = self.clone();
        next.apply_in_place(patch)?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    fn apply_in_place(&mut self, patch: NovelPatch) -> Result<(), NovelError> {
        if let Some(config) = patch.config {
            self.config = config;
        }

        if let Some(outline) = patch.outline {
            self.outline = outline;
        }

        if let Some(chapters) = patch.chapters {
            ensure_unique_ids(&chapters)?;
            self.chapters = chapters;
        }

        if let Some(chapter) = patch.chapter {
            self.replace_chapter(chapter)?;
        }

        if let Some(stage) = patch.rewind_to {
            if stage > self.stage {
                return Err(NovelError::InvalidStageTransition {
                    from: self.stage,
                    to: stage,
                });
            }
            self.stage = stage;
        }

        if let Some(stage) = patch.advance_to {
            if stage > self.stage {
                self.stage = stage;
            }
        }

        Ok(())
    }

    /// 按 ID 替换章节，返回其位置
    fn replace_chapter(&mut self, chapter: Chapter) -> Result<usize, NovelError> {
        let position = self
            .position_of(chapter.id())
            .ok_or(NovelError::ChapterNotFound(chapter.id()))?;
        self.chapters[position] = chapter;
        Ok(position)
    }

    pub fn position_of(&self, chapter_id: ChapterId) -> Option<usize> {
        self.chapters.iter().position(|c| c.id() == chapter_id)
    }

    // Getters
    pub fn id(&self) -> NovelId {
        self.id
    }

    pub fn config(&self) -> &NovelConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn outline(&self) -> &str {
        &self.outline
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn get_chapter(&self, position: usize) -> Option<&Chapter> {
        self.chapters.get(position)
    }

    pub fn stage(&self) -> NovelStage {
        self.stage
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 已写章节数
    pub fn written_count(&self) -> usize {
        self.chapters.iter().filter(|c| c.is_generated()).count()
    }
}

impl Default for Novel {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_unique_ids(chapters: &[Chapter]) -> Result<(), NovelError> {
    let mut seen = HashSet::with_capacity(chapters.len());
    for chapter in chapters {
        if !seen.insert(chapter.id()) {
            return Err(NovelError::DuplicateChapter(chapter.id()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(n: usize) -> Vec<Chapter> {
        (0..n)
            .map(|i| Chapter::planned(format!("章{}", i), format!("梗概{}", i)))
            .collect()
    }

    #[test]
    fn test_new_novel_is_setup() {
        let novel = Novel::new();
        assert_eq!(novel.stage(), NovelStage::Setup);
        assert!(novel.chapters().is_empty());
        assert!(novel.outline().is_empty());
    }

    #[test]
    fn test_apply_refreshes_timestamp() {
        let mut novel = Novel::new();
        let before = novel.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));
        novel.apply(NovelPatch::outline("大纲")).unwrap();
        assert_eq!(novel.outline(), "大纲");
        assert!(novel.updated_at() > before);
    }

    #[test]
    fn test_replace_chapter_by_id() {
        let mut novel = Novel::new();
        let chapters = planned(3);
        let mut target = chapters[1].clone();
        novel.apply(NovelPatch::chapters(chapters)).unwrap();

        target.write("正文".to_string());
        novel.apply(NovelPatch::chapter(target.clone())).unwrap();

        assert_eq!(novel.chapters()[1], target);
        assert!(!novel.chapters()[0].is_generated());
        assert!(!novel.chapters()[2].is_generated());
    }

    #[test]
    fn test_unknown_chapter_rejected_atomically() {
        let mut novel = Novel::new();
        novel.apply(NovelPatch::chapters(planned(2))).unwrap();

        let patch = NovelPatch {
            outline: Some("不应生效".to_string()),
            chapter: Some(Chapter::planned("x", "y")),
            ..Default::default()
        };
        let result = novel.apply(patch);

        assert!(matches!(result, Err(NovelError::ChapterNotFound(_))));
        assert!(novel.outline().is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut novel = Novel::new();
        let chapter = Chapter::planned("a", "b");
        let result = novel.apply(NovelPatch::chapters(vec![chapter.clone(), chapter]));
        assert!(matches!(result, Err(NovelError::DuplicateChapter(_))));
    }

    #[test]
    fn test_stage_only_advances_forward() {
        let mut novel = Novel::new();
        novel
            .apply(NovelPatch::default().advance(NovelStage::ChaptersReady))
            .unwrap();
        novel
            .apply(NovelPatch::default().advance(NovelStage::OutlineReady))
            .unwrap();
        assert_eq!(novel.stage(), NovelStage::ChaptersReady);
    }

    #[test]
    fn test_explicit_rewind() {
        let mut novel = Novel::new();
        novel
            .apply(NovelPatch::default().advance(NovelStage::Writing))
            .unwrap();
        novel.apply(NovelPatch::rewind(NovelStage::OutlineReady)).unwrap();
        assert_eq!(novel.stage(), NovelStage::OutlineReady);

        let result = novel.apply(NovelPatch::rewind(NovelStage::Writing));
        assert!(matches!(
            result,
            Err(NovelError::InvalidStageTransition { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip_keeps_order() {
        let mut novel = Novel::new();
        novel.apply(NovelPatch::chapters(planned(4))).unwrap();
        let json = serde_json::to_string(&novel).unwrap();
        let restored: Novel = serde_json::from_str(&json).unwrap();
        let titles: Vec<&str> = restored.chapters().iter().map(|c| c.title()).collect();
        assert_eq!(titles, vec!["章0", "章1", "章2", "章3"]);
    }
}

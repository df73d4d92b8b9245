//! Novel Context - Entities

use serde::{Deserialize, Serialize};

use super::ChapterId;

/// 章节 - 最小写作单位
///
/// 不变量:
/// - id 在 Novel 内唯一且不复用
/// - 规划时只有标题和梗概，正文为空
/// - is_generated 区分 AI 已撰写与尚未撰写
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    id: ChapterId,
    title: String,
    synopsis: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    is_generated: bool,
}

impl Chapter {
    /// 规划阶段创建：新 ID，正文为空
    pub fn planned(title: impl Into<String>, synopsis: impl Into<String>) -> Self {
        Self {
            id: ChapterId::new(),
            title: title.into(),
            synopsis: synopsis.into(),
            content: String::new(),
            is_generated: false,
        }
    }

    /// 从存储中恢复
    pub fn restore(
        id: ChapterId,
        title: String,
        synopsis: String,
        content: String,
        is_generated: bool,
    ) -> Self {
        Self {
            id,
            title,
            synopsis,
            content,
            is_generated,
        }
    }

    /// 写入生成的正文
    pub fn write(&mut self, content: String) {
        self.content = content;
        self.is_generated = true;
    }

    /// 用户手动编辑（不改变 is_generated）
    pub fn edit(&mut self, title: Option<String>, synopsis: Option<String>, content: Option<String>) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(synopsis) = synopsis {
            self.synopsis = synopsis;
        }
        if let Some(content) = content {
            self.content = content;
        }
    }

    pub fn id(&self) -> ChapterId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn synopsis(&self) -> &str {
        &self.synopsis
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_generated(&self) -> bool {
        self.is_generated
    }

    /// 正文字符数（按 Unicode 字符计）
    pub fn content_chars(&self) -> usize {
        self.content.chars().count()
    }

    /// 正文是否已基本写完
    pub fn is_substantially_written(&self, threshold_chars: usize) -> bool {
        self.content_chars() >= threshold_chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planned_chapter_is_empty() {
        let chapter = Chapter::planned("初入江湖", "少年离家");
        assert!(chapter.content().is_empty());
        assert!(!chapter.is_generated());
    }

    #[test]
    fn test_write_marks_generated() {
        let mut chapter = Chapter::planned("初入江湖", "少年离家");
        chapter.write("正文".to_string());
        assert!(chapter.is_generated());
        assert_eq!(chapter.content_chars(), 2);
    }

    #[test]
    fn test_substantially_written_counts_chars() {
        let mut chapter = Chapter::planned("t", "s");
        chapter.write("字".repeat(499));
        assert!(!chapter.is_substantially_written(500));
        chapter.write("字".repeat(500));
        assert!(chapter.is_substantially_written(500));
    }

    #[test]
    fn test_edit_keeps_generated_flag() {
        let mut chapter = Chapter::planned("t", "s");
        chapter.edit(Some("新标题".to_string()), None, Some("手写".to_string()));
        assert_eq!(chapter.title(), "新标题");
        assert_eq!(chapter.synopsis(), "s");
        assert!(!chapter.is_generated());
    }
}

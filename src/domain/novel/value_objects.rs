//! Novel Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NovelError;

/// 小说唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NovelId(Uuid);

impl NovelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NovelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NovelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 章节唯一标识
///
/// 在小说生命周期内稳定，删除后也不会复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(Uuid);

impl ChapterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChapterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 小说生命周期阶段
///
/// 只能向前推进；回退必须由用户显式发起
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NovelStage {
    /// 填写配置
    Setup,
    /// 大纲已生成
    OutlineReady,
    /// 章节列表已规划
    ChaptersReady,
    /// 正文写作中
    Writing,
}

impl NovelStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            NovelStage::Setup => "setup",
            NovelStage::OutlineReady => "outline_ready",
            NovelStage::ChaptersReady => "chapters_ready",
            NovelStage::Writing => "writing",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "setup" => Some(NovelStage::Setup),
            "outline_ready" => Some(NovelStage::OutlineReady),
            "chapters_ready" => Some(NovelStage::ChaptersReady),
            "writing" => Some(NovelStage::Writing),
            _ => None,
        }
    }
}

impl Default for NovelStage {
    fn default() -> Self {
        NovelStage::Setup
    }
}

impl std::fmt::Display for NovelStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 小说配置
///
/// 生成提示词的输入；只能由用户编辑或自动填充修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelConfig {
    pub title: String,
    pub genre: String,
    pub tone: String,
    /// 主角设定
    pub protagonist: String,
    /// 世界观设定
    pub world_setting: String,
    /// 文风
    pub writing_style: String,
    /// 目标章节数
    pub chapter_count: u32,
    /// 每章目标字数
    pub chapter_length: u32,
    #[serde(default)]
    pub notes: String,
}

impl Default for NovelConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            genre: String::new(),
            tone: String::new(),
            protagonist: String::new(),
            world_setting: String::new(),
            writing_style: String::new(),
            chapter_count: 20,
            chapter_length: 3000,
            notes: String::new(),
        }
    }
}

/// 目标章节数上限
pub const MAX_CHAPTER_COUNT: u32 = 2000;

impl NovelConfig {
    /// 检查数值字段范围
    pub fn check_bounds(&self) -> Result<(), NovelError> {
        if self.chapter_count == 0 {
            return Err(NovelError::InvalidConfig("章节数必须大于 0".to_string()));
        }
        if self.chapter_count > MAX_CHAPTER_COUNT {
            return Err(NovelError::InvalidConfig(format!(
                "章节数不能超过 {}",
                MAX_CHAPTER_COUNT
            )));
        }
        Ok(())
    }

    /// 返回缺失的必填字段名（notes 可为空）
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let text_fields = [
            ("title", &self.title),
            ("genre", &self.genre),
            ("tone", &self.tone),
            ("protagonist", &self.protagonist),
            ("worldSetting", &self.world_setting),
            ("writingStyle", &self.writing_style),
        ];
        for (name, value) in text_fields {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if self.chapter_count == 0 {
            missing.push("chapterCount");
        }
        if self.chapter_length == 0 {
            missing.push("chapterLength");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// 由章节位置推导的标签，位置变化后重新计算
pub fn chapter_label(position: usize) -> String {
    format!("第{}章", position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(NovelStage::Setup < NovelStage::OutlineReady);
        assert!(NovelStage::ChaptersReady < NovelStage::Writing);
        assert_eq!(NovelStage::from_str("writing"), Some(NovelStage::Writing));
        assert_eq!(NovelStage::from_str("unknown"), None);
    }

    #[test]
    fn test_chapter_count_bounds() {
        let mut config = NovelConfig::default();
        assert!(config.check_bounds().is_ok());

        config.chapter_count = 0;
        assert!(matches!(config.check_bounds(), Err(NovelError::InvalidConfig(_))));

        config.chapter_count = MAX_CHAPTER_COUNT;
        assert!(config.check_bounds().is_ok());

        config.chapter_count = u32::MAX;
        assert!(matches!(config.check_bounds(), Err(NovelError::InvalidConfig(_))));
    }

    #[test]
    fn test_default_config_is_incomplete() {
        let config = NovelConfig::default();
        let missing = config.missing_fields();
        assert!(missing.contains(&"title"));
        assert!(!missing.contains(&"chapterCount"));
    }

    #[test]
    fn test_chapter_label_is_one_based() {
        assert_eq!(chapter_label(0), "第1章");
        assert_eq!(chapter_label(2), "第3章");
    }
}

//! 提示词与结构化输出 Schema
//!
//! Schema 采用 generateContent 的 responseSchema 格式（OBJECT/ARRAY/STRING/INTEGER）

use serde_json::{json, Value};

use crate::domain::novel::{chapter_label, Chapter, NovelConfig};

pub const SYSTEM_INSTRUCTION: &str =
    "你是一位经验丰富的中文长篇小说作家，擅长构建世界观、塑造立体的人物，并在长篇连载中保持情节与文风的连贯。";

/// 推荐配置的提示词
pub fn recommend_config_prompt() -> String {
    [
        "请为一部原创中文长篇网络小说构思一套完整的创作设定。",
        "要求题材新颖、主角鲜明、世界观可支撑长篇连载。",
        "chapterCount 取 20 到 200 之间的整数，chapterLength 为每章目标字数，取 2000 到 5000 之间的整数。",
        "notes 可填写额外的创作要点，没有则留空字符串。",
        "只返回符合 Schema 的 JSON 对象，不要附加任何说明。",
    ]
    .join("\n")
}

pub fn config_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "genre": { "type": "STRING" },
            "tone": { "type": "STRING" },
            "protagonist": { "type": "STRING" },
            "worldSetting": { "type": "STRING" },
            "writingStyle": { "type": "STRING" },
            "chapterCount": { "type": "INTEGER" },
            "chapterLength": { "type": "INTEGER" },
            "notes": { "type": "STRING" }
        },
        "required": [
            "title", "genre", "tone", "protagonist", "worldSetting",
            "writingStyle", "chapterCount", "chapterLength"
        ]
    })
}

/// 大纲提示词
pub fn outline_prompt(config: &NovelConfig) -> String {
    format!(
        "{}\n\n请根据以上设定撰写全书大纲，共 {} 章。\n\
         大纲需包含：核心冲突、主要人物关系、分卷（或分阶段）的情节走向、关键转折点与结局方向。\n\
         直接输出大纲正文。",
        describe_config(config),
        config.chapter_count
    )
}

/// 章节规划提示词
///
/// recent 为紧邻 start 之前的已规划章节
pub fn chapter_batch_prompt(
    config: &NovelConfig,
    outline: &str,
    start: usize,
    batch_size: usize,
    recent: &[Chapter],
) -> String {
    let mut prompt = format!("{}\n\n【全书大纲】\n{}\n", describe_config(config), outline);

    if !recent.is_empty() {
        prompt.push_str("\n【已规划的前几章】\n");
        let first_position = start.saturating_sub(recent.len());
        for (offset, chapter) in recent.iter().enumerate() {
            prompt.push_str(&format!(
                "{} {}：{}\n",
                chapter_label(first_position + offset),
                chapter.title(),
                chapter.synopsis()
            ));
        }
    }

    prompt.push_str(&format!(
        "\n请接着规划从{}开始的 {} 章（全书共 {} 章），每章给出标题和 100 字左右的梗概，\
         情节需承接前文并推进大纲。只返回 JSON 数组。",
        chapter_label(start),
        batch_size,
        config.chapter_count
    ));
    prompt
}

pub fn chapter_batch_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "synopsis": { "type": "STRING" }
            },
            "required": ["title", "synopsis"]
        }
    })
}

/// 章节正文提示词
pub fn chapter_content_prompt(
    config: &NovelConfig,
    position: usize,
    chapter: &Chapter,
    context: &str,
    outline: &str,
) -> String {
    format!(
        "{}\n\n【全书大纲（节选）】\n{}\n\n【前文】\n{}\n\n\
         【本章】{} {}\n【本章梗概】{}\n\n\
         请撰写本章正文，约 {} 字。紧接前文自然过渡，不要重复前文内容，不要输出章节标题或任何说明。",
        describe_config(config),
        outline,
        context,
        chapter_label(position),
        chapter.title(),
        chapter.synopsis(),
        config.chapter_length
    )
}

fn describe_config(config: &NovelConfig) -> String {
    let mut text = format!(
        "【小说设定】\n书名：{}\n类型：{}\n基调：{}\n主角：{}\n世界观：{}\n文风：{}",
        config.title,
        config.genre,
        config.tone,
        config.protagonist,
        config.world_setting,
        config.writing_style
    );
    if !config.notes.trim().is_empty() {
        text.push_str(&format!("\n备注：{}", config.notes));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_prompt_labels_recent_chapters_by_position() {
        let config = NovelConfig {
            title: "长夜".to_string(),
            chapter_count: 25,
            ..Default::default()
        };
        let recent = vec![Chapter::planned("甲", "一"), Chapter::planned("乙", "二")];
        let prompt = chapter_batch_prompt(&config, "大纲", 20, 5, &recent);

        assert!(prompt.contains("第19章 甲：一"));
        assert!(prompt.contains("第20章 乙：二"));
        assert!(prompt.contains("从第21章开始的 5 章"));
    }

    #[test]
    fn test_config_schema_requires_all_but_notes() {
        let schema = config_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 8);
        assert!(!required.iter().any(|v| v == "notes"));
    }
}

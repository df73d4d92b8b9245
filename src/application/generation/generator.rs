//! 单步生成器
//!
//! 每次调用都经过 RetryPolicy；负责提示词拼装和结构化输出解析

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::error::GenerationError;
use super::prompts;
use super::retry::RetryPolicy;
use crate::application::ports::{LlmError, LlmProviderPort, LlmRequest};
use crate::domain::excerpt;
use crate::domain::novel::{Chapter, NovelConfig};

/// 生成器配置
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// 模型标识
    pub model: String,
    /// 思考预算（None 表示不设置）
    pub thinking_budget: Option<u32>,
    /// 嵌入提示词的大纲最大字符数
    pub outline_prompt_chars: usize,
    /// 规划时附带的已规划章节数
    pub planning_context_chapters: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            thinking_budget: None,
            outline_prompt_chars: 2000,
            planning_context_chapters: 5,
        }
    }
}

/// 章节正文生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterBody {
    Written(String),
    /// 服务返回了空文本
    Empty,
}

#[derive(Debug, Deserialize)]
struct PlannedEntry {
    title: String,
    synopsis: String,
}

/// 单步生成器
pub struct ChapterGenerator {
    provider: Arc<dyn LlmProviderPort>,
    retry: RetryPolicy,
    config: GeneratorConfig,
}

impl ChapterGenerator {
    pub fn new(
        provider: Arc<dyn LlmProviderPort>,
        retry: RetryPolicy,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            provider,
            retry,
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// 推荐完整配置
    ///
    /// 缺少任一必填字段都视为格式错误，不会用默认值补齐
    pub async fn recommend_config(&self) -> Result<NovelConfig, GenerationError> {
        let request = self.request(
            prompts::recommend_config_prompt(),
            Some(prompts::config_schema()),
        );
        let text = self.call(request).await?;
        let config = parse_config(&text)?;
        tracing::info!(title = %config.title, "Recommended config generated");
        Ok(config)
    }

    /// 生成大纲
    pub async fn generate_outline(&self, config: &NovelConfig) -> Result<String, GenerationError> {
        let request = self.request(prompts::outline_prompt(config), None);
        let text = self.call(request).await?;
        let outline = text.trim().to_string();
        tracing::info!(chars = outline.chars().count(), "Outline generated");
        Ok(outline)
    }

    /// 规划一批章节
    ///
    /// planned 为已规划的全部章节，只取其末尾若干章作为上下文。
    /// 返回结构不合法时降级为空列表；超出 batch_size 的部分被截断
    pub async fn generate_chapter_batch(
        &self,
        config: &NovelConfig,
        outline: &str,
        start: usize,
        batch_size: usize,
        planned: &[Chapter],
    ) -> Result<Vec<Chapter>, GenerationError> {
        let recent_from = planned
            .len()
            .saturating_sub(self.config.planning_context_chapters);
        let prompt = prompts::chapter_batch_prompt(
            config,
            excerpt(outline, self.config.outline_prompt_chars),
            start,
            batch_size,
            &planned[recent_from..],
        );
        let request = self.request(prompt, Some(prompts::chapter_batch_schema()));
        let text = self.call(request).await?;

        let chapters = parse_chapter_batch(&text, batch_size);
        if chapters.len() < batch_size {
            tracing::warn!(
                start,
                requested = batch_size,
                received = chapters.len(),
                "Chapter batch shorter than requested"
            );
        }
        Ok(chapters)
    }

    /// 生成章节正文
    pub async fn generate_chapter_content(
        &self,
        config: &NovelConfig,
        position: usize,
        chapter: &Chapter,
        context: &str,
        outline: &str,
    ) -> Result<ChapterBody, GenerationError> {
        let prompt = prompts::chapter_content_prompt(
            config,
            position,
            chapter,
            context,
            excerpt(outline, self.config.outline_prompt_chars),
        );
        let text = self.call(self.request(prompt, None)).await?;
        let body = text.trim();
        if body.is_empty() {
            return Ok(ChapterBody::Empty);
        }
        Ok(ChapterBody::Written(body.to_string()))
    }

    fn request(&self, prompt: String, response_schema: Option<Value>) -> LlmRequest {
        LlmRequest {
            model: self.config.model.clone(),
            prompt,
            system_instruction: Some(prompts::SYSTEM_INSTRUCTION.to_string()),
            response_schema,
            thinking_budget: self.config.thinking_budget,
        }
    }

    async fn call(&self, request: LlmRequest) -> Result<String, LlmError> {
        self.retry
            .run(|| {
                let request = request.clone();
                async move {
                    let response = self.provider.generate(request).await?;
                    Ok::<_, LlmError>(response.text)
                }
            })
            .await
    }
}

/// 去掉模型偶尔包裹的 ```json 代码块
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn parse_config(text: &str) -> Result<NovelConfig, GenerationError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GenerationError::content_format(format!("配置不是合法的 JSON: {}", e)))?;
    if !value.is_object() {
        return Err(GenerationError::content_format("配置必须是 JSON 对象"));
    }

    let config: NovelConfig = serde_json::from_value(value)
        .map_err(|e| GenerationError::content_format(format!("配置字段不完整: {}", e)))?;

    let missing = config.missing_fields();
    if !missing.is_empty() {
        return Err(GenerationError::content_format(format!(
            "配置缺少字段: {}",
            missing.join(", ")
        )));
    }
    config
        .check_bounds()
        .map_err(|e| GenerationError::content_format(e.to_string()))?;
    Ok(config)
}

fn parse_chapter_batch(text: &str, batch_size: usize) -> Vec<Chapter> {
    let entries: Vec<PlannedEntry> = match serde_json::from_str(strip_code_fence(text)) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Chapter batch is not a list of {{title, synopsis}}");
            return Vec::new();
        }
    };

    if entries.iter().any(|e| e.title.trim().is_empty()) {
        tracing::warn!("Chapter batch contains an untitled entry");
        return Vec::new();
    }

    entries
        .into_iter()
        .take(batch_size)
        .map(|e| Chapter::planned(e.title.trim(), e.synopsis.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::ScriptedLlmClient;
    use std::time::Duration;

    const FULL_CONFIG: &str = r#"{
        "title": "长夜将明",
        "genre": "玄幻",
        "tone": "热血",
        "protagonist": "少年剑客林照",
        "worldSetting": "九州宗门林立",
        "writingStyle": "简洁明快",
        "chapterCount": 30,
        "chapterLength": 3000
    }"#;

    fn generator(client: Arc<ScriptedLlmClient>) -> ChapterGenerator {
        ChapterGenerator::new(
            client,
            RetryPolicy::new(3, Duration::from_millis(10)),
            GeneratorConfig {
                thinking_budget: Some(1024),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_recommend_config_accepts_complete_object() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text(format!("```json\n{}\n```", FULL_CONFIG));

        let config = generator(client.clone()).recommend_config().await.unwrap();

        assert_eq!(config.title, "长夜将明");
        assert_eq!(config.chapter_count, 30);
        assert!(config.notes.is_empty());

        let request = &client.requests()[0];
        assert!(request.response_schema.is_some());
        assert_eq!(request.thinking_budget, Some(1024));
    }

    #[tokio::test]
    async fn test_recommend_config_rejects_missing_field() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text(r#"{"title": "只有书名", "genre": "玄幻"}"#);

        let result = generator(client).recommend_config().await;
        assert!(matches!(result, Err(GenerationError::ContentFormat(_))));
    }

    #[tokio::test]
    async fn test_recommend_config_rejects_blank_field() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text(FULL_CONFIG.replace("九州宗门林立", " "));

        let result = generator(client).recommend_config().await;
        assert!(matches!(result, Err(GenerationError::ContentFormat(_))));
    }

    #[tokio::test]
    async fn test_recommend_config_rejects_oversized_chapter_count() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text(FULL_CONFIG.replace("\"chapterCount\": 30", "\"chapterCount\": 4294967295"));

        let result = generator(client).recommend_config().await;
        assert!(matches!(result, Err(GenerationError::ContentFormat(_))));
    }

    #[tokio::test]
    async fn test_recommend_config_rejects_non_json() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text("抱歉，我无法完成");

        let result = generator(client).recommend_config().await;
        assert!(matches!(result, Err(GenerationError::ContentFormat(_))));
    }

    #[tokio::test]
    async fn test_batch_truncates_to_requested_size() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text(
            r#"[{"title":"一","synopsis":"a"},{"title":"二","synopsis":"b"},{"title":"三","synopsis":"c"}]"#,
        );

        let chapters = generator(client)
            .generate_chapter_batch(&NovelConfig::default(), "大纲", 0, 2, &[])
            .await
            .unwrap();

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1].title(), "二");
        assert!(chapters.iter().all(|c| !c.is_generated() && c.content().is_empty()));
        assert_ne!(chapters[0].id(), chapters[1].id());
    }

    #[tokio::test]
    async fn test_batch_degrades_to_empty_on_bad_shape() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text(r#"{"chapters": []}"#);
        client.push_text(r#"[{"name": "缺标题"}]"#);

        let generator = generator(client);
        for _ in 0..2 {
            let chapters = generator
                .generate_chapter_batch(&NovelConfig::default(), "大纲", 0, 5, &[])
                .await
                .unwrap();
            assert!(chapters.is_empty());
        }
    }

    #[tokio::test]
    async fn test_batch_sends_only_trailing_context() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text("[]");
        let planned: Vec<Chapter> = (0..8)
            .map(|i| Chapter::planned(format!("标题{}", i), "梗概"))
            .collect();

        generator(client.clone())
            .generate_chapter_batch(&NovelConfig::default(), "大纲", 8, 5, &planned)
            .await
            .unwrap();

        let prompt = &client.requests()[0].prompt;
        assert!(!prompt.contains("标题2"));
        assert!(prompt.contains("第4章 标题3"));
        assert!(prompt.contains("第8章 标题7"));
    }

    #[tokio::test]
    async fn test_content_empty_is_distinct() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text("   \n");
        client.push_text("  正文内容  ");

        let generator = generator(client);
        let chapter = Chapter::planned("一", "梗概");
        let config = NovelConfig::default();

        let first = generator
            .generate_chapter_content(&config, 0, &chapter, "前文", "大纲")
            .await
            .unwrap();
        assert_eq!(first, ChapterBody::Empty);

        let second = generator
            .generate_chapter_content(&config, 0, &chapter, "前文", "大纲")
            .await
            .unwrap();
        assert_eq!(second, ChapterBody::Written("正文内容".to_string()));
    }

    #[tokio::test]
    async fn test_outline_is_truncated_in_prompt() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text("正文");
        let generator = ChapterGenerator::new(
            client.clone(),
            RetryPolicy::default(),
            GeneratorConfig {
                outline_prompt_chars: 4,
                ..Default::default()
            },
        );

        generator
            .generate_chapter_content(
                &NovelConfig::default(),
                0,
                &Chapter::planned("一", "s"),
                "前文",
                "甲乙丙丁戊己庚辛",
            )
            .await
            .unwrap();

        let prompt = &client.requests()[0].prompt;
        assert!(prompt.contains("甲乙丙丁"));
        assert!(!prompt.contains("戊"));
    }

    #[tokio::test]
    async fn test_provider_error_after_retries() {
        let client = Arc::new(ScriptedLlmClient::new());
        for _ in 0..4 {
            client.push_error(LlmError::Status {
                status: 503,
                message: "overloaded".to_string(),
            });
        }

        let result = generator(client.clone())
            .generate_outline(&NovelConfig::default())
            .await;

        assert!(matches!(result, Err(GenerationError::Provider(_))));
        assert_eq!(client.call_count(), 4);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  [1] "), "[1]");
    }
}

//! Scripted LLM Client - 用于测试和离线模式的生成客户端
//!
//! 按顺序回放预先排好的回复，并记录收到的每个请求。
//! 队列为空时交给 responder；离线模式的 responder 按请求的 Schema 生成占位内容。

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::ports::{LlmError, LlmProviderPort, LlmRequest, LlmResponse};

type Responder = Box<dyn Fn(&LlmRequest) -> Result<String, LlmError> + Send + Sync>;

/// Scripted LLM Client
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
    responder: Option<Responder>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            responder: None,
        }
    }

    /// 队列为空时使用 responder 生成回复
    pub fn with_responder(
        responder: impl Fn(&LlmRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// 离线模式：不访问网络，按 Schema 返回占位内容
    pub fn offline() -> Self {
        let counter = AtomicUsize::new(0);
        tracing::info!("ScriptedLlmClient running in offline mode");
        Self::with_responder(move |request| {
            let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
            let kind = request
                .response_schema
                .as_ref()
                .and_then(|schema| schema.get("type"))
                .and_then(|t| t.as_str());
            let text = match kind {
                Some("OBJECT") => json!({
                    "title": "离线示例小说",
                    "genre": "奇幻",
                    "tone": "温暖",
                    "protagonist": "一位寻找失落地图的年轻制图师",
                    "worldSetting": "群岛之间靠风帆与灯塔维系的海上王国",
                    "writingStyle": "细腻克制",
                    "chapterCount": 12,
                    "chapterLength": 2000,
                    "notes": ""
                })
                .to_string(),
                Some("ARRAY") => json!([{
                    "title": format!("离线章节 {}", n),
                    "synopsis": "离线模式生成的占位梗概。"
                }])
                .to_string(),
                _ => format!("（离线模式占位文本 #{}）{}", n, "风从海面吹来。".repeat(80)),
            };
            Ok(text)
        })
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.lock_replies().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.lock_replies().push_back(Err(error));
    }

    /// 已收到的请求
    pub fn requests(&self) -> Vec<LlmRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        match self.replies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ScriptedLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProviderPort for ScriptedLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }

        let scripted = self.lock_replies().pop_front();
        let reply = match (scripted, &self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(&request),
            (None, None) => Err(LlmError::InvalidResponse(
                "no scripted reply left".to_string(),
            )),
        };

        tracing::debug!(ok = reply.is_ok(), "ScriptedLlmClient: replying");
        reply.map(|text| LlmResponse { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::generation::{ChapterGenerator, GeneratorConfig, RetryPolicy};
    use crate::domain::novel::NovelConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_replays_in_order_then_errors() {
        let client = ScriptedLlmClient::new();
        client.push_text("一");
        client.push_error(LlmError::Timeout);

        let request = LlmRequest::default();
        assert_eq!(client.generate(request.clone()).await.unwrap().text, "一");
        assert!(matches!(
            client.generate(request.clone()).await,
            Err(LlmError::Timeout)
        ));
        assert!(matches!(
            client.generate(request).await,
            Err(LlmError::InvalidResponse(_))
        ));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_offline_mode_satisfies_generator() {
        let generator = ChapterGenerator::new(
            Arc::new(ScriptedLlmClient::offline()),
            RetryPolicy::default(),
            GeneratorConfig::default(),
        );

        let config = generator.recommend_config().await.unwrap();
        assert!(config.is_complete());

        let batch = generator
            .generate_chapter_batch(&NovelConfig::default(), "大纲", 0, 5, &[])
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
    }
}

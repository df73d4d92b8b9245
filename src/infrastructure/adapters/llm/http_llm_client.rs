//! HTTP LLM Client - 调用 generateContent 风格的文本生成服务
//!
//! 实现 LlmProviderPort trait
//!
//! 外部 API:
//! POST {base_url}/v1beta/models/{model}:generateContent
//! Header: x-goog-api-key
//! Request: {"contents": [...], "systemInstruction": {...}, "generationConfig": {...}}
//! Response: {"candidates": [{"content": {"parts": [{"text": "..."}]}}]}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{LlmError, LlmProviderPort, LlmRequest, LlmResponse};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
    /// 思考过程（不计入输出）
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    thought: bool,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl GenerateContentRequest {
    fn from_request(request: &LlmRequest) -> Self {
        let generation_config = if request.response_schema.is_some() || request.thinking_budget.is_some() {
            Some(GenerationConfig {
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
                thinking_config: request
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            })
        } else {
            None
        };

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                    thought: false,
                }],
            }],
            system_instruction: request.system_instruction.as_ref().map(|text| Content {
                role: None,
                parts: vec![Part {
                    text: text.clone(),
                    thought: false,
                }],
            }),
            generation_config,
        }
    }
}

impl GenerateContentResponse {
    /// 拼接第一个候选的全部非思考文本
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// 从错误响应体中提取可读信息
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP LLM 客户端配置
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// API Key
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            timeout_secs: 300,
        }
    }
}

impl HttpLlmClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP LLM 客户端
pub struct HttpLlmClient {
    client: Client,
    config: HttpLlmClientConfig,
}

impl HttpLlmClient {
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured("llm.api_key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    fn models_url(&self) -> String {
        format!("{}/v1beta/models", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmProviderPort for HttpLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = GenerateContentRequest::from_request(&request);
        let url = self.generate_url(&request.model);

        tracing::debug!(
            url = %url,
            prompt_chars = request.prompt.chars().count(),
            structured = request.response_schema.is_some(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::NetworkError(format!("Cannot connect to provider: {}", e))
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: error_message(&error_text),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to decode response: {}", e)))?;

        if parsed.candidates.is_empty() {
            tracing::warn!(
                feedback = ?parsed.prompt_feedback,
                "Provider returned no candidates"
            );
        }

        let text = parsed.text();
        tracing::info!(
            model = %request.model,
            chars = text.chars().count(),
            finish_reason = ?parsed.candidates.first().and_then(|c| c.finish_reason.as_deref()),
            "Generation completed"
        );

        Ok(LlmResponse { text })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(&self.models_url())
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = LlmRequest {
            model: "m".to_string(),
            prompt: "写一章".to_string(),
            system_instruction: Some("你是作家".to_string()),
            response_schema: Some(json!({"type": "ARRAY"})),
            thinking_budget: Some(512),
        };

        let body = serde_json::to_value(GenerateContentRequest::from_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "写一章");
        assert!(body["contents"][0]["parts"][0].get("thought").is_none());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "你是作家");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 512);
    }

    #[test]
    fn test_plain_request_omits_generation_config() {
        let request = LlmRequest {
            model: "m".to_string(),
            prompt: "p".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(GenerateContentRequest::from_request(&request)).unwrap();
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "先想一想", "thought": true},
                    {"text": "正文上"},
                    {"text": "正文下"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "正文上正文下");
    }

    #[test]
    fn test_blocked_response_is_empty_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(response.text(), "");
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}}"#;
        assert_eq!(error_message(body), "The model is overloaded.");
        assert_eq!(error_message(" bad gateway "), "bad gateway");
    }

    #[test]
    fn test_missing_api_key_is_not_configured() {
        let result = HttpLlmClient::new(HttpLlmClientConfig::default());
        assert!(matches!(result, Err(LlmError::NotConfigured(_))));
    }

    #[test]
    fn test_generate_url() {
        let client =
            HttpLlmClient::new(HttpLlmClientConfig::new("http://localhost:9000/", "k")).unwrap();
        assert_eq!(
            client.generate_url("gemini-2.5-flash"),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}

//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::{GeneratorConfig, OrchestratorConfig, RetryPolicy};
use crate::domain::ContextWindowConfig;

/// llm.base_url 取该值时使用离线占位生成，不访问网络
pub const OFFLINE_BASE_URL: &str = "scripted";

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 生成服务配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 生成编排配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 目录镜像配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 延迟写入配置
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// 服务基础 URL；"scripted" 表示离线模式
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// 思考预算，不设置时由服务端决定
    #[serde(default)]
    pub thinking_budget: Option<u32>,
}

fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_llm_timeout() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            thinking_budget: None,
        }
    }
}

impl LlmConfig {
    pub fn is_offline(&self) -> bool {
        self.base_url == OFFLINE_BASE_URL
    }
}

/// 生成编排配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 首次重试等待（毫秒），之后每次翻倍
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// 相邻两步之间的停顿（毫秒）
    #[serde(default = "default_step_pause_ms")]
    pub step_pause_ms: u64,

    #[serde(default = "default_streak_length")]
    pub streak_length: usize,

    #[serde(default = "default_written_threshold_chars")]
    pub written_threshold_chars: usize,

    #[serde(default = "default_outline_prompt_chars")]
    pub outline_prompt_chars: usize,

    #[serde(default = "default_planning_context_chapters")]
    pub planning_context_chapters: usize,

    #[serde(default = "default_max_empty_batches")]
    pub max_empty_batches: usize,

    /// 上一章正文少于该字符数时改用梗概作为前文
    #[serde(default = "default_min_body_chars")]
    pub min_body_chars: usize,

    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    2000
}

fn default_batch_size() -> usize {
    20
}

fn default_step_pause_ms() -> u64 {
    500
}

fn default_streak_length() -> usize {
    10
}

fn default_written_threshold_chars() -> usize {
    500
}

fn default_outline_prompt_chars() -> usize {
    2000
}

fn default_planning_context_chapters() -> usize {
    5
}

fn default_max_empty_batches() -> usize {
    2
}

fn default_min_body_chars() -> usize {
    50
}

fn default_max_context_chars() -> usize {
    3000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            batch_size: default_batch_size(),
            step_pause_ms: default_step_pause_ms(),
            streak_length: default_streak_length(),
            written_threshold_chars: default_written_threshold_chars(),
            outline_prompt_chars: default_outline_prompt_chars(),
            planning_context_chapters: default_planning_context_chapters(),
            max_empty_batches: default_max_empty_batches(),
            min_body_chars: default_min_body_chars(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

impl GenerationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            batch_size: self.batch_size,
            step_pause: Duration::from_millis(self.step_pause_ms),
            streak_length: self.streak_length,
            written_threshold_chars: self.written_threshold_chars,
            max_empty_batches: self.max_empty_batches,
            context: ContextWindowConfig {
                min_body_chars: self.min_body_chars,
                max_context_chars: self.max_context_chars,
            },
        }
    }

    pub fn generator(&self, llm: &LlmConfig) -> GeneratorConfig {
        GeneratorConfig {
            model: llm.model.clone(),
            thinking_budget: llm.thinking_budget,
            outline_prompt_chars: self.outline_prompt_chars,
            planning_context_chapters: self.planning_context_chapters,
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/novelist.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 目录镜像配置（用户授权的导出目录）
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default)]
    pub mirror_enabled: bool,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("data/novels")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
            mirror_enabled: false,
        }
    }
}

/// 延迟写入配置
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// 用户编辑后等待多久再写入（毫秒）
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    1000
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl PersistenceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "NOVELIST";

/// 加载应用配置
///
/// # 环境变量示例
/// - `NOVELIST_SERVER__PORT=8080`
/// - `NOVELIST_LLM__API_KEY=...`
/// - `NOVELIST_LLM__BASE_URL=scripted`（离线模式）
/// - `NOVELIST_GENERATION__BATCH_SIZE=10`
/// - `NOVELIST_STORAGE__MIRROR_ENABLED=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// config_path 为 None 时搜索工作目录下的默认配置文件
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: NOVELIST_LLM__MODEL=gemini-2.5-pro
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    // 缺省字段由 serde 默认值补齐
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.llm.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "LLM base URL cannot be empty".to_string(),
        ));
    }

    if !config.llm.is_offline() && config.llm.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "LLM API key is required (set {}_LLM__API_KEY, or LLM base URL \"scripted\" for offline mode)",
            ENV_PREFIX
        )));
    }

    if config.generation.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "Generation batch size must be greater than 0".to_string(),
        ));
    }

    if config.generation.streak_length == 0 {
        return Err(ConfigError::ValidationError(
            "Streak length must be greater than 0".to_string(),
        ));
    }

    if config.generation.max_context_chars == 0 {
        return Err(ConfigError::ValidationError(
            "Context window cannot be empty".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.llm.is_offline() {
        tracing::info!("LLM: offline (scripted)");
    } else {
        tracing::info!("LLM: {} model={}", config.llm.base_url, config.llm.model);
        tracing::info!("LLM Timeout: {}s", config.llm.timeout_secs);
    }
    if let Some(budget) = config.llm.thinking_budget {
        tracing::info!("Thinking Budget: {}", budget);
    }
    tracing::info!(
        "Retry: max={} base_delay={}ms",
        config.generation.max_retries,
        config.generation.retry_base_delay_ms
    );
    tracing::info!(
        "Planning: batch={} empty_batch_limit={}",
        config.generation.batch_size,
        config.generation.max_empty_batches
    );
    tracing::info!(
        "Streak: length={} written_threshold={} chars",
        config.generation.streak_length,
        config.generation.written_threshold_chars
    );
    tracing::info!("Database: {}", config.database.path);
    if config.storage.mirror_enabled {
        tracing::info!("Directory Mirror: {:?}", config.storage.export_dir);
    }
    tracing::info!("Edit Debounce: {}ms", config.persistence.debounce_ms);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

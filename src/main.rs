//! Novelist - 长篇小说生成编排引擎
//!
//! 启动顺序：配置 → 日志 → 数据库 → 恢复工作区 → 生成引擎 → HTTP 服务

use std::sync::Arc;

use novelist::application::{
    ChapterGenerator, GenerationOrchestrator, LlmProviderPort, NovelPersistencePort,
    NovelRepositoryPort, ProgressFanout, ProgressSink, WorkspacePort,
};
use novelist::config::{load_config, print_config, AppConfig, LogConfig};
use novelist::infrastructure::adapters::{
    DirectoryNovelStore, HttpLlmClient, HttpLlmClientConfig, ScriptedLlmClient,
};
use novelist::infrastructure::events::EventPublisher;
use novelist::infrastructure::http::state::AppComponents;
use novelist::infrastructure::http::{AppState, HttpServer, ServerConfig};
use novelist::infrastructure::memory::{InMemoryRunManager, InMemoryWorkspace};
use novelist::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteNovelRepository,
};
use novelist::infrastructure::persistence::{CompositePersistence, DebouncedPersistence};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Novelist - 长篇小说生成编排引擎");
    print_config(&config);

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;
    let novel_repo = Arc::new(SqliteNovelRepository::new(pool));

    // 从数据库恢复工作区
    let workspace = InMemoryWorkspace::new().arc();
    let novels = novel_repo.find_all().await?;
    tracing::info!(count = novels.len(), "Workspace restored");
    for novel in novels {
        workspace.insert(novel);
    }

    let persistence = build_persistence(&config, novel_repo.clone()).await?;
    let pending = DebouncedPersistence::new(
        persistence.clone(),
        workspace.clone(),
        config.persistence.debounce(),
    )
    .arc();

    // 生成引擎
    let provider = build_provider(&config).await?;
    let generator = Arc::new(ChapterGenerator::new(
        provider,
        config.generation.retry_policy(),
        config.generation.generator(&config.llm),
    ));

    let event_publisher = EventPublisher::new().arc();
    let run_manager = InMemoryRunManager::new().arc();
    let progress = Arc::new(ProgressFanout::new(vec![
        event_publisher.clone() as Arc<dyn ProgressSink>,
        run_manager.clone() as Arc<dyn ProgressSink>,
    ]));

    let orchestrator = Arc::new(GenerationOrchestrator::new(
        generator,
        workspace.clone(),
        persistence.clone(),
        progress,
        config.generation.orchestrator(),
    ));

    let state = AppState::new(AppComponents {
        workspace,
        novel_repo,
        persistence,
        pending: pending.clone(),
        run_manager: run_manager.clone(),
        orchestrator,
        event_publisher,
    });

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, Arc::new(state));

    server.run_with_shutdown(shutdown_signal()).await?;

    // 停止后台任务并写入尚未落盘的编辑
    let cancelled = run_manager.cancel_all();
    if cancelled > 0 {
        tracing::info!(cancelled, "Cancelled running generations");
    }
    pending.flush_all().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 初始化日志
fn init_tracing(log: &LogConfig) {
    let default_filter = format!("{},novelist={},tower_http=info", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&default_filter));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// SQLite 始终启用；目录镜像按配置追加
async fn build_persistence(
    config: &AppConfig,
    novel_repo: Arc<SqliteNovelRepository>,
) -> anyhow::Result<Arc<dyn NovelPersistencePort>> {
    let mut backends: Vec<Arc<dyn NovelPersistencePort>> = vec![novel_repo as Arc<dyn NovelPersistencePort>];

    if config.storage.mirror_enabled {
        let store = DirectoryNovelStore::new(&config.storage.export_dir).await?;
        tracing::info!(dir = ?store.base_dir(), "Directory mirror enabled");
        backends.push(Arc::new(store));
    }

    let composite = CompositePersistence::new(backends);
    tracing::info!(backends = ?composite.backend_names(), "Persistence ready");
    Ok(Arc::new(composite))
}

async fn build_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmProviderPort>> {
    if config.llm.is_offline() {
        return Ok(Arc::new(ScriptedLlmClient::offline()));
    }

    let client_config = HttpLlmClientConfig::new(&config.llm.base_url, &config.llm.api_key)
        .with_timeout(config.llm.timeout_secs);
    let client = HttpLlmClient::new(client_config)?;

    if !client.health_check().await {
        // 服务暂时不可达时仍然启动，生成请求会走重试
        tracing::warn!(base_url = %config.llm.base_url, "LLM service health check failed");
    }
    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}

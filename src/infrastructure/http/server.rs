//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::request_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 请求体上限（整本小说的编辑请求）
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5070,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 构建带中间件的 Router
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    create_routes()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);
        let addr = self.config.addr();

        let listener = TcpListener::bind(&addr).await?;
        info!("HTTP server listening on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        ChapterGenerator, GenerationOrchestrator, GeneratorConfig, NovelPersistencePort,
        OrchestratorConfig, ProgressFanout, ProgressSink, RetryPolicy,
    };
    use crate::infrastructure::adapters::ScriptedLlmClient;
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::http::state::AppComponents;
    use crate::infrastructure::memory::{InMemoryRunManager, InMemoryWorkspace};
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteNovelRepository,
    };
    use crate::infrastructure::persistence::{CompositePersistence, DebouncedPersistence};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn test_router() -> Router {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = Arc::new(SqliteNovelRepository::new(pool));

        let workspace = InMemoryWorkspace::new().arc();
        let run_manager = InMemoryRunManager::new().arc();
        let publisher = EventPublisher::new().arc();
        let persistence = Arc::new(CompositePersistence::new(vec![
            repo.clone() as Arc<dyn NovelPersistencePort>
        ]));
        let pending = DebouncedPersistence::new(
            persistence.clone(),
            workspace.clone(),
            Duration::from_millis(50),
        )
        .arc();

        let generator = Arc::new(ChapterGenerator::new(
            Arc::new(ScriptedLlmClient::offline()),
            RetryPolicy::new(0, Duration::ZERO),
            GeneratorConfig::default(),
        ));
        let progress = Arc::new(ProgressFanout::new(vec![
            publisher.clone() as Arc<dyn ProgressSink>,
            run_manager.clone() as Arc<dyn ProgressSink>,
        ]));
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            generator,
            workspace.clone(),
            persistence.clone(),
            progress,
            OrchestratorConfig {
                step_pause: Duration::ZERO,
                ..Default::default()
            },
        ));

        let state = AppState::new(AppComponents {
            workspace,
            novel_repo: repo,
            persistence,
            pending,
            run_manager,
            orchestrator,
            event_publisher: publisher,
        });
        build_router(Arc::new(state))
    }

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Value {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sample_config() -> Value {
        json!({
            "title": "雾港",
            "genre": "悬疑",
            "tone": "阴郁",
            "protagonist": "退休的灯塔看守",
            "worldSetting": "常年起雾的港口小镇",
            "writingStyle": "冷静克制",
            "chapterCount": 3,
            "chapterLength": 2000
        })
    }

    #[tokio::test]
    async fn test_ping() {
        let router = test_router().await;
        let body = call(&router, Method::GET, "/api/ping", None).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["novels"], 0);
    }

    #[tokio::test]
    async fn test_create_update_and_list() {
        let router = test_router().await;

        let created = call(
            &router,
            Method::POST,
            "/api/novel/create",
            Some(json!({ "config": sample_config() })),
        )
        .await;
        assert_eq!(created["errno"], 0);
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let updated = call(
            &router,
            Method::POST,
            "/api/novel/update",
            Some(json!({ "id": id, "outline": "第一幕：雾起。" })),
        )
        .await;
        assert_eq!(updated["data"]["outline"], "第一幕：雾起。");

        let active = call(&router, Method::GET, "/api/novel/active", None).await;
        assert_eq!(active["data"]["id"], id.as_str());

        let list = call(&router, Method::GET, "/api/novel/list", None).await;
        assert_eq!(list["data"].as_array().unwrap().len(), 1);
        assert_eq!(list["data"][0]["title"], "雾港");
    }

    #[tokio::test]
    async fn test_unknown_novel_reports_not_found() {
        let router = test_router().await;
        let body = call(
            &router,
            Method::POST,
            "/api/novel/get",
            Some(json!({ "id": uuid::Uuid::new_v4() })),
        )
        .await;
        assert_eq!(body["errno"], 404);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_writing_requires_planned_chapters() {
        let router = test_router().await;
        let created = call(&router, Method::POST, "/api/novel/create", Some(json!({}))).await;
        let id = created["data"]["id"].clone();

        let body = call(
            &router,
            Method::POST,
            "/api/generate/chapter",
            Some(json!({ "id": id, "position": 0 })),
        )
        .await;
        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_cancel_without_run_is_rejected() {
        let router = test_router().await;
        let created = call(&router, Method::POST, "/api/novel/create", Some(json!({}))).await;
        let id = created["data"]["id"].clone();

        let body = call(&router, Method::POST, "/api/generate/cancel", Some(json!({ "id": id }))).await;
        assert_ne!(body["errno"], 0);
    }

    #[tokio::test]
    async fn test_outline_then_background_planning() {
        let router = test_router().await;
        let created = call(
            &router,
            Method::POST,
            "/api/novel/create",
            Some(json!({ "config": sample_config() })),
        )
        .await;
        let id = created["data"]["id"].clone();

        let outline = call(&router, Method::POST, "/api/generate/outline", Some(json!({ "id": id }))).await;
        assert_eq!(outline["errno"], 0);
        assert!(!outline["data"]["outline"].as_str().unwrap().is_empty());

        let started = call(&router, Method::POST, "/api/generate/chapters", Some(json!({ "id": id }))).await;
        assert_eq!(started["data"]["mode"], "planning");

        let mut running = true;
        for _ in 0..100 {
            let status = call(&router, Method::POST, "/api/generate/status", Some(json!({ "id": id }))).await;
            running = status["data"]["running"].as_bool().unwrap();
            if !running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!running);

        let novel = call(&router, Method::POST, "/api/novel/get", Some(json!({ "id": id }))).await;
        assert_eq!(novel["data"]["stage"], "chapters_ready");
        assert_eq!(novel["data"]["chapters"].as_array().unwrap().len(), 3);
    }
}

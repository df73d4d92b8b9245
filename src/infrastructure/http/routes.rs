//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/novel/create         POST  创建小说（成为活动小说）
//! - /api/novel/list           GET   列出所有小说
//! - /api/novel/get            POST  获取小说详情
//! - /api/novel/select         POST  选择活动小说
//! - /api/novel/active         GET   当前活动小说
//! - /api/novel/update         POST  用户编辑（延迟写入）
//! - /api/novel/delete         POST  删除小说
//! - /api/novel/export         POST  导出整本 JSON
//! - /api/novel/stage_back     POST  回退阶段
//! - /api/generate/config      POST  推荐配置
//! - /api/generate/outline     POST  生成大纲
//! - /api/generate/chapters    POST  章节规划（后台）
//! - /api/generate/chapter     POST  撰写单章
//! - /api/generate/streak      POST  连续写作（后台）
//! - /api/generate/cancel      POST  取消生成
//! - /api/generate/status      POST  生成任务状态
//! - /ws/events                WS    生成事件推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/novel", novel_routes())
        .nest("/generate", generate_routes())
}

/// Novel 路由
fn novel_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_novel))
        .route("/list", get(handlers::list_novels))
        .route("/get", post(handlers::get_novel))
        .route("/select", post(handlers::select_novel))
        .route("/active", get(handlers::active_novel))
        .route("/update", post(handlers::update_novel))
        .route("/delete", post(handlers::delete_novel))
        .route("/export", post(handlers::export_novel))
        .route("/stage_back", post(handlers::stage_back))
}

/// Generation 路由
fn generate_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/config", post(handlers::recommend_config))
        .route("/outline", post(handlers::generate_outline))
        .route("/chapters", post(handlers::plan_chapters))
        .route("/chapter", post(handlers::write_chapter))
        .route("/streak", post(handlers::streak_write))
        .route("/cancel", post(handlers::cancel_generation))
        .route("/status", post(handlers::generation_status))
}

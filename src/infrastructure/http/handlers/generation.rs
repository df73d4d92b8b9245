//! Generation HTTP Handlers
//!
//! 配置推荐、大纲和单章写作同步返回结果；
//! 章节规划和连续写作立即返回，进度通过 /ws/events 推送

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    CancelGeneration, GenerateOutline, GetGenerationStatus, PlanChapters, RecommendConfig,
    StreakWrite, WriteChapter,
};
use crate::domain::novel::NovelId;
use crate::infrastructure::http::dto::{
    ApiResponse, ChapterResponse, ConfigResponse, Empty, GenerationStatusResponse,
    NovelIdRequest, OutlineResponse, RunStartedResponse, StreakWriteRequest, WriteChapterRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 推荐配置
pub async fn recommend_config(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<ConfigResponse>>, ApiError> {
    let result = state
        .recommend_config_handler
        .handle(RecommendConfig {
            novel_id: NovelId::from_uuid(req.id),
        })
        .await?;

    Ok(Json(ApiResponse::success(ConfigResponse {
        id: *result.novel_id.as_uuid(),
        config: result.config,
    })))
}

/// 生成大纲
pub async fn generate_outline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<OutlineResponse>>, ApiError> {
    let result = state
        .generate_outline_handler
        .handle(GenerateOutline {
            novel_id: NovelId::from_uuid(req.id),
        })
        .await?;

    Ok(Json(ApiResponse::success(OutlineResponse {
        id: *result.novel_id.as_uuid(),
        outline: result.outline,
    })))
}

/// 启动章节规划（后台运行）
pub async fn plan_chapters(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<RunStartedResponse>>, ApiError> {
    let started = state.plan_chapters_handler.handle(PlanChapters {
        novel_id: NovelId::from_uuid(req.id),
    })?;

    Ok(Json(ApiResponse::success(started.into())))
}

/// 撰写（或重写）单章
pub async fn write_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WriteChapterRequest>,
) -> Result<Json<ApiResponse<ChapterResponse>>, ApiError> {
    let result = state
        .write_chapter_handler
        .handle(WriteChapter {
            novel_id: NovelId::from_uuid(req.id),
            position: req.position,
        })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// 启动连续写作（后台运行）
pub async fn streak_write(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StreakWriteRequest>,
) -> Result<Json<ApiResponse<RunStartedResponse>>, ApiError> {
    let started = state.streak_write_handler.handle(StreakWrite {
        novel_id: NovelId::from_uuid(req.id),
        selected: req.selected,
        run_length: req.run_length,
    })?;

    Ok(Json(ApiResponse::success(started.into())))
}

/// 请求取消当前生成任务
pub async fn cancel_generation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.cancel_generation_handler.handle(CancelGeneration {
        novel_id: NovelId::from_uuid(req.id),
    })?;

    Ok(Json(ApiResponse::ok()))
}

/// 查询生成任务状态
pub async fn generation_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<GenerationStatusResponse>>, ApiError> {
    let run = state.generation_status_handler.handle(GetGenerationStatus {
        novel_id: NovelId::from_uuid(req.id),
    });

    Ok(Json(ApiResponse::success(GenerationStatusResponse {
        running: run.is_some(),
        run,
    })))
}

//! Novel HTTP Handlers
//!
//! 小说的创建、选择、编辑、删除和导出。修改类操作成功后通过 /ws/events 广播

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    CreateNovel, DeleteNovel, ExportNovel, GetActiveNovel, GetNovel, ListNovels, SelectNovel,
    StageBack, UpdateNovel,
};
use crate::domain::novel::{Novel, NovelId};
use crate::infrastructure::http::dto::{
    ApiResponse, CreateNovelRequest, DeleteNovelResponse, NovelIdRequest, NovelSummaryResponse,
    StageBackRequest, UpdateNovelRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 创建小说（成为活动小说）
pub async fn create_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNovelRequest>,
) -> Result<Json<ApiResponse<Novel>>, ApiError> {
    let novel = state
        .create_novel_handler
        .handle(CreateNovel { config: req.config })
        .await?;

    state
        .event_publisher
        .publish_novel_updated(novel.id(), novel.stage());
    Ok(Json(ApiResponse::success(novel)))
}

/// 获取小说列表
pub async fn list_novels(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<NovelSummaryResponse>>>, ApiError> {
    let summaries = state
        .list_novels_handler
        .handle(ListNovels)
        .into_iter()
        .map(NovelSummaryResponse::from)
        .collect();

    Ok(Json(ApiResponse::success(summaries)))
}

/// 获取小说详情
pub async fn get_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<Novel>>, ApiError> {
    let novel = state.get_novel_handler.handle(GetNovel {
        novel_id: NovelId::from_uuid(req.id),
    })?;

    Ok(Json(ApiResponse::success(novel)))
}

/// 选择活动小说
pub async fn select_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<Novel>>, ApiError> {
    let novel = state.select_novel_handler.handle(SelectNovel {
        novel_id: NovelId::from_uuid(req.id),
    })?;

    Ok(Json(ApiResponse::success(novel)))
}

/// 当前活动小说（没有时 data 为 null）
pub async fn active_novel(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Option<Novel>>>, ApiError> {
    let novel = state.get_active_novel_handler.handle(GetActiveNovel);
    Ok(Json(ApiResponse::success(novel)))
}

/// 用户编辑（配置、大纲、章节），持久化延迟执行
pub async fn update_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateNovelRequest>,
) -> Result<Json<ApiResponse<Novel>>, ApiError> {
    let command = UpdateNovel {
        novel_id: NovelId::from_uuid(req.id),
        config: req.config,
        outline: req.outline,
        chapters: req.chapters.into_iter().map(Into::into).collect(),
    };

    let novel = state.update_novel_handler.handle(command).await?;

    state
        .event_publisher
        .publish_novel_updated(novel.id(), novel.stage());
    Ok(Json(ApiResponse::success(novel)))
}

/// 删除小说
pub async fn delete_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<DeleteNovelResponse>>, ApiError> {
    let novel = state
        .delete_novel_handler
        .handle(DeleteNovel {
            novel_id: NovelId::from_uuid(req.id),
        })
        .await?;

    state.event_publisher.publish_novel_deleted(novel.id());
    Ok(Json(ApiResponse::success(DeleteNovelResponse {
        id: *novel.id().as_uuid(),
    })))
}

/// 导出整本小说 JSON
pub async fn export_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelIdRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let document = state.export_novel_handler.handle(ExportNovel {
        novel_id: NovelId::from_uuid(req.id),
    })?;

    Ok(Json(ApiResponse::success(document)))
}

/// 显式回退阶段
pub async fn stage_back(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StageBackRequest>,
) -> Result<Json<ApiResponse<Novel>>, ApiError> {
    let novel = state
        .stage_back_handler
        .handle(StageBack {
            novel_id: NovelId::from_uuid(req.id),
            stage: req.stage,
        })
        .await?;

    state
        .event_publisher
        .publish_novel_updated(novel.id(), novel.stage());
    Ok(Json(ApiResponse::success(novel)))
}

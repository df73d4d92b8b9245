//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{
    ChapterEdit, NovelSummary, RunMode, RunSnapshot, RunStarted, WriteChapterResponse,
};
use crate::domain::novel::{chapter_label, Chapter, ChapterId, NovelConfig, NovelStage};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Novel DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NovelIdRequest {
    pub id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateNovelRequest {
    #[serde(default)]
    pub config: Option<NovelConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterEditRequest {
    pub id: Uuid,
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub content: Option<String>,
}

impl From<ChapterEditRequest> for ChapterEdit {
    fn from(req: ChapterEditRequest) -> Self {
        Self {
            chapter_id: ChapterId::from_uuid(req.id),
            title: req.title,
            synopsis: req.synopsis,
            content: req.content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateNovelRequest {
    pub id: Uuid,
    pub config: Option<NovelConfig>,
    pub outline: Option<String>,
    #[serde(default)]
    pub chapters: Vec<ChapterEditRequest>,
}

#[derive(Debug, Deserialize)]
pub struct StageBackRequest {
    pub id: Uuid,
    pub stage: NovelStage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub stage: NovelStage,
    pub chapter_count: usize,
    pub written_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<NovelSummary> for NovelSummaryResponse {
    fn from(summary: NovelSummary) -> Self {
        Self {
            id: *summary.id.as_uuid(),
            title: summary.title,
            stage: summary.stage,
            chapter_count: summary.chapter_count,
            written_count: summary.written_count,
            updated_at: summary.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteNovelResponse {
    pub id: Uuid,
}

// ============================================================================
// Generation DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WriteChapterRequest {
    pub id: Uuid,
    pub position: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakWriteRequest {
    pub id: Uuid,
    pub selected: usize,
    #[serde(default)]
    pub run_length: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub id: Uuid,
    pub config: NovelConfig,
}

#[derive(Debug, Serialize)]
pub struct OutlineResponse {
    pub id: Uuid,
    pub outline: String,
}

#[derive(Debug, Serialize)]
pub struct ChapterResponse {
    pub id: Uuid,
    pub position: usize,
    pub label: String,
    pub chapter: Chapter,
    pub empty: bool,
}

impl From<WriteChapterResponse> for ChapterResponse {
    fn from(result: WriteChapterResponse) -> Self {
        Self {
            id: *result.novel_id.as_uuid(),
            position: result.position,
            label: chapter_label(result.position),
            chapter: result.chapter,
            empty: result.empty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunStartedResponse {
    pub id: Uuid,
    pub mode: RunMode,
}

impl From<RunStarted> for RunStartedResponse {
    fn from(started: RunStarted) -> Self {
        Self {
            id: *started.novel_id.as_uuid(),
            mode: started.mode,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationStatusResponse {
    pub running: bool,
    pub run: Option<RunSnapshot>,
}

//! 顺序编排器
//!
//! 两种多步模式:
//! - 章节规划：按批次生成标题和梗概，直到达到目标章节数
//! - 连续写作：从选中位置起逐章撰写正文
//!
//! 每一步完成后依次：合并到工作副本 → 持久化 → 上报进度。
//! 取消只在迭代边界检查，正在进行的那一章会写完。

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::error::GenerationError;
use super::generator::{ChapterBody, ChapterGenerator};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    NovelPersistencePort, ProgressEvent, ProgressSink, RunMode, RunStatus, WorkspacePort,
};
use crate::domain::novel::{
    chapter_label, Chapter, Novel, NovelConfig, NovelId, NovelPatch, NovelStage,
};
use crate::domain::{build_chapter_context, find_streak_start, ContextWindowConfig};

/// 编排配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 每批规划的章节数
    pub batch_size: usize,
    /// 相邻两步之间的停顿
    pub step_pause: Duration,
    /// 连续写作默认章数
    pub streak_length: usize,
    /// 正文达到该字符数视为已写完
    pub written_threshold_chars: usize,
    /// 连续空批次上限，超过后规划失败
    pub max_empty_batches: usize,
    pub context: ContextWindowConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            step_pause: Duration::from_millis(500),
            streak_length: 10,
            written_threshold_chars: 500,
            max_empty_batches: 2,
            context: ContextWindowConfig::default(),
        }
    }
}

/// 单次运行的状态机
///
/// idle → running → (cancelling | erroring | exhausted) → stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Cancelling,
    Erroring,
    /// 预定章数或章节列表已用完
    Exhausted,
    Stopped,
}

impl RunState {
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Cancelling)
                | (Running, Erroring)
                | (Running, Exhausted)
                | (Cancelling, Stopped)
                | (Erroring, Stopped)
                | (Exhausted, Stopped)
        )
    }
}

/// 运行如何结束
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    /// 按预定数量完成
    Completed,
    /// 提前到达章节列表末尾
    EndOfList,
    Cancelled,
    /// 可恢复的失败，已完成部分保留
    Failed(String),
}

/// 运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub mode: RunMode,
    /// 完成的单位数（规划为累计章节数，写作为写入的章节数）
    pub completed: usize,
    /// 计划总数
    pub total: usize,
    pub end: RunEnd,
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self.end {
            RunEnd::Completed | RunEnd::EndOfList => RunStatus::Completed,
            RunEnd::Cancelled => RunStatus::Cancelled,
            RunEnd::Failed(_) => RunStatus::Failed,
        }
    }

    pub fn message(&self) -> Option<String> {
        match &self.end {
            RunEnd::Failed(message) => Some(message.clone()),
            RunEnd::EndOfList => Some("已到达章节列表末尾".to_string()),
            RunEnd::Completed | RunEnd::Cancelled => None,
        }
    }
}

/// 单章写作结果
#[derive(Debug, Clone)]
pub struct ChapterWriteOutcome {
    pub position: usize,
    pub chapter: Chapter,
    /// 服务返回空文本，章节未改动
    pub empty: bool,
}

struct RunTracker {
    novel_id: NovelId,
    mode: RunMode,
    state: RunState,
}

impl RunTracker {
    fn new(novel_id: NovelId, mode: RunMode) -> Self {
        Self {
            novel_id,
            mode,
            state: RunState::Idle,
        }
    }

    fn transition(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(
            novel_id = %self.novel_id,
            mode = self.mode.as_str(),
            from = ?self.state,
            to = ?next,
            "Run state changed"
        );
        self.state = next;
    }
}

/// 生成编排器
pub struct GenerationOrchestrator {
    generator: Arc<ChapterGenerator>,
    workspace: Arc<dyn WorkspacePort>,
    persistence: Arc<dyn NovelPersistencePort>,
    progress: Arc<dyn ProgressSink>,
    config: OrchestratorConfig,
}

impl GenerationOrchestrator {
    pub fn new(
        generator: Arc<ChapterGenerator>,
        workspace: Arc<dyn WorkspacePort>,
        persistence: Arc<dyn NovelPersistencePort>,
        progress: Arc<dyn ProgressSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            generator,
            workspace,
            persistence,
            progress,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// 章节规划的前置条件
    pub fn check_planning(&self, novel_id: NovelId) -> Result<Novel, ApplicationError> {
        let novel = self.workspace.get(novel_id)?;
        ensure_stage(&novel, NovelStage::OutlineReady, "规划章节")?;
        novel.config().check_bounds()?;
        if novel.outline().trim().is_empty() {
            return Err(ApplicationError::invalid_state("规划章节前需要先生成大纲"));
        }
        if novel.written_count() > 0 {
            return Err(ApplicationError::business_rule(
                "已有章节正文，重新规划会覆盖已写内容",
            ));
        }
        Ok(novel)
    }

    /// 正文写作的前置条件
    pub fn check_writing(&self, novel_id: NovelId) -> Result<Novel, ApplicationError> {
        let novel = self.workspace.get(novel_id)?;
        ensure_stage(&novel, NovelStage::ChaptersReady, "撰写正文")?;
        Ok(novel)
    }

    // ========================================================================
    // 单步操作
    // ========================================================================

    /// 推荐配置并写入小说
    pub async fn recommend_config(&self, novel_id: NovelId) -> Result<NovelConfig, ApplicationError> {
        self.workspace.get(novel_id)?;
        self.log(novel_id, "正在生成推荐配置".to_string());

        let config = self.generator.recommend_config().await?;
        let snapshot = self
            .workspace
            .apply(novel_id, NovelPatch::config(config.clone()))?;
        if let Err(e) = self.persistence.save_config(&snapshot).await {
            self.persistence_failed(novel_id, "config", &e);
        }

        self.log(novel_id, format!("已填充推荐配置：{}", config.title));
        Ok(config)
    }

    /// 生成大纲
    pub async fn draft_outline(&self, novel_id: NovelId) -> Result<String, ApplicationError> {
        let novel = self.workspace.get(novel_id)?;
        if novel.title().trim().is_empty() {
            return Err(ApplicationError::validation("生成大纲前需要填写书名"));
        }

        self.progress.report(ProgressEvent::Started {
            novel_id,
            mode: RunMode::Outline,
            total: 1,
        });
        self.log(novel_id, format!("正在为《{}》生成大纲", novel.title()));

        let outline = match self.generator.generate_outline(novel.config()).await {
            Ok(outline) => outline,
            Err(e) => {
                self.report_finished(novel_id, RunMode::Outline, RunStatus::Failed, 0, Some(e.to_string()));
                return Err(e.into());
            }
        };

        let snapshot = self.workspace.apply(
            novel_id,
            NovelPatch::outline(outline.clone()).advance(NovelStage::OutlineReady),
        )?;
        if let Err(e) = self.persistence.save_outline(&snapshot).await {
            self.persistence_failed(novel_id, "outline", &e);
        }

        self.report_finished(novel_id, RunMode::Outline, RunStatus::Completed, 1, None);
        Ok(outline)
    }

    /// 撰写（或重写）单个章节
    pub async fn write_chapter(
        &self,
        novel_id: NovelId,
        position: usize,
    ) -> Result<ChapterWriteOutcome, ApplicationError> {
        let novel = self.check_writing(novel_id)?;
        let chapter = novel.get_chapter(position).cloned().ok_or_else(|| {
            ApplicationError::validation(format!(
                "章节位置 {} 超出范围（共 {} 章）",
                position,
                novel.chapter_count()
            ))
        })?;

        self.progress.report(ProgressEvent::Started {
            novel_id,
            mode: RunMode::Chapter,
            total: 1,
        });

        match self.write_one(&novel, novel.chapters(), position).await {
            Ok(Some(written)) => {
                self.report_finished(novel_id, RunMode::Chapter, RunStatus::Completed, 1, None);
                Ok(ChapterWriteOutcome {
                    position,
                    chapter: written,
                    empty: false,
                })
            }
            Ok(None) => {
                self.report_finished(
                    novel_id,
                    RunMode::Chapter,
                    RunStatus::Completed,
                    0,
                    Some("生成内容为空".to_string()),
                );
                Ok(ChapterWriteOutcome {
                    position,
                    chapter,
                    empty: true,
                })
            }
            Err(e) => {
                self.report_finished(novel_id, RunMode::Chapter, RunStatus::Failed, 0, Some(e.to_string()));
                Err(e)
            }
        }
    }

    // ========================================================================
    // 章节规划
    // ========================================================================

    /// 批量规划章节，直到达到配置的目标章节数
    ///
    /// 替换现有章节列表；每批完成后立即提交，失败时保留已规划部分
    pub async fn plan_chapters(
        &self,
        novel_id: NovelId,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ApplicationError> {
        let novel = self.check_planning(novel_id)?;

        let target = novel.config().chapter_count as usize;
        let batch_size = self.config.batch_size.max(1);
        let mut tracker = RunTracker::new(novel_id, RunMode::Planning);
        tracker.transition(RunState::Running);
        self.progress.report(ProgressEvent::Started {
            novel_id,
            mode: RunMode::Planning,
            total: target,
        });
        tracing::info!(novel_id = %novel_id, target, batch_size, "Chapter planning started");

        let mut accumulated: Vec<Chapter> = Vec::new();
        let mut empty_batches = 0;
        let mut end = None;

        while accumulated.len() < target {
            if cancel.is_cancelled() {
                tracker.transition(RunState::Cancelling);
                end = Some(RunEnd::Cancelled);
                break;
            }

            let start = accumulated.len();
            let size = batch_size.min(target - start);
            self.log(
                novel_id,
                format!("正在规划{}至{}", chapter_label(start), chapter_label(start + size - 1)),
            );

            let batch = match self
                .generator
                .generate_chapter_batch(novel.config(), novel.outline(), start, size, &accumulated)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    tracker.transition(RunState::Erroring);
                    self.log(novel_id, format!("章节规划失败：{}", e));
                    end = Some(RunEnd::Failed(e.to_string()));
                    break;
                }
            };

            if batch.is_empty() {
                empty_batches += 1;
                self.log(
                    novel_id,
                    format!("第 {} 次返回空批次，将重试", empty_batches),
                );
                if empty_batches >= self.config.max_empty_batches.max(1) {
                    tracker.transition(RunState::Erroring);
                    let e = GenerationError::content_format("连续返回无法解析的章节列表");
                    end = Some(RunEnd::Failed(e.to_string()));
                    break;
                }
            } else {
                empty_batches = 0;
                accumulated.extend(batch);
                match self
                    .workspace
                    .apply(novel_id, NovelPatch::chapters(accumulated.clone()))
                {
                    Ok(snapshot) => {
                        if let Err(e) = self.persistence.save_all_chapters(&snapshot).await {
                            self.persistence_failed(novel_id, "chapters", &e);
                        }
                    }
                    Err(e) => {
                        tracker.transition(RunState::Erroring);
                        end = Some(RunEnd::Failed(e.to_string()));
                        break;
                    }
                }
                self.progress.report(ProgressEvent::Advanced {
                    novel_id,
                    mode: RunMode::Planning,
                    current: accumulated.len(),
                    total: target,
                });
            }

            if accumulated.len() < target && !cancel.is_cancelled() {
                tokio::time::sleep(self.config.step_pause).await;
            }
        }

        if !accumulated.is_empty() {
            self.commit_stage(novel_id, NovelStage::ChaptersReady).await;
        }

        let end = end.unwrap_or_else(|| {
            tracker.transition(RunState::Exhausted);
            RunEnd::Completed
        });
        tracker.transition(RunState::Stopped);
        Ok(self.finish(novel_id, RunMode::Planning, accumulated.len(), target, end))
    }

    // ========================================================================
    // 连续写作
    // ========================================================================

    /// 从 selected 起连续撰写 run_length 章
    ///
    /// 起点为 selected 及之后第一个未写完的章节；到达列表末尾视为完成
    pub async fn streak_write(
        &self,
        novel_id: NovelId,
        selected: usize,
        run_length: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ApplicationError> {
        let novel = self.check_writing(novel_id)?;
        let run_length = run_length.unwrap_or(self.config.streak_length);
        if run_length == 0 {
            return Err(ApplicationError::validation("连续写作章数必须大于 0"));
        }

        let mut tracker = RunTracker::new(novel_id, RunMode::Streak);
        tracker.transition(RunState::Running);
        self.progress.report(ProgressEvent::Started {
            novel_id,
            mode: RunMode::Streak,
            total: run_length,
        });

        // 运行期间以本地副本为准，每章完成后再发布到工作区
        let mut local: Vec<Chapter> = novel.chapters().to_vec();

        let Some(start) =
            find_streak_start(&local, selected, self.config.written_threshold_chars)
        else {
            self.log(novel_id, "选中位置之后没有待写的章节".to_string());
            tracker.transition(RunState::Exhausted);
            tracker.transition(RunState::Stopped);
            return Ok(self.finish(novel_id, RunMode::Streak, 0, run_length, RunEnd::EndOfList));
        };

        let stop = start.saturating_add(run_length).min(local.len());
        tracing::info!(
            novel_id = %novel_id,
            start,
            stop,
            run_length,
            "Streak write started"
        );

        let mut completed = 0;
        let mut end = None;

        for (step, position) in (start..stop).enumerate() {
            if cancel.is_cancelled() {
                tracker.transition(RunState::Cancelling);
                end = Some(RunEnd::Cancelled);
                break;
            }

            match self.write_one(&novel, &local, position).await {
                Ok(Some(written)) => {
                    local[position] = written;
                    completed += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    tracker.transition(RunState::Erroring);
                    self.log(
                        novel_id,
                        format!("{}写作失败，连续写作中止：{}", chapter_label(position), e),
                    );
                    end = Some(RunEnd::Failed(e.to_string()));
                    break;
                }
            }

            self.progress.report(ProgressEvent::Advanced {
                novel_id,
                mode: RunMode::Streak,
                current: step + 1,
                total: run_length,
            });

            if position + 1 < stop && !cancel.is_cancelled() {
                tokio::time::sleep(self.config.step_pause).await;
            }
        }

        let end = end.unwrap_or_else(|| {
            tracker.transition(RunState::Exhausted);
            if stop.saturating_sub(start) < run_length {
                RunEnd::EndOfList
            } else {
                RunEnd::Completed
            }
        });
        tracker.transition(RunState::Stopped);
        Ok(self.finish(novel_id, RunMode::Streak, completed, run_length, end))
    }

    // ========================================================================
    // 内部
    // ========================================================================

    /// 撰写 chapters[position]，成功时发布到工作区并持久化
    ///
    /// 返回 None 表示服务返回空文本，章节保持不变
    async fn write_one(
        &self,
        novel: &Novel,
        chapters: &[Chapter],
        position: usize,
    ) -> Result<Option<Chapter>, ApplicationError> {
        let novel_id = novel.id();
        let mut chapter = chapters[position].clone();
        let label = chapter_label(position);
        self.log(novel_id, format!("正在撰写{} {}", label, chapter.title()));

        let context = build_chapter_context(chapters, position, &self.config.context);
        let body = self
            .generator
            .generate_chapter_content(novel.config(), position, &chapter, &context, novel.outline())
            .await?;

        let text = match body {
            ChapterBody::Written(text) => text,
            ChapterBody::Empty => {
                self.progress.report(ProgressEvent::ChapterSkipped {
                    novel_id,
                    chapter_id: chapter.id(),
                    position,
                });
                self.log(novel_id, format!("{}生成内容为空，已跳过", label));
                return Ok(None);
            }
        };

        chapter.write(text);
        let snapshot = self.workspace.apply(
            novel_id,
            NovelPatch::chapter(chapter.clone()).advance(NovelStage::Writing),
        )?;
        let current_position = snapshot.position_of(chapter.id()).unwrap_or(position);
        if let Err(e) = self
            .persistence
            .save_chapter(&snapshot, &chapter, current_position)
            .await
        {
            self.persistence_failed(novel_id, "chapter", &e);
        }

        self.progress.report(ProgressEvent::ChapterWritten {
            novel_id,
            chapter_id: chapter.id(),
            position: current_position,
        });
        self.log(
            novel_id,
            format!("{}完成，共 {} 字", label, chapter.content_chars()),
        );
        Ok(Some(chapter))
    }

    async fn commit_stage(&self, novel_id: NovelId, stage: NovelStage) {
        match self
            .workspace
            .apply(novel_id, NovelPatch::default().advance(stage))
        {
            Ok(snapshot) => {
                if let Err(e) = self.persistence.save_config(&snapshot).await {
                    self.persistence_failed(novel_id, "config", &e);
                }
            }
            Err(e) => {
                tracing::warn!(novel_id = %novel_id, error = %e, "Failed to advance stage");
            }
        }
    }

    fn finish(
        &self,
        novel_id: NovelId,
        mode: RunMode,
        completed: usize,
        total: usize,
        end: RunEnd,
    ) -> RunOutcome {
        let outcome = RunOutcome {
            mode,
            completed,
            total,
            end,
        };
        tracing::info!(
            novel_id = %novel_id,
            mode = mode.as_str(),
            completed,
            total,
            status = ?outcome.status(),
            "Generation run finished"
        );
        self.report_finished(novel_id, mode, outcome.status(), completed, outcome.message());
        outcome
    }

    fn report_finished(
        &self,
        novel_id: NovelId,
        mode: RunMode,
        status: RunStatus,
        completed: usize,
        message: Option<String>,
    ) {
        self.progress.report(ProgressEvent::Finished {
            novel_id,
            mode,
            status,
            completed,
            message,
        });
    }

    fn log(&self, novel_id: NovelId, line: String) {
        tracing::info!(novel_id = %novel_id, "{}", line);
        self.progress.report(ProgressEvent::Log { novel_id, line });
    }

    fn persistence_failed(&self, novel_id: NovelId, what: &str, error: &dyn std::fmt::Display) {
        tracing::warn!(
            novel_id = %novel_id,
            what,
            backend = self.persistence.backend(),
            error = %error,
            "Persistence write failed, keeping in-memory state"
        );
    }
}

fn ensure_stage(novel: &Novel, required: NovelStage, action: &str) -> Result<(), ApplicationError> {
    if novel.stage() < required {
        return Err(ApplicationError::invalid_state(format!(
            "{}需要阶段 {} 或之后，当前为 {}",
            action,
            required,
            novel.stage()
        )));
    }
    Ok(())
}

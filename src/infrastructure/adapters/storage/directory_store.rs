//! Directory Store - 把小说镜像到用户指定的目录
//!
//! 实现 NovelPersistencePort trait
//!
//! 目录结构:
//! {base_dir}/{书名}-{ID 前 8 位}/config.json
//! {base_dir}/{书名}-{ID 前 8 位}/outline.md
//! {base_dir}/{书名}-{ID 前 8 位}/chapters/第001章 {章节标题}.md
//!
//! 章节文件名由当前位置推导，章节顺序变化时由 save_all_chapters 整体重写

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{NovelPersistencePort, RepositoryError};
use crate::domain::novel::{chapter_label, Chapter, Novel};

const CONFIG_FILE: &str = "config.json";
const OUTLINE_FILE: &str = "outline.md";
const CHAPTERS_DIR: &str = "chapters";
const SHORT_ID_LEN: usize = 8;

/// 目录镜像存储
pub struct DirectoryNovelStore {
    /// 存储根目录
    base_dir: PathBuf,
}

impl DirectoryNovelStore {
    /// 创建新的目录存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir).await.map_err(io_error)?;

        Ok(Self { base_dir })
    }

    /// 获取存储根目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 小说目录，同名小说靠 ID 前缀区分（书名为空时使用完整 ID）
    pub fn novel_dir(&self, novel: &Novel) -> PathBuf {
        let title = sanitize_file_name(novel.title());
        if title.is_empty() {
            return self.base_dir.join(novel.id().to_string());
        }
        let short_id: String = novel
            .id()
            .as_uuid()
            .simple()
            .to_string()
            .chars()
            .take(SHORT_ID_LEN)
            .collect();
        self.base_dir.join(format!("{}-{}", title, short_id))
    }

    fn chapters_dir(&self, novel: &Novel) -> PathBuf {
        self.novel_dir(novel).join(CHAPTERS_DIR)
    }

    async fn write_chapter_file(
        &self,
        dir: &Path,
        chapter: &Chapter,
        position: usize,
    ) -> Result<(), RepositoryError> {
        let path = dir.join(chapter_file_name(chapter, position));
        fs::write(&path, render_chapter(chapter, position))
            .await
            .map_err(io_error)
    }

    /// 删除同一位置上标题不同的旧文件
    async fn remove_stale_chapter_files(
        &self,
        dir: &Path,
        position: usize,
        keep: &str,
    ) -> Result<(), RepositoryError> {
        let prefix = padded_label(position);
        let mut entries = fs::read_dir(dir).await.map_err(io_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) && name != keep {
                fs::remove_file(entry.path()).await.map_err(io_error)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NovelPersistencePort for DirectoryNovelStore {
    fn backend(&self) -> &'static str {
        "directory"
    }

    async fn save_config(&self, novel: &Novel) -> Result<(), RepositoryError> {
        let dir = self.novel_dir(novel);
        fs::create_dir_all(&dir).await.map_err(io_error)?;

        let document = json!({
            "id": novel.id(),
            "stage": novel.stage(),
            "config": novel.config(),
            "updatedAt": novel.updated_at().to_rfc3339(),
        });
        let text = serde_json::to_string_pretty(&document)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        fs::write(dir.join(CONFIG_FILE), text).await.map_err(io_error)?;

        tracing::debug!(dir = %dir.display(), "Config mirrored");
        Ok(())
    }

    async fn save_outline(&self, novel: &Novel) -> Result<(), RepositoryError> {
        let dir = self.novel_dir(novel);
        fs::create_dir_all(&dir).await.map_err(io_error)?;
        fs::write(dir.join(OUTLINE_FILE), novel.outline())
            .await
            .map_err(io_error)?;

        tracing::debug!(dir = %dir.display(), "Outline mirrored");
        Ok(())
    }

    async fn save_chapter(
        &self,
        novel: &Novel,
        chapter: &Chapter,
        position: usize,
    ) -> Result<(), RepositoryError> {
        let dir = self.chapters_dir(novel);
        fs::create_dir_all(&dir).await.map_err(io_error)?;

        let file_name = chapter_file_name(chapter, position);
        self.remove_stale_chapter_files(&dir, position, &file_name)
            .await?;
        self.write_chapter_file(&dir, chapter, position).await?;

        tracing::debug!(
            file = %file_name,
            chars = chapter.content_chars(),
            "Chapter mirrored"
        );
        Ok(())
    }

    async fn save_all_chapters(&self, novel: &Novel) -> Result<(), RepositoryError> {
        let dir = self.chapters_dir(novel);
        if fs::try_exists(&dir).await.map_err(io_error)? {
            fs::remove_dir_all(&dir).await.map_err(io_error)?;
        }
        fs::create_dir_all(&dir).await.map_err(io_error)?;

        for (position, chapter) in novel.chapters().iter().enumerate() {
            self.write_chapter_file(&dir, chapter, position).await?;
        }

        tracing::debug!(
            dir = %dir.display(),
            count = novel.chapter_count(),
            "All chapters mirrored"
        );
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> RepositoryError {
    RepositoryError::IoError(e.to_string())
}

/// "第001章"
fn padded_label(position: usize) -> String {
    format!("第{:03}章", position + 1)
}

fn chapter_file_name(chapter: &Chapter, position: usize) -> String {
    let title = sanitize_file_name(chapter.title());
    if title.is_empty() {
        format!("{}.md", padded_label(position))
    } else {
        format!("{} {}.md", padded_label(position), title)
    }
}

fn render_chapter(chapter: &Chapter, position: usize) -> String {
    let mut text = format!("# {} {}\n\n", chapter_label(position), chapter.title());
    if !chapter.synopsis().is_empty() {
        text.push_str(&format!("> {}\n\n", chapter.synopsis()));
    }
    text.push_str(chapter.content());
    text.push('\n');
    text
}

fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

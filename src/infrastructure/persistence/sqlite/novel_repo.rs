//! SQLite Novel Repository
//!
//! 同时实现写入端（NovelPersistencePort）和读取/删除端（NovelRepositoryPort）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{NovelPersistencePort, NovelRepositoryPort, RepositoryError};
use crate::domain::novel::{Chapter, ChapterId, Novel, NovelConfig, NovelId, NovelStage};

/// SQLite Novel Repository
pub struct SqliteNovelRepository {
    pool: DbPool,
}

impl SqliteNovelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, RepositoryError> {
        self.pool.begin().await.map_err(db_error)
    }

    async fn find_chapters(&self, novel_id: &str) -> Result<Vec<Chapter>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(
            "SELECT id, title, synopsis, content, is_generated FROM chapters WHERE novel_id = ? ORDER BY position",
        )
        .bind(novel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Chapter::try_from).collect()
    }

    async fn hydrate(&self, row: NovelRow) -> Result<Novel, RepositoryError> {
        let chapters = self.find_chapters(&row.id).await?;
        row.into_novel(chapters)
    }
}

#[derive(FromRow)]
struct NovelRow {
    id: String,
    config: String,
    outline: String,
    stage: String,
    created_at: String,
    updated_at: String,
}

impl NovelRow {
    fn into_novel(self, chapters: Vec<Chapter>) -> Result<Novel, RepositoryError> {
        let config: NovelConfig = serde_json::from_str(&self.config)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(Novel::restore(
            NovelId::from_uuid(parse_uuid(&self.id)?),
            config,
            self.outline,
            chapters,
            NovelStage::from_str(&self.stage).unwrap_or_default(),
            parse_time(&self.created_at)?,
            parse_time(&self.updated_at)?,
        ))
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: String,
    title: String,
    synopsis: String,
    content: String,
    is_generated: i64,
}

impl TryFrom<ChapterRow> for Chapter {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(Chapter::restore(
            ChapterId::from_uuid(parse_uuid(&row.id)?),
            row.title,
            row.synopsis,
            row.content,
            row.is_generated != 0,
        ))
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
        .with_timezone(&Utc))
}

/// 写入（或更新）小说行
async fn upsert_novel(
    tx: &mut Transaction<'static, Sqlite>,
    novel: &Novel,
) -> Result<(), RepositoryError> {
    let config = serde_json::to_string(novel.config())
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO novels (id, config, outline, stage, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            config = excluded.config,
            outline = excluded.outline,
            stage = excluded.stage,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(novel.id().to_string())
    .bind(config)
    .bind(novel.outline())
    .bind(novel.stage().as_str())
    .bind(novel.created_at().to_rfc3339())
    .bind(novel.updated_at().to_rfc3339())
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;

    Ok(())
}

async fn upsert_chapter(
    tx: &mut Transaction<'static, Sqlite>,
    novel_id: NovelId,
    chapter: &Chapter,
    position: usize,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO chapters (id, novel_id, position, title, synopsis, content, is_generated)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            position = excluded.position,
            title = excluded.title,
            synopsis = excluded.synopsis,
            content = excluded.content,
            is_generated = excluded.is_generated
        "#,
    )
    .bind(chapter.id().to_string())
    .bind(novel_id.to_string())
    .bind(position as i64)
    .bind(chapter.title())
    .bind(chapter.synopsis())
    .bind(chapter.content())
    .bind(chapter.is_generated() as i64)
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;

    Ok(())
}

#[async_trait]
impl NovelPersistencePort for SqliteNovelRepository {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn save_config(&self, novel: &Novel) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;
        upsert_novel(&mut tx, novel).await?;
        tx.commit().await.map_err(db_error)
    }

    async fn save_outline(&self, novel: &Novel) -> Result<(), RepositoryError> {
        // 大纲与配置同在 novels 行
        self.save_config(novel).await
    }

    async fn save_chapter(
        &self,
        novel: &Novel,
        chapter: &Chapter,
        position: usize,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;
        upsert_novel(&mut tx, novel).await?;
        upsert_chapter(&mut tx, novel.id(), chapter, position).await?;
        tx.commit().await.map_err(db_error)
    }

    async fn save_all_chapters(&self, novel: &Novel) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;
        upsert_novel(&mut tx, novel).await?;

        sqlx::query("DELETE FROM chapters WHERE novel_id = ?")
            .bind(novel.id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for (position, chapter) in novel.chapters().iter().enumerate() {
            upsert_chapter(&mut tx, novel.id(), chapter, position).await?;
        }

        tx.commit().await.map_err(db_error)?;

        tracing::debug!(
            novel_id = %novel.id(),
            count = novel.chapter_count(),
            "Chapters rewritten"
        );
        Ok(())
    }
}

#[async_trait]
impl NovelRepositoryPort for SqliteNovelRepository {
    async fn find_all(&self) -> Result<Vec<Novel>, RepositoryError> {
        let rows: Vec<NovelRow> = sqlx::query_as(
            "SELECT id, config, outline, stage, created_at, updated_at FROM novels ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut novels = Vec::with_capacity(rows.len());
        for row in rows {
            novels.push(self.hydrate(row).await?);
        }
        Ok(novels)
    }

    async fn find_by_id(&self, id: NovelId) -> Result<Option<Novel>, RepositoryError> {
        let row: Option<NovelRow> = sqlx::query_as(
            "SELECT id, config, outline, stage, created_at, updated_at FROM novels WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: NovelId) -> Result<(), RepositoryError> {
        let mut tx = self.begin().await?;

        sqlx::query("DELETE FROM chapters WHERE novel_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query("DELETE FROM novels WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        tracing::debug!(novel_id = %id, "Novel rows deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::novel::NovelPatch;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn repo() -> SqliteNovelRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteNovelRepository::new(pool)
    }

    fn sample() -> Novel {
        let mut novel = Novel::new();
        novel
            .apply(
                NovelPatch {
                    config: Some(NovelConfig {
                        title: "长夜将明".to_string(),
                        ..Default::default()
                    }),
                    outline: Some("大纲".to_string()),
                    chapters: Some(vec![
                        Chapter::planned("一", "甲"),
                        Chapter::planned("二", "乙"),
                        Chapter::planned("三", "丙"),
                    ]),
                    ..Default::default()
                }
                .advance(NovelStage::ChaptersReady),
            )
            .unwrap();
        novel
    }

    #[tokio::test]
    async fn test_save_all_then_load_preserves_order() {
        let repo = repo().await;
        let novel = sample();

        repo.save_all_chapters(&novel).await.unwrap();
        let loaded = repo.find_by_id(novel.id()).await.unwrap().unwrap();

        assert_eq!(loaded.title(), "长夜将明");
        assert_eq!(loaded.stage(), NovelStage::ChaptersReady);
        assert_eq!(loaded.chapters(), novel.chapters());
    }

    #[tokio::test]
    async fn test_save_chapter_updates_single_row() {
        let repo = repo().await;
        let mut novel = sample();
        repo.save_all_chapters(&novel).await.unwrap();

        let mut chapter = novel.chapters()[1].clone();
        chapter.write("第二章正文".to_string());
        novel
            .apply(NovelPatch::chapter(chapter.clone()).advance(NovelStage::Writing))
            .unwrap();
        repo.save_chapter(&novel, &chapter, 1).await.unwrap();

        let loaded = repo.find_by_id(novel.id()).await.unwrap().unwrap();
        assert_eq!(loaded.stage(), NovelStage::Writing);
        assert_eq!(loaded.chapters()[1].content(), "第二章正文");
        assert!(loaded.chapters()[1].is_generated());
        assert_eq!(loaded.chapters()[2].title(), "三");
    }

    #[tokio::test]
    async fn test_replan_drops_old_chapters() {
        let repo = repo().await;
        let mut novel = sample();
        repo.save_all_chapters(&novel).await.unwrap();

        novel
            .apply(NovelPatch::chapters(vec![Chapter::planned("新", "")]))
            .unwrap();
        repo.save_all_chapters(&novel).await.unwrap();

        let loaded = repo.find_by_id(novel.id()).await.unwrap().unwrap();
        assert_eq!(loaded.chapter_count(), 1);
        assert_eq!(loaded.chapters()[0].title(), "新");
    }

    #[tokio::test]
    async fn test_delete_and_find_all() {
        let repo = repo().await;
        let a = sample();
        let b = sample();
        repo.save_config(&a).await.unwrap();
        repo.save_all_chapters(&b).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 2);

        repo.delete(b.id()).await.unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id(), a.id());
        assert!(repo.find_by_id(b.id()).await.unwrap().is_none());
    }
}

//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(
        &self,
        news_id: i64,
        author_id: i64,
        text: &str,
        created: DateTime<Utc>,
    ) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of a news item, oldest first
    async fn list_by_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Replace the text of a comment. Returns false if it no longer exists.
    async fn update_text(&self, id: i64, text: &str) -> Result<bool>;

    /// Delete a comment. Returns false if it no longer exists.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count all comments
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(
        &self,
        news_id: i64,
        author_id: i64,
        text: &str,
        created: DateTime<Utc>,
    ) -> Result<Comment> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (news_id, author_id, text, created)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(news_id)
        .bind(author_id)
        .bind(text)
        .bind(created)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create comment")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            news_id,
            author_id,
            text: text.to_string(),
            created,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, news_id, author_id, text, created FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get comment by ID")?;

        row.as_ref().map(row_to_comment).transpose()
    }

    async fn list_by_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.news_id, c.author_id, c.text, c.created, u.username
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.news_id = ?
            ORDER BY c.created ASC, c.id ASC
            "#,
        )
        .bind(news_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list comments")?;

        rows.iter()
            .map(|row| {
                Ok(CommentWithAuthor {
                    comment: row_to_comment(row)?,
                    author_username: row.try_get("username")?,
                })
            })
            .collect()
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(text)
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update comment")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM comments")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count comments")?;

        Ok(row.get("count"))
    }
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        news_id: row.try_get("news_id")?,
        author_id: row.try_get("author_id")?,
        text: row.try_get("text")?,
        created: row.try_get("created")?,
    })
}

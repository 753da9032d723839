//! News repository
//!
//! This module provides:
//! - `NewsRepository` trait defining the interface for news data access
//! - `SqlxNewsRepository` implementing the trait on top of SQLite

use crate::db::DynDatabasePool;
use crate::models::{News, NewsSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Insert a news item published at `date`
    async fn create(&self, title: &str, text: &str, date: DateTime<Utc>) -> Result<News>;

    /// Insert several news items in one transaction
    async fn create_many(&self, items: &[(String, String, DateTime<Utc>)]) -> Result<Vec<News>>;

    /// Get news by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    /// Newest news first, at most `limit` items, with their comment counts.
    /// Items sharing a date are ordered by descending id.
    async fn list_latest(&self, limit: i64) -> Result<Vec<NewsSummary>>;

    /// Count total news
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based news repository implementation
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    /// Create a new SQLx news repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, title: &str, text: &str, date: DateTime<Utc>) -> Result<News> {
        let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
            .bind(title)
            .bind(text)
            .bind(date)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to create news")?;

        Ok(News {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            text: text.to_string(),
            date,
        })
    }

    async fn create_many(&self, items: &[(String, String, DateTime<Utc>)]) -> Result<Vec<News>> {
        let mut tx = self
            .pool
            .sqlite()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut created = Vec::with_capacity(items.len());
        for (title, text, date) in items {
            let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
                .bind(title)
                .bind(text)
                .bind(*date)
                .execute(&mut *tx)
                .await
                .context("Failed to create news")?;

            created.push(News {
                id: result.last_insert_rowid(),
                title: title.clone(),
                text: text.clone(),
                date: *date,
            });
        }

        tx.commit().await.context("Failed to commit news batch")?;
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get news by ID")?;

        row.as_ref().map(row_to_news).transpose()
    }

    async fn list_latest(&self, limit: i64) -> Result<Vec<NewsSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.title, n.text, n.date,
                   (SELECT COUNT(*) FROM comments c WHERE c.news_id = n.id) as comment_count
            FROM news n
            ORDER BY n.date DESC, n.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list news")?;

        rows.iter()
            .map(|row| {
                Ok(NewsSummary {
                    news: row_to_news(row)?,
                    comment_count: row.try_get("comment_count")?,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM news")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count news")?;

        Ok(row.get("count"))
    }
}

fn row_to_news(row: &SqliteRow) -> Result<News> {
    Ok(News {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        date: row.try_get("date")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup_test_repo() -> SqlxNewsRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxNewsRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_news() {
        let repo = setup_test_repo().await;
        let date = Utc::now();

        let news = repo
            .create("Заголовок", "Текст", date)
            .await
            .expect("Failed to create news");

        let found = repo
            .get_by_id(news.id)
            .await
            .expect("Failed to get news")
            .expect("News not found");
        assert_eq!(found.title, "Заголовок");
        assert_eq!(found.date, date);

        assert!(repo.get_by_id(news.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_latest_orders_by_date_desc_and_limits() {
        let repo = setup_test_repo().await;
        let today = Utc::now();

        let items: Vec<_> = (0..5)
            .map(|i| {
                (
                    format!("Новость {}", i),
                    "Просто текст.".to_string(),
                    today - Duration::days(i),
                )
            })
            .collect();
        repo.create_many(&items).await.expect("Failed to create news");

        let latest = repo.list_latest(3).await.expect("Failed to list news");
        let titles: Vec<_> = latest.iter().map(|s| s.news.title.as_str()).collect();
        assert_eq!(titles, vec!["Новость 0", "Новость 1", "Новость 2"]);
        assert!(latest.iter().all(|s| s.comment_count == 0));
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_list_latest_breaks_date_ties_by_id() {
        let repo = setup_test_repo().await;
        let date = Utc::now();

        let first = repo.create("first", "text", date).await.unwrap();
        let second = repo.create("second", "text", date).await.unwrap();

        let latest = repo.list_latest(10).await.unwrap();
        assert_eq!(latest[0].news.id, second.id);
        assert_eq!(latest[1].news.id, first.id);
    }
}

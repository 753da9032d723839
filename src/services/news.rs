//! News service
//!
//! Home listing and detail page of the news site, plus the bulk-create
//! helpers used for seeding.

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{CommentWithAuthor, CreateNewsInput, News, NewsSummary};
use crate::services::clock::DynClock;
use anyhow::Context;
use std::sync::Arc;

/// Default number of news items on the home page
pub const NEWS_COUNT_ON_HOME_PAGE: u32 = 10;

/// Error types for news service operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    #[error("News not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A news item with its comments, oldest first
#[derive(Debug, Clone)]
pub struct NewsDetail {
    pub news: News,
    pub comments: Vec<CommentWithAuthor>,
}

/// News service
pub struct NewsService {
    news_repo: Arc<dyn NewsRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    clock: DynClock,
    count_on_home_page: u32,
}

impl NewsService {
    pub fn new(
        news_repo: Arc<dyn NewsRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        clock: DynClock,
        count_on_home_page: u32,
    ) -> Self {
        Self {
            news_repo,
            comment_repo,
            clock,
            count_on_home_page,
        }
    }

    /// The newest news items, capped at the home page size
    pub async fn home(&self) -> Result<Vec<NewsSummary>, NewsServiceError> {
        let items = self
            .news_repo
            .list_latest(i64::from(self.count_on_home_page))
            .await
            .context("Failed to list news")?;

        Ok(items)
    }

    /// A news item and its comments
    pub async fn detail(&self, id: i64) -> Result<NewsDetail, NewsServiceError> {
        let news = self.get(id).await?;
        let comments = self
            .comment_repo
            .list_by_news(id)
            .await
            .context("Failed to list comments")?;

        Ok(NewsDetail { news, comments })
    }

    /// Get a news item by ID
    pub async fn get(&self, id: i64) -> Result<News, NewsServiceError> {
        self.news_repo
            .get_by_id(id)
            .await
            .context("Failed to get news")?
            .ok_or(NewsServiceError::NotFound(id))
    }

    /// Publish a news item. Without an explicit date it is dated now.
    pub async fn create_news(&self, input: CreateNewsInput) -> Result<News, NewsServiceError> {
        let date = input.date.unwrap_or_else(|| self.clock.now());
        let news = self
            .news_repo
            .create(&input.title, &input.text, date)
            .await
            .context("Failed to create news")?;

        tracing::info!("Created news {}: {}", news.id, news.title);
        Ok(news)
    }

    /// Publish several news items at once
    pub async fn create_many(&self, inputs: Vec<CreateNewsInput>) -> Result<Vec<News>, NewsServiceError> {
        let now = self.clock.now();
        let items: Vec<_> = inputs
            .into_iter()
            .map(|input| (input.title, input.text, input.date.unwrap_or(now)))
            .collect();

        let created = self
            .news_repo
            .create_many(&items)
            .await
            .context("Failed to create news")?;

        tracing::info!("Created {} news items", created.len());
        Ok(created)
    }

    /// Total number of news items
    pub async fn count(&self) -> Result<i64, NewsServiceError> {
        Ok(self.news_repo.count().await.context("Failed to count news")?)
    }
}

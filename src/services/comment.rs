//! Comment service
//!
//! Posting, editing and deleting comments under news items. Only logged-in
//! users may post, and only the author may edit or delete a comment.

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{Comment, CommentForm, Identity, User};
use crate::services::access::{authorize, AccessDecision, Action};
use crate::services::clock::DynClock;
use crate::services::forms::{self, FormErrors};
use anyhow::Context;
use std::sync::Arc;

/// Words that may not appear in a comment
pub const BAD_WORDS: [&str; 2] = ["редиска", "негодяй"];

/// Message attached to `text` when a bad word is found
pub const WARNING: &str = "Не ругайтесь!";

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Login required")]
    LoginRequired,

    /// Missing comment or news item, or a comment owned by someone else
    #[error("Not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(FormErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn check(decision: AccessDecision) -> Result<(), CommentServiceError> {
    match decision {
        AccessDecision::Allow => Ok(()),
        AccessDecision::LoginRequired => Err(CommentServiceError::LoginRequired),
        AccessDecision::NotFound => Err(CommentServiceError::NotFound),
    }
}

/// Check comment text against the required-field rule and the blocklist
pub fn validate_text(text: &str) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();
    forms::require(&mut errors, "text", text);

    let lowered = text.to_lowercase();
    if BAD_WORDS.iter().any(|word| lowered.contains(word)) {
        errors.add("text", WARNING);
    }

    errors.into_result()
}

/// Comment service
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    news_repo: Arc<dyn NewsRepository>,
    clock: DynClock,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        news_repo: Arc<dyn NewsRepository>,
        clock: DynClock,
    ) -> Self {
        Self {
            comment_repo,
            news_repo,
            clock,
        }
    }

    /// Post a comment under a news item as the requesting user
    pub async fn create(
        &self,
        identity: &Identity,
        news_id: i64,
        form: CommentForm,
    ) -> Result<Comment, CommentServiceError> {
        let author = self.require_user(identity, Action::Create)?;

        if self
            .news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to get news")?
            .is_none()
        {
            return Err(CommentServiceError::NotFound);
        }

        let text = form.text.trim();
        validate_text(text).map_err(CommentServiceError::ValidationError)?;

        let comment = self
            .comment_repo
            .create(news_id, author.id, text, self.clock.now())
            .await
            .context("Failed to create comment")?;

        tracing::info!(
            "User {} commented on news {} ({})",
            author.username,
            news_id,
            comment.id
        );
        Ok(comment)
    }

    /// A comment its author is about to edit or delete
    pub async fn get_own(
        &self,
        identity: &Identity,
        comment_id: i64,
        action: Action,
    ) -> Result<Comment, CommentServiceError> {
        self.require_user(identity, action)?;

        let comment = self
            .comment_repo
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?
            .ok_or(CommentServiceError::NotFound)?;

        let decision = authorize(identity, action, Some(comment.author_id));
        if decision == AccessDecision::NotFound {
            tracing::warn!(
                "Rejected {:?} of comment {} by user {:?}",
                action,
                comment_id,
                identity.user().map(|u| u.id)
            );
        }
        check(decision)?;

        Ok(comment)
    }

    /// Replace the text of the requester's own comment
    pub async fn edit(
        &self,
        identity: &Identity,
        comment_id: i64,
        form: CommentForm,
    ) -> Result<Comment, CommentServiceError> {
        let mut comment = self.get_own(identity, comment_id, Action::Edit).await?;

        let text = form.text.trim();
        validate_text(text).map_err(CommentServiceError::ValidationError)?;

        if !self
            .comment_repo
            .update_text(comment.id, text)
            .await
            .context("Failed to update comment")?
        {
            return Err(CommentServiceError::NotFound);
        }

        comment.text = text.to_string();
        tracing::info!("Comment {} edited", comment.id);
        Ok(comment)
    }

    /// Delete the requester's own comment, returning what was removed
    pub async fn delete(
        &self,
        identity: &Identity,
        comment_id: i64,
    ) -> Result<Comment, CommentServiceError> {
        let comment = self.get_own(identity, comment_id, Action::Delete).await?;

        if !self
            .comment_repo
            .delete(comment.id)
            .await
            .context("Failed to delete comment")?
        {
            return Err(CommentServiceError::NotFound);
        }

        tracing::info!("Comment {} deleted", comment.id);
        Ok(comment)
    }

    /// Total number of comments
    pub async fn count(&self) -> Result<i64, CommentServiceError> {
        Ok(self.comment_repo.count().await.context("Failed to count comments")?)
    }

    fn require_user<'a>(
        &self,
        identity: &'a Identity,
        action: Action,
    ) -> Result<&'a User, CommentServiceError> {
        check(authorize(identity, action, None))?;
        identity.user().ok_or(CommentServiceError::LoginRequired)
    }
}

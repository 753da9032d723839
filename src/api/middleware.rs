//! API middleware
//!
//! Resolves the session cookie into the request [`Identity`]. Every route
//! sees an identity; anonymous is the fallback for missing, unknown and
//! expired sessions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxCommentRepository, SqlxNewsRepository, SqlxNoteRepository, SqlxSessionRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Identity;
use crate::services::{CommentService, DynClock, NewsService, NoteService, UserService};
use crate::templates::{TemplateEngine, TemplateError};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "sessionid";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub news_service: Arc<NewsService>,
    pub comment_service: Arc<CommentService>,
    pub note_service: Arc<NoteService>,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    /// Wire repositories, services and templates over one database pool
    pub fn new(pool: DynDatabasePool, config: &Config, clock: DynClock) -> Result<Self, TemplateError> {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let news_repo = SqlxNewsRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());
        let note_repo = SqlxNoteRepository::boxed(pool);

        Ok(Self {
            user_service: Arc::new(UserService::with_session_expiration(
                user_repo,
                session_repo,
                clock.clone(),
                config.auth.session_expiration_days,
            )),
            news_service: Arc::new(NewsService::new(
                news_repo.clone(),
                comment_repo.clone(),
                clock.clone(),
                config.news.count_on_home_page,
            )),
            comment_service: Arc::new(CommentService::new(comment_repo, news_repo, clock)),
            note_service: Arc::new(NoteService::with_slug_max_length(
                note_repo,
                config.notes.slug_max_length,
            )),
            templates: Arc::new(TemplateEngine::new()?),
        })
    }
}

/// Extract session token from the `Authorization: Bearer` header or the
/// session cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    let prefix = format!("{}=", SESSION_COOKIE);
    for cookie_header in headers.get_all(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix(&prefix) {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Identity middleware
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_session_token(request.headers());
    let identity = match state.user_service.identify(token.as_deref()).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Session lookup failed: {}", e);
            Identity::Anonymous
        }
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

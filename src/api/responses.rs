//! Shared page responses
//!
//! Rendering helpers, redirects and the [`PageError`] every handler
//! returns on failure.

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::collections::BTreeMap;
use tera::Context as TeraContext;

use crate::api::middleware::{AppState, SESSION_COOKIE};
use crate::api::urls;
use crate::models::{Identity, Session};
use crate::services::{
    CommentServiceError, FormErrors, NewsServiceError, NoteServiceError, UserServiceError,
};
use crate::templates::TemplateError;

/// Page-level failure
#[derive(Debug)]
pub enum PageError {
    /// Anonymous request to a protected page; `next` is the requested path
    LoginRequired { next: String },
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl PageError {
    pub fn login_required(next: impl Into<String>) -> Self {
        Self::LoginRequired { next: next.into() }
    }

    /// Map a comment service error raised while serving `path`
    pub fn comment(err: CommentServiceError, path: &str) -> Self {
        match err {
            CommentServiceError::LoginRequired => Self::login_required(path),
            CommentServiceError::NotFound => Self::NotFound,
            CommentServiceError::ValidationError(errors) => Self::BadRequest(errors.to_string()),
            CommentServiceError::InternalError(e) => Self::Internal(e.to_string()),
        }
    }

    /// Map a note service error raised while serving `path`
    pub fn note(err: NoteServiceError, path: &str) -> Self {
        match err {
            NoteServiceError::LoginRequired => Self::login_required(path),
            NoteServiceError::NotFound => Self::NotFound,
            NoteServiceError::ValidationError(errors) => Self::BadRequest(errors.to_string()),
            NoteServiceError::InternalError(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<NewsServiceError> for PageError {
    fn from(err: NewsServiceError) -> Self {
        match err {
            NewsServiceError::NotFound(_) => Self::NotFound,
            NewsServiceError::InternalError(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<UserServiceError> for PageError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::ValidationError(errors) => Self::BadRequest(errors.to_string()),
            UserServiceError::InternalError(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<TemplateError> for PageError {
    fn from(err: TemplateError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::LoginRequired { next } => found(&urls::login_redirect(&next)),
            PageError::NotFound => (
                StatusCode::NOT_FOUND,
                Html(simple_page("Страница не найдена", "Запрошенная страница не существует.")),
            )
                .into_response(),
            PageError::BadRequest(message) => {
                tracing::debug!("Bad request: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    Html(simple_page("Некорректный запрос", "Проверьте отправленные данные.")),
                )
                    .into_response()
            }
            PageError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(simple_page("Ошибка сервера", "Попробуйте повторить запрос позже.")),
                )
                    .into_response()
            }
        }
    }
}

/// Minimal page used when the template engine is not involved
fn simple_page(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head><meta charset="utf-8"><title>{title}</title></head>
<body><h1>{title}</h1><p>{message}</p><a href="/">На главную</a></body>
</html>"#
    )
}

/// 302 redirect
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Redirect that also stores the session cookie
pub fn found_with_session(location: &str, session: &Session) -> Response {
    let max_age = (session.expires_at - session.created_at).num_seconds().max(0);
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, session.id, max_age
    );
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string()), (header::SET_COOKIE, cookie)],
    )
        .into_response()
}

/// Cookie value that removes the session cookie
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Context shared by every page: the current user and an empty error list
pub fn page_context(identity: &Identity) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("user", &identity.user());
    context.insert("errors", &BTreeMap::<&str, Vec<&str>>::new());
    context
}

/// Put form errors into a page context
pub fn insert_errors(context: &mut TeraContext, errors: &FormErrors) {
    context.insert("errors", &errors.by_field());
}

/// Render a template into a 200 response
pub fn render(state: &AppState, template: &str, context: &TeraContext) -> Result<Response, PageError> {
    let html = state.templates.render(template, context)?;
    Ok(Html(html).into_response())
}

/// Parse a numeric path segment; anything else does not exist
pub fn parse_id(raw: &str) -> Result<i64, PageError> {
    raw.parse::<i64>().map_err(|_| PageError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_required_redirects() {
        let response = PageError::login_required("/notes/add/").into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/notes/add/"
        );
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(PageError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            PageError::comment(CommentServiceError::NotFound, "/x/")
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("abc"), Err(PageError::NotFound)));
    }
}

//! News site pages
//!
//! - GET / - latest news
//! - GET|POST /news/{id}/ - news detail, comment submission
//! - GET|POST /edit_comment/{id}/ - edit own comment
//! - GET|POST /delete_comment/{id}/ - delete own comment

use axum::{
    extract::{OriginalUri, Path, State},
    response::Response,
    routing::get,
    Extension, Router,
};

use crate::api::forms::FormData;
use crate::api::middleware::AppState;
use crate::api::responses::{found, insert_errors, page_context, parse_id, render, PageError};
use crate::api::urls;
use crate::models::{Comment, CommentForm, Identity};
use crate::services::{Action, CommentServiceError, FormErrors};
use crate::templates;

/// Build news routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/news/{id}/", get(detail).post(add_comment))
        .route("/edit_comment/{id}/", get(edit_form).post(edit_comment))
        .route("/delete_comment/{id}/", get(delete_form).post(delete_comment))
}

/// GET / - newest news first
pub async fn home(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let news_list = state.news_service.home().await?;

    let mut context = page_context(&identity);
    context.insert("news_list", &news_list);
    render(&state, templates::HOME, &context)
}

/// GET /news/{id}/
pub async fn detail(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    render_detail(&state, &identity, id, "", &FormErrors::new()).await
}

/// POST /news/{id}/ - add a comment
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    FormData(form): FormData<CommentForm>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let text = form.text.clone();

    match state.comment_service.create(&identity, id, form).await {
        Ok(_) => Ok(found(&urls::news_comments(id))),
        Err(CommentServiceError::ValidationError(errors)) => {
            render_detail(&state, &identity, id, &text, &errors).await
        }
        Err(e) => Err(PageError::comment(e, uri.path())),
    }
}

async fn render_detail(
    state: &AppState,
    identity: &Identity,
    id: i64,
    form_text: &str,
    errors: &FormErrors,
) -> Result<Response, PageError> {
    let detail = state.news_service.detail(id).await?;

    let mut context = page_context(identity);
    context.insert("news", &detail.news);
    context.insert("comments", &detail.comments);
    context.insert("form_text", form_text);
    insert_errors(&mut context, errors);
    render(state, templates::NEWS_DETAIL, &context)
}

/// GET /edit_comment/{id}/
pub async fn edit_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let comment = state
        .comment_service
        .get_own(&identity, id, Action::Edit)
        .await
        .map_err(|e| PageError::comment(e, uri.path()))?;

    let text = comment.text.clone();
    render_edit(&state, &identity, comment, &text, &FormErrors::new()).await
}

/// POST /edit_comment/{id}/
pub async fn edit_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    FormData(form): FormData<CommentForm>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let text = form.text.clone();

    match state.comment_service.edit(&identity, id, form).await {
        Ok(comment) => Ok(found(&urls::news_comments(comment.news_id))),
        Err(CommentServiceError::ValidationError(errors)) => {
            let comment = state
                .comment_service
                .get_own(&identity, id, Action::Edit)
                .await
                .map_err(|e| PageError::comment(e, uri.path()))?;
            render_edit(&state, &identity, comment, &text, &errors).await
        }
        Err(e) => Err(PageError::comment(e, uri.path())),
    }
}

async fn render_edit(
    state: &AppState,
    identity: &Identity,
    comment: Comment,
    form_text: &str,
    errors: &FormErrors,
) -> Result<Response, PageError> {
    let news = state.news_service.get(comment.news_id).await?;

    let mut context = page_context(identity);
    context.insert("comment", &comment);
    context.insert("news", &news);
    context.insert("form_text", form_text);
    insert_errors(&mut context, errors);
    render(state, templates::COMMENT_EDIT, &context)
}

/// GET /delete_comment/{id}/ - confirmation page
pub async fn delete_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let comment = state
        .comment_service
        .get_own(&identity, id, Action::Delete)
        .await
        .map_err(|e| PageError::comment(e, uri.path()))?;

    let mut context = page_context(&identity);
    context.insert("comment", &comment);
    render(&state, templates::COMMENT_DELETE, &context)
}

/// POST /delete_comment/{id}/
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let comment = state
        .comment_service
        .delete(&identity, id)
        .await
        .map_err(|e| PageError::comment(e, uri.path()))?;

    Ok(found(&urls::news_comments(comment.news_id)))
}

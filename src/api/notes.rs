//! Notes pages
//!
//! Every page here requires a logged-in user; notes of other users answer
//! 404. Successful changes land on `/notes/done/`.

use axum::{
    extract::{OriginalUri, Path, State},
    response::Response,
    routing::get,
    Extension, Router,
};
use serde::Serialize;

use crate::api::forms::FormData;
use crate::api::middleware::AppState;
use crate::api::responses::{found, insert_errors, page_context, render, PageError};
use crate::api::urls;
use crate::models::{Identity, Note, NoteForm};
use crate::services::{authorize, AccessDecision, Action, FormErrors, NoteServiceError};
use crate::templates;

/// Build notes routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notes/", get(list_notes))
        .route("/notes/add/", get(add_form).post(add_note))
        .route("/notes/done/", get(done))
        .route("/notes/note/{slug}/", get(note_detail))
        .route("/notes/edit/{slug}/", get(edit_form).post(edit_note))
        .route("/notes/delete/{slug}/", get(delete_form).post(delete_note))
}

/// Values shown in the note form
#[derive(Debug, Default, Serialize)]
struct NoteFormView {
    title: String,
    text: String,
    slug: String,
}

impl From<&Note> for NoteFormView {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
        }
    }
}

impl From<&NoteForm> for NoteFormView {
    fn from(form: &NoteForm) -> Self {
        Self {
            title: form.title.clone(),
            text: form.text.clone(),
            slug: form.slug.clone().unwrap_or_default(),
        }
    }
}

fn require_login(identity: &Identity, action: Action, path: &str) -> Result<(), PageError> {
    match authorize(identity, action, None) {
        AccessDecision::Allow if identity.is_authenticated() => Ok(()),
        _ => Err(PageError::login_required(path)),
    }
}

fn render_form(
    state: &AppState,
    identity: &Identity,
    action: &str,
    editing: bool,
    form: &NoteFormView,
    errors: &FormErrors,
) -> Result<Response, PageError> {
    let mut context = page_context(identity);
    context.insert("action", action);
    context.insert("editing", &editing);
    context.insert("form", form);
    insert_errors(&mut context, errors);
    render(state, templates::NOTE_FORM, &context)
}

/// GET /notes/ - the requester's notes
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    let notes = state
        .note_service
        .list(&identity)
        .await
        .map_err(|e| PageError::note(e, uri.path()))?;

    let mut context = page_context(&identity);
    context.insert("notes", &notes);
    render(&state, templates::NOTES_LIST, &context)
}

/// GET /notes/add/
pub async fn add_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    require_login(&identity, Action::Create, uri.path())?;
    render_form(
        &state,
        &identity,
        urls::NOTES_ADD,
        false,
        &NoteFormView::default(),
        &FormErrors::new(),
    )
}

/// POST /notes/add/
pub async fn add_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    OriginalUri(uri): OriginalUri,
    FormData(form): FormData<NoteForm>,
) -> Result<Response, PageError> {
    let view = NoteFormView::from(&form);

    match state.note_service.create(&identity, form).await {
        Ok(_) => Ok(found(urls::NOTES_DONE)),
        Err(NoteServiceError::ValidationError(errors)) => {
            render_form(&state, &identity, urls::NOTES_ADD, false, &view, &errors)
        }
        Err(e) => Err(PageError::note(e, uri.path())),
    }
}

/// GET /notes/done/
pub async fn done(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    require_login(&identity, Action::Read, uri.path())?;
    render(&state, templates::NOTES_DONE, &page_context(&identity))
}

/// GET /notes/note/{slug}/
pub async fn note_detail(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(slug): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    let note = state
        .note_service
        .get_own(&identity, &slug, Action::Read)
        .await
        .map_err(|e| PageError::note(e, uri.path()))?;

    let mut context = page_context(&identity);
    context.insert("note", &note);
    render(&state, templates::NOTE_DETAIL, &context)
}

/// GET /notes/edit/{slug}/
pub async fn edit_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(slug): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    let note = state
        .note_service
        .get_own(&identity, &slug, Action::Edit)
        .await
        .map_err(|e| PageError::note(e, uri.path()))?;

    render_form(
        &state,
        &identity,
        &urls::note_edit(&note.slug),
        true,
        &NoteFormView::from(&note),
        &FormErrors::new(),
    )
}

/// POST /notes/edit/{slug}/
pub async fn edit_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(slug): Path<String>,
    OriginalUri(uri): OriginalUri,
    FormData(form): FormData<NoteForm>,
) -> Result<Response, PageError> {
    let view = NoteFormView::from(&form);

    match state.note_service.edit(&identity, &slug, form).await {
        Ok(_) => Ok(found(urls::NOTES_DONE)),
        Err(NoteServiceError::ValidationError(errors)) => {
            render_form(&state, &identity, &urls::note_edit(&slug), true, &view, &errors)
        }
        Err(e) => Err(PageError::note(e, uri.path())),
    }
}

/// GET /notes/delete/{slug}/ - confirmation page
pub async fn delete_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(slug): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    let note = state
        .note_service
        .get_own(&identity, &slug, Action::Delete)
        .await
        .map_err(|e| PageError::note(e, uri.path()))?;

    let mut context = page_context(&identity);
    context.insert("note", &note);
    render(&state, templates::NOTE_DELETE, &context)
}

/// POST /notes/delete/{slug}/
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(slug): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, PageError> {
    state
        .note_service
        .delete(&identity, &slug)
        .await
        .map_err(|e| PageError::note(e, uri.path()))?;

    Ok(found(urls::NOTES_DONE))
}

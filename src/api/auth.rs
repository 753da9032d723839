//! Authentication pages
//!
//! - GET|POST /auth/login/ - login form; honours `next`
//! - GET|POST /auth/logout/ - ends the session
//! - GET|POST /auth/signup/ - registration; redirects to login

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;

use crate::api::forms::FormData;
use crate::api::middleware::{extract_session_token, AppState};
use crate::api::responses::{
    expired_session_cookie, found, found_with_session, insert_errors, page_context, render,
    PageError,
};
use crate::api::urls;
use crate::models::Identity;
use crate::services::user::{LoginInput, RegisterInput, UserServiceError};
use crate::services::FormErrors;
use crate::templates;

/// Query string of the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// Submitted login form
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login/", get(login_page).post(login))
        .route("/auth/logout/", get(logout).post(logout))
        .route("/auth/signup/", get(signup_page).post(signup))
}

fn render_login(
    state: &AppState,
    identity: &Identity,
    next: &str,
    username: &str,
    errors: &FormErrors,
) -> Result<Response, PageError> {
    let mut context = page_context(identity);
    context.insert("next", next);
    context.insert("username", username);
    insert_errors(&mut context, errors);
    render(state, templates::LOGIN, &context)
}

fn render_signup(
    state: &AppState,
    identity: &Identity,
    username: &str,
    errors: &FormErrors,
) -> Result<Response, PageError> {
    let mut context = page_context(identity);
    context.insert("username", username);
    insert_errors(&mut context, errors);
    render(state, templates::SIGNUP, &context)
}

/// GET /auth/login/
pub async fn login_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<NextQuery>,
) -> Result<Response, PageError> {
    let next = query.next.unwrap_or_default();
    render_login(&state, &identity, &next, "", &FormErrors::new())
}

/// POST /auth/login/ - open a session and go to `next`
pub async fn login(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    FormData(form): FormData<LoginForm>,
) -> Result<Response, PageError> {
    let input = LoginInput::new(form.username.clone(), form.password);

    match state.user_service.login(input).await {
        Ok((_user, session)) => {
            let target = urls::safe_next(form.next.as_deref());
            Ok(found_with_session(target, &session))
        }
        Err(UserServiceError::ValidationError(errors)) => render_login(
            &state,
            &identity,
            form.next.as_deref().unwrap_or_default(),
            &form.username,
            &errors,
        ),
        Err(e) => Err(e.into()),
    }
}

/// GET|POST /auth/logout/
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let page = render(&state, templates::LOGOUT, &page_context(&Identity::Anonymous))?;
    Ok(([(header::SET_COOKIE, expired_session_cookie())], page).into_response())
}

/// GET /auth/signup/
pub async fn signup_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    render_signup(&state, &identity, "", &FormErrors::new())
}

/// POST /auth/signup/
pub async fn signup(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    FormData(input): FormData<RegisterInput>,
) -> Result<Response, PageError> {
    let username = input.username.clone();

    match state.user_service.register(input).await {
        Ok(_) => Ok(found(urls::LOGIN)),
        Err(UserServiceError::ValidationError(errors)) => {
            render_signup(&state, &identity, &username, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

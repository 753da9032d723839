//! API layer - HTTP handlers and routing
//!
//! Server-rendered pages of both sites:
//! - news with comments (`/`, `/news/..`, `/edit_comment/..`, `/delete_comment/..`)
//! - personal notes (`/notes/..`)
//! - login, logout and sign-up (`/auth/..`)

pub mod auth;
pub mod forms;
pub mod middleware;
pub mod news;
pub mod notes;
pub mod responses;
pub mod urls;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

pub use middleware::{AppState, SESSION_COOKIE};
pub use responses::PageError;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(news::router())
        .merge(notes::router())
        .merge(auth::router())
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_identity,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> PageError {
    PageError::NotFound
}

//! Shared fixtures for the HTTP tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tower::ServiceExt;

use ya_sites::api::{build_router, AppState, SESSION_COOKIE};
use ya_sites::config::Config;
use ya_sites::db::repositories::{
    CommentRepository, NoteRepository, SqlxCommentRepository, SqlxNoteRepository,
};
use ya_sites::db::{create_test_pool, migrations, DynDatabasePool};
use ya_sites::models::{Comment, CreateNewsInput, News, Note, User};
use ya_sites::services::{Clock, FixedClock, NEWS_COUNT_ON_HOME_PAGE};

pub const PASSWORD: &str = "s3cret-Passw0rd";

/// A logged-in user and the session token they send
pub struct Client {
    pub user: User,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: DynDatabasePool,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let clock = Arc::new(FixedClock::new(start_time()));
        let state = AppState::new(pool.clone(), &Config::default(), clock.clone())
            .expect("Failed to build state");
        let router = build_router(state.clone());

        Self {
            router,
            state,
            pool,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Register a user and open a session for them
    pub async fn client(&self, username: &str) -> Client {
        let user = self
            .state
            .user_service
            .create_user(username, PASSWORD)
            .await
            .expect("Failed to create user");
        let session = self
            .state
            .user_service
            .start_session(&user)
            .await
            .expect("Failed to start session");

        Client {
            user,
            token: session.id,
        }
    }

    pub async fn news(&self) -> News {
        self.state
            .news_service
            .create_news(CreateNewsInput::new("Заголовок", "Текст"))
            .await
            .expect("Failed to create news")
    }

    /// One more news item than fits on the home page, one per day back
    pub async fn all_news(&self) -> Vec<News> {
        let today = self.now();
        let items = (0..=i64::from(NEWS_COUNT_ON_HOME_PAGE))
            .map(|index| {
                CreateNewsInput::new(format!("Новость {}", index), "Просто текст.")
                    .with_date(today - Duration::days(index))
            })
            .collect();

        self.state
            .news_service
            .create_many(items)
            .await
            .expect("Failed to create news")
    }

    pub async fn comment(&self, news: &News, author: &User, text: &str) -> Comment {
        SqlxCommentRepository::new(self.pool.clone())
            .create(news.id, author.id, text, self.now())
            .await
            .expect("Failed to create comment")
    }

    /// Ten comments one day apart, inserted newest first
    pub async fn all_comments(&self, news: &News, author: &User) -> Vec<Comment> {
        let repo = SqlxCommentRepository::new(self.pool.clone());
        let mut comments = Vec::new();
        for index in (0..10).rev() {
            let comment = repo
                .create(
                    news.id,
                    author.id,
                    &format!("Текст {}", index),
                    self.now() + Duration::days(index),
                )
                .await
                .expect("Failed to create comment");
            comments.push(comment);
        }
        comments
    }

    pub async fn note(&self, author: &User, slug: &str) -> Note {
        SqlxNoteRepository::new(self.pool.clone())
            .create("Заголовок", "Текст заметки", slug, author.id)
            .await
            .expect("Failed to create note")
    }

    pub async fn comment_count(&self) -> i64 {
        self.state.comment_service.count().await.expect("Failed to count")
    }

    pub async fn note_count(&self) -> i64 {
        self.state.note_service.count().await.expect("Failed to count")
    }

    pub async fn get(&self, uri: &str, client: Option<&Client>) -> Response {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(client) = client {
            request = request.header(header::COOKIE, session_cookie(client));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, client: Option<&Client>, form: &[(&str, &str)]) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(client) = client {
            request = request.header(header::COOKIE, session_cookie(client));
        }
        self.send(request.body(Body::from(encode_form(form))).unwrap())
            .await
    }

    /// POST without a content type or body
    pub async fn post_empty(&self, uri: &str, client: Option<&Client>) -> Response {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(client) = client {
            request = request.header(header::COOKIE, session_cookie(client));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        client: Option<&Client>,
        form: &[(&str, &str)],
    ) -> Response {
        let mut request = Request::builder().method("POST").uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        );
        if let Some(client) = client {
            request = request.header(header::COOKIE, session_cookie(client));
        }
        self.send(request.body(Body::from(encode_multipart(form))).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn session_cookie(client: &Client) -> String {
    format!("{}={}", SESSION_COOKIE, client.token)
}

pub fn encode_form(form: &[(&str, &str)]) -> String {
    form.iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

const MULTIPART_BOUNDARY: &str = "ya-sites-boundary";

pub fn encode_multipart(form: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (key, value) in form {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            MULTIPART_BOUNDARY, key, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", MULTIPART_BOUNDARY));
    body
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("No Location header")
        .to_str()
        .expect("Location is not ASCII")
}

pub fn assert_redirect(response: &Response, expected: &str) {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(response), expected);
}

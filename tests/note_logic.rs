//! Note creation, editing and deletion over HTTP

mod common;

use axum::http::StatusCode;
use common::{assert_redirect, body_text, TestApp};
use ya_sites::api::urls;
use ya_sites::db::repositories::{NoteRepository, SqlxNoteRepository};
use ya_sites::services::{slugify, SLUG_WARNING};

const TITLE: &str = "Новый заголовок";
const TEXT: &str = "Новый текст";
const SLUG: &str = "new-slug";

fn form<'a>(slug: &'a str) -> [(&'static str, &'a str); 3] {
    [("title", TITLE), ("text", TEXT), ("slug", slug)]
}

#[tokio::test]
async fn test_user_can_create_note() {
    let app = TestApp::new().await;
    let author = app.client("Автор").await;

    let response = app.post(urls::NOTES_ADD, Some(&author), &form(SLUG)).await;
    assert_redirect(&response, urls::NOTES_DONE);
    assert_eq!(app.note_count().await, 1);

    let note = SqlxNoteRepository::new(app.pool.clone())
        .get_by_slug(SLUG)
        .await
        .unwrap()
        .expect("Note was not stored");
    assert_eq!(note.title, TITLE);
    assert_eq!(note.text, TEXT);
    assert_eq!(note.author_id, author.user.id);
}

#[tokio::test]
async fn test_anonymous_user_cant_create_note() {
    let app = TestApp::new().await;

    let response = app.post(urls::NOTES_ADD, None, &form(SLUG)).await;
    assert_redirect(&response, &urls::login_redirect(urls::NOTES_ADD));
    assert_eq!(app.note_count().await, 0);
}

#[tokio::test]
async fn test_not_unique_slug() {
    let app = TestApp::new().await;
    let author = app.client("Автор").await;
    let existing = app.note(&author.user, "note-slug").await;

    let response = app
        .post(urls::NOTES_ADD, Some(&author), &form(&existing.slug))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(&format!("{}{}", existing.slug, SLUG_WARNING)));
    assert_eq!(app.note_count().await, 1);
}

#[tokio::test]
async fn test_empty_slug() {
    let app = TestApp::new().await;
    let author = app.client("Автор").await;

    let response = app
        .post(urls::NOTES_ADD, Some(&author), &[("title", TITLE), ("text", TEXT)])
        .await;
    assert_redirect(&response, urls::NOTES_DONE);

    let expected_slug = slugify(TITLE);
    assert_eq!(expected_slug, "novyij-zagolovok");
    let note = SqlxNoteRepository::new(app.pool.clone())
        .get_by_slug(&expected_slug)
        .await
        .unwrap();
    assert!(note.is_some());
}

#[tokio::test]
async fn test_author_can_edit_note() {
    let app = TestApp::new().await;
    let author = app.client("Автор").await;
    let note = app.note(&author.user, "note-slug").await;

    let response = app
        .post(&urls::note_edit(&note.slug), Some(&author), &form(SLUG))
        .await;
    assert_redirect(&response, urls::NOTES_DONE);

    let repo = SqlxNoteRepository::new(app.pool.clone());
    assert!(repo.get_by_slug(&note.slug).await.unwrap().is_none());
    let edited = repo.get_by_slug(SLUG).await.unwrap().unwrap();
    assert_eq!(edited.id, note.id);
    assert_eq!(edited.title, TITLE);
    assert_eq!(edited.text, TEXT);
}

#[tokio::test]
async fn test_other_user_cant_edit_note() {
    let app = TestApp::new().await;
    let author = app.client("Автор").await;
    let reader = app.client("Читатель").await;
    let note = app.note(&author.user, "note-slug").await;

    let response = app
        .post(&urls::note_edit(&note.slug), Some(&reader), &form(SLUG))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let stored = SqlxNoteRepository::new(app.pool.clone())
        .get_by_slug(&note.slug)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, note);
}

#[tokio::test]
async fn test_author_can_delete_note() {
    let app = TestApp::new().await;
    let author = app.client("Автор").await;
    let note = app.note(&author.user, "note-slug").await;

    let response = app
        .post(&urls::note_delete(&note.slug), Some(&author), &[])
        .await;
    assert_redirect(&response, urls::NOTES_DONE);
    assert_eq!(app.note_count().await, 0);
}

#[tokio::test]
async fn test_other_user_cant_delete_note() {
    let app = TestApp::new().await;
    let author = app.client("Автор").await;
    let reader = app.client("Читатель").await;
    let note = app.note(&author.user, "note-slug").await;

    let response = app
        .post(&urls::note_delete(&note.slug), Some(&reader), &[])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.note_count().await, 1);
}

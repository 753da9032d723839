//! Note repository
//!
//! Slug uniqueness is enforced by the `notes.slug` UNIQUE constraint as well
//! as checked up front through [`NoteRepository::slug_exists`].

use crate::db::DynDatabasePool;
use crate::models::Note;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

/// Note repository trait
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a new note
    async fn create(&self, title: &str, text: &str, slug: &str, author_id: i64) -> Result<Note>;

    /// Get note by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>>;

    /// Notes of one author, in insertion order
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Note>>;

    /// Check whether a slug is taken, ignoring the note with `exclude_id`
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Persist title, text and slug of an existing note
    async fn update(&self, note: &Note) -> Result<bool>;

    /// Delete a note. Returns false if it no longer exists.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count all notes
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based note repository implementation
pub struct SqlxNoteRepository {
    pool: DynDatabasePool,
}

impl SqlxNoteRepository {
    /// Create a new SQLx note repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NoteRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NoteRepository for SqlxNoteRepository {
    async fn create(&self, title: &str, text: &str, slug: &str, author_id: i64) -> Result<Note> {
        let result = sqlx::query(
            r#"
            INSERT INTO notes (title, text, slug, author_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(text)
        .bind(slug)
        .bind(author_id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create note")?;

        Ok(Note {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            text: text.to_string(),
            slug: slug.to_string(),
            author_id,
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Note>> {
        let row = sqlx::query("SELECT id, title, text, slug, author_id FROM notes WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get note by slug")?;

        row.as_ref().map(row_to_note).transpose()
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, title, text, slug, author_id FROM notes WHERE author_id = ? ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list notes")?;

        rows.iter().map(row_to_note).collect()
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM notes WHERE slug = ? AND (? IS NULL OR id != ?)",
        )
        .bind(slug)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to check slug")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn update(&self, note: &Note) -> Result<bool> {
        let result = sqlx::query("UPDATE notes SET title = ?, text = ?, slug = ? WHERE id = ?")
            .bind(&note.title)
            .bind(&note.text)
            .bind(&note.slug)
            .bind(note.id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update note")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete note")?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM notes")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count notes")?;

        Ok(row.get("count"))
    }
}

fn row_to_note(row: &SqliteRow) -> Result<Note> {
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        slug: row.try_get("slug")?,
        author_id: row.try_get("author_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup_test_repo() -> (SqlxNoteRepository, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("author".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create user");
        let reader = users
            .create(&User::new("reader".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create user");

        (SqlxNoteRepository::new(pool), author.id, reader.id)
    }

    #[tokio::test]
    async fn test_create_and_get_note() {
        let (repo, author, _) = setup_test_repo().await;

        let note = repo
            .create("Заголовок", "Текст", "note-slug", author)
            .await
            .expect("Failed to create note");

        let found = repo
            .get_by_slug("note-slug")
            .await
            .expect("Failed to get note")
            .expect("Note not found");
        assert_eq!(found, note);
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_author_only_own_notes() {
        let (repo, author, reader) = setup_test_repo().await;

        repo.create("a", "t", "a", author).await.unwrap();
        repo.create("b", "t", "b", reader).await.unwrap();
        repo.create("c", "t", "c", author).await.unwrap();

        let notes = repo.list_by_author(author).await.unwrap();
        let slugs: Vec<_> = notes.iter().map(|n| n.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "c"]);
        assert!(repo.list_by_author(reader + 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slug_exists_with_exclusion() {
        let (repo, author, _) = setup_test_repo().await;
        let note = repo.create("a", "t", "taken", author).await.unwrap();

        assert!(repo.slug_exists("taken", None).await.unwrap());
        assert!(!repo.slug_exists("taken", Some(note.id)).await.unwrap());
        assert!(repo.slug_exists("taken", Some(note.id + 1)).await.unwrap());
        assert!(!repo.slug_exists("free", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected_by_database() {
        let (repo, author, reader) = setup_test_repo().await;
        repo.create("a", "t", "same", author).await.unwrap();

        assert!(repo.create("b", "t", "same", reader).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_note() {
        let (repo, author, _) = setup_test_repo().await;
        let mut note = repo.create("a", "t", "old-slug", author).await.unwrap();

        note.title = "Новый заголовок".to_string();
        note.slug = "new-slug".to_string();
        assert!(repo.update(&note).await.unwrap());

        assert!(repo.get_by_slug("old-slug").await.unwrap().is_none());
        let found = repo.get_by_slug("new-slug").await.unwrap().unwrap();
        assert_eq!(found.title, "Новый заголовок");
        assert_eq!(found.author_id, author);

        assert!(repo.delete(note.id).await.unwrap());
        assert!(!repo.delete(note.id).await.unwrap());
    }
}

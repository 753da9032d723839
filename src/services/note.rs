//! Note service
//!
//! Personal notes: every operation requires a logged-in user and every
//! note is visible to its author only. Slugs are unique across all notes;
//! an omitted slug is derived from the title.

use crate::db::repositories::NoteRepository;
use crate::models::{Identity, Note, NoteForm, User};
use crate::services::access::{authorize, AccessDecision, Action};
use crate::services::forms::{self, FormErrors};
use crate::services::slug::slug_from_title;
use anyhow::Context;
use std::sync::Arc;

/// Maximum length of a note title
pub const TITLE_MAX_LENGTH: usize = 100;

/// Default maximum length of slugs
pub const SLUG_MAX_LENGTH: usize = 100;

/// Appended to a slug that is already taken
pub const SLUG_WARNING: &str = " - такой slug уже существует, придумайте уникальное значение!";

const SLUG_INVALID: &str = "Введите правильный «слаг», состоящий из букв, цифр, \
                            знаков подчеркивания или дефисов.";

/// Error types for note service operations
#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    #[error("Login required")]
    LoginRequired,

    /// Missing note, or a note owned by someone else
    #[error("Not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(FormErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn check(decision: AccessDecision) -> Result<(), NoteServiceError> {
    match decision {
        AccessDecision::Allow => Ok(()),
        AccessDecision::LoginRequired => Err(NoteServiceError::LoginRequired),
        AccessDecision::NotFound => Err(NoteServiceError::NotFound),
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

/// A validated note form
#[derive(Debug)]
struct CleanNote {
    title: String,
    text: String,
    slug: String,
}

/// Note service
pub struct NoteService {
    note_repo: Arc<dyn NoteRepository>,
    slug_max_length: usize,
}

impl NoteService {
    pub fn new(note_repo: Arc<dyn NoteRepository>) -> Self {
        Self::with_slug_max_length(note_repo, SLUG_MAX_LENGTH)
    }

    pub fn with_slug_max_length(note_repo: Arc<dyn NoteRepository>, slug_max_length: usize) -> Self {
        Self {
            note_repo,
            slug_max_length,
        }
    }

    /// The requester's own notes
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Note>, NoteServiceError> {
        let user = require_user(identity, Action::Read)?;
        let notes = self
            .note_repo
            .list_by_author(user.id)
            .await
            .context("Failed to list notes")?;

        Ok(notes)
    }

    /// A note the requester owns, for viewing, editing or deleting
    pub async fn get_own(
        &self,
        identity: &Identity,
        slug: &str,
        action: Action,
    ) -> Result<Note, NoteServiceError> {
        require_user(identity, action)?;

        let note = self
            .note_repo
            .get_by_slug(slug)
            .await
            .context("Failed to get note")?
            .ok_or(NoteServiceError::NotFound)?;

        let decision = authorize(identity, action, Some(note.author_id));
        if decision == AccessDecision::NotFound {
            tracing::warn!(
                "Rejected {:?} of note {} by user {:?}",
                action,
                note.slug,
                identity.user().map(|u| u.id)
            );
        }
        check(decision)?;

        Ok(note)
    }

    /// Create a note owned by the requester
    pub async fn create(&self, identity: &Identity, form: NoteForm) -> Result<Note, NoteServiceError> {
        let author = require_user(identity, Action::Create)?;
        let clean = self.clean(&form, None).await?;

        let note = self
            .note_repo
            .create(&clean.title, &clean.text, &clean.slug, author.id)
            .await
            .map_err(|e| self.storage_error(e, &clean.slug))?;

        tracing::info!("User {} created note {}", author.username, note.slug);
        Ok(note)
    }

    /// Update the requester's own note. An omitted slug is derived from the
    /// new title.
    pub async fn edit(
        &self,
        identity: &Identity,
        slug: &str,
        form: NoteForm,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self.get_own(identity, slug, Action::Edit).await?;
        let clean = self.clean(&form, Some(note.id)).await?;

        note.title = clean.title;
        note.text = clean.text;
        note.slug = clean.slug;

        let updated = self
            .note_repo
            .update(&note)
            .await
            .map_err(|e| self.storage_error(e, &note.slug))?;
        if !updated {
            return Err(NoteServiceError::NotFound);
        }

        tracing::info!("Note {} updated", note.slug);
        Ok(note)
    }

    /// Delete the requester's own note, returning what was removed
    pub async fn delete(&self, identity: &Identity, slug: &str) -> Result<Note, NoteServiceError> {
        let note = self.get_own(identity, slug, Action::Delete).await?;

        if !self
            .note_repo
            .delete(note.id)
            .await
            .context("Failed to delete note")?
        {
            return Err(NoteServiceError::NotFound);
        }

        tracing::info!("Note {} deleted", note.slug);
        Ok(note)
    }

    /// Total number of notes
    pub async fn count(&self) -> Result<i64, NoteServiceError> {
        Ok(self.note_repo.count().await.context("Failed to count notes")?)
    }

    /// Validate a note form. `exclude_id` is the note being edited, which
    /// may keep its own slug.
    async fn clean(&self, form: &NoteForm, exclude_id: Option<i64>) -> Result<CleanNote, NoteServiceError> {
        let title = form.title.trim();
        let text = form.text.trim();

        let mut errors = FormErrors::new();
        forms::require(&mut errors, "title", title);
        forms::max_length(&mut errors, "title", title, TITLE_MAX_LENGTH);
        forms::require(&mut errors, "text", text);

        let slug = match form.supplied_slug() {
            Some(slug) => {
                forms::max_length(&mut errors, "slug", slug, self.slug_max_length);
                if !slug
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                {
                    errors.add("slug", SLUG_INVALID);
                }
                slug.to_string()
            }
            None if title.is_empty() => String::new(),
            None => {
                let derived = slug_from_title(title, self.slug_max_length);
                if derived.is_empty() {
                    errors.add("slug", forms::REQUIRED_FIELD);
                }
                derived
            }
        };

        if !slug.is_empty()
            && self
                .note_repo
                .slug_exists(&slug, exclude_id)
                .await
                .context("Failed to check slug")?
        {
            errors.add("slug", format!("{}{}", slug, SLUG_WARNING));
        }

        errors.into_result().map_err(NoteServiceError::ValidationError)?;

        Ok(CleanNote {
            title: title.to_string(),
            text: text.to_string(),
            slug,
        })
    }

    /// A slug taken between the uniqueness check and the write still
    /// surfaces as a form error.
    fn storage_error(&self, err: anyhow::Error, slug: &str) -> NoteServiceError {
        if is_unique_violation(&err) {
            NoteServiceError::ValidationError(FormErrors::single(
                "slug",
                format!("{}{}", slug, SLUG_WARNING),
            ))
        } else {
            NoteServiceError::InternalError(err.context("Failed to save note"))
        }
    }
}

/// Every notes page needs a login, reads included
fn require_user(identity: &Identity, action: Action) -> Result<&User, NoteServiceError> {
    check(authorize(identity, action, None))?;
    identity.user().ok_or(NoteServiceError::LoginRequired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxNoteRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::slug::slugify;

    struct Fixture {
        service: NoteService,
        author: Identity,
        reader: Identity,
    }

    async fn setup_test_service() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("Лев Толстой".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create author");
        let reader = users
            .create(&User::new("Читатель простой".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create reader");

        Fixture {
            service: NoteService::new(SqlxNoteRepository::boxed(pool)),
            author: Identity::User(author),
            reader: Identity::User(reader),
        }
    }

    fn form_data() -> NoteForm {
        NoteForm::new("Form title", "Form text").with_slug("form-slug")
    }

    fn expect_validation(result: Result<Note, NoteServiceError>) -> FormErrors {
        match result {
            Err(NoteServiceError::ValidationError(errors)) => errors,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_user_can_create_note() {
        let f = setup_test_service().await;

        let note = f
            .service
            .create(&f.author, form_data())
            .await
            .expect("Failed to create note");

        assert_eq!(note.title, "Form title");
        assert_eq!(note.text, "Form text");
        assert_eq!(note.slug, "form-slug");
        assert_eq!(Some(note.author_id), f.author.user().map(|u| u.id));
        assert_eq!(f.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_cant_create_note() {
        let f = setup_test_service().await;

        let result = f.service.create(&Identity::Anonymous, form_data()).await;
        assert!(matches!(result, Err(NoteServiceError::LoginRequired)));
        assert_eq!(f.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_slug_must_be_unique() {
        let f = setup_test_service().await;
        f.service.create(&f.author, form_data()).await.unwrap();

        let errors = expect_validation(f.service.create(&f.reader, form_data()).await);
        assert_eq!(
            errors.for_field("slug"),
            vec![format!("form-slug{}", SLUG_WARNING).as_str()]
        );
        assert_eq!(f.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_slug_derived_from_title() {
        let f = setup_test_service().await;

        let note = f
            .service
            .create(&f.author, NoteForm::new("Война и мир", "Текст"))
            .await
            .expect("Failed to create note");

        assert_eq!(note.slug, slugify("Война и мир"));
        assert_eq!(note.slug, "vojna-i-mir");
    }

    #[tokio::test]
    async fn test_derived_slug_collision_reported() {
        let f = setup_test_service().await;
        f.service
            .create(&f.author, NoteForm::new("Form title", "a"))
            .await
            .unwrap();

        let errors = expect_validation(
            f.service
                .create(&f.author, NoteForm::new("Form title", "b"))
                .await,
        );
        assert!(errors.has("slug", &format!("form-title{}", SLUG_WARNING)));
    }

    #[tokio::test]
    async fn test_required_fields() {
        let f = setup_test_service().await;

        let errors = expect_validation(f.service.create(&f.author, NoteForm::default()).await);
        assert!(errors.has("title", forms::REQUIRED_FIELD));
        assert!(errors.has("text", forms::REQUIRED_FIELD));

        let errors = expect_validation(
            f.service
                .create(&f.author, NoteForm::new("日本語", "text"))
                .await,
        );
        assert!(errors.has("slug", forms::REQUIRED_FIELD));

        let errors = expect_validation(
            f.service
                .create(&f.author, NoteForm::new("t", "x").with_slug("не слаг"))
                .await,
        );
        assert!(errors.has("slug", SLUG_INVALID));
    }

    #[tokio::test]
    async fn test_long_title_derives_truncated_slug() {
        let f = setup_test_service().await;
        let title = "а".repeat(SLUG_MAX_LENGTH);

        let note = f
            .service
            .create(&f.author, NoteForm::new(title, "text"))
            .await
            .unwrap();
        assert_eq!(note.slug.len(), SLUG_MAX_LENGTH);

        let errors = expect_validation(
            f.service
                .create(&f.author, NoteForm::new("а".repeat(TITLE_MAX_LENGTH + 1), "text"))
                .await,
        );
        assert_eq!(errors.for_field("title").len(), 1);
    }

    #[tokio::test]
    async fn test_title_limit_independent_of_slug_limit() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let author = SqlxUserRepository::new(pool.clone())
            .create(&User::new("Автор".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create author");
        let service = NoteService::with_slug_max_length(SqlxNoteRepository::boxed(pool), 10);
        let author = Identity::User(author);

        let title = "Заголовок заметки подлиннее десяти символов";
        let note = service
            .create(&author, NoteForm::new(title, "text"))
            .await
            .expect("Long title should pass with a short slug limit");
        assert_eq!(note.title, title);
        assert!(note.slug.chars().count() <= 10);

        let errors = expect_validation(
            service
                .create(&author, NoteForm::new("Другая", "text").with_slug("slug-longer-than-ten"))
                .await,
        );
        assert_eq!(errors.for_field("slug").len(), 1);
        assert!(errors.for_field("title").is_empty());
    }

    #[tokio::test]
    async fn test_list_only_own_notes() {
        let f = setup_test_service().await;
        f.service.create(&f.author, form_data()).await.unwrap();
        f.service
            .create(&f.reader, NoteForm::new("Чужая", "text"))
            .await
            .unwrap();

        let notes = f.service.list(&f.author).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].slug, "form-slug");

        assert!(matches!(
            f.service.list(&Identity::Anonymous).await,
            Err(NoteServiceError::LoginRequired)
        ));
    }

    #[tokio::test]
    async fn test_detail_owner_only() {
        let f = setup_test_service().await;
        f.service.create(&f.author, form_data()).await.unwrap();

        assert!(f.service.get_own(&f.author, "form-slug", Action::Read).await.is_ok());
        assert!(matches!(
            f.service.get_own(&f.reader, "form-slug", Action::Read).await,
            Err(NoteServiceError::NotFound)
        ));
        assert!(matches!(
            f.service.get_own(&Identity::Anonymous, "form-slug", Action::Read).await,
            Err(NoteServiceError::LoginRequired)
        ));
    }

    #[tokio::test]
    async fn test_author_can_edit_note() {
        let f = setup_test_service().await;
        let note = f
            .service
            .create(
                &f.author,
                NoteForm::new("Тайтл заметки", "Текст заметки").with_slug("note-slug"),
            )
            .await
            .unwrap();

        let edited = f
            .service
            .edit(
                &f.author,
                &note.slug,
                NoteForm::new("Обновлённый тайтл", "Обновлённый текст заметки"),
            )
            .await
            .expect("Failed to edit note");

        assert_eq!(edited.id, note.id);
        assert_eq!(edited.title, "Обновлённый тайтл");
        assert_eq!(edited.text, "Обновлённый текст заметки");
        assert_eq!(edited.slug, slugify("Обновлённый тайтл"));
        assert_eq!(f.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_edit_keeps_own_slug() {
        let f = setup_test_service().await;
        f.service.create(&f.author, form_data()).await.unwrap();

        let edited = f
            .service
            .edit(
                &f.author,
                "form-slug",
                NoteForm::new("New title", "New text").with_slug("form-slug"),
            )
            .await
            .expect("Editing with the same slug should succeed");
        assert_eq!(edited.slug, "form-slug");
    }

    #[tokio::test]
    async fn test_edit_to_taken_slug_rejected() {
        let f = setup_test_service().await;
        f.service.create(&f.author, form_data()).await.unwrap();
        f.service
            .create(&f.author, NoteForm::new("Other", "text").with_slug("other"))
            .await
            .unwrap();

        let errors = expect_validation(
            f.service
                .edit(&f.author, "other", NoteForm::new("Other", "text").with_slug("form-slug"))
                .await,
        );
        assert!(errors.has("slug", &format!("form-slug{}", SLUG_WARNING)));
    }

    #[tokio::test]
    async fn test_other_user_cant_edit_or_delete_note() {
        let f = setup_test_service().await;
        let note = f.service.create(&f.author, form_data()).await.unwrap();

        let edit = f
            .service
            .edit(&f.reader, &note.slug, NoteForm::new("Взлом", "Взлом"))
            .await;
        assert!(matches!(edit, Err(NoteServiceError::NotFound)));

        let delete = f.service.delete(&f.reader, &note.slug).await;
        assert!(matches!(delete, Err(NoteServiceError::NotFound)));

        let unchanged = f
            .service
            .get_own(&f.author, &note.slug, Action::Read)
            .await
            .unwrap();
        assert_eq!(unchanged, note);
    }

    #[tokio::test]
    async fn test_author_can_delete_note() {
        let f = setup_test_service().await;
        let note = f.service.create(&f.author, form_data()).await.unwrap();

        let deleted = f
            .service
            .delete(&f.author, &note.slug)
            .await
            .expect("Failed to delete note");
        assert_eq!(deleted.id, note.id);
        assert_eq!(f.service.count().await.unwrap(), 0);
    }
}

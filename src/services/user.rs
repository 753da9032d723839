//! User service
//!
//! Sign-up, login and logout, and resolving a session token into the
//! [`Identity`] a request is made with.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Identity, Session, User};
use crate::services::clock::DynClock;
use crate::services::forms::{self, FormErrors};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Default session lifetime in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 14;

/// Longest accepted username
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Form-wide error key
pub const NON_FIELD_ERRORS: &str = "__all__";

const INVALID_LOGIN: &str = "Пожалуйста, введите правильные имя пользователя и пароль. \
                             Оба поля могут быть чувствительны к регистру.";
const PASSWORD_MISMATCH: &str = "Введенные пароли не совпадают.";
const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";
const USERNAME_INVALID: &str = "Введите правильное имя пользователя. \
                                Оно может содержать только буквы, цифры и знаки @/./+/-/_.";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Rejected sign-up or login form
    #[error("Validation error: {0}")]
    ValidationError(FormErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Submitted sign-up form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        password1: impl Into<String>,
        password2: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password1: password1.into(),
            password2: password2.into(),
        }
    }
}

/// Submitted login form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    clock: DynClock,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        clock: DynClock,
    ) -> Self {
        Self::with_session_expiration(
            user_repo,
            session_repo,
            clock,
            DEFAULT_SESSION_EXPIRATION_DAYS,
        )
    }

    /// Create a user service with a custom session lifetime
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        clock: DynClock,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            clock,
            session_expiration_days,
        }
    }

    /// Register a new account from the sign-up form
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let username = input.username.trim();

        let mut errors = FormErrors::new();
        forms::require(&mut errors, "username", username);
        forms::max_length(&mut errors, "username", username, USERNAME_MAX_LENGTH);
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add("username", USERNAME_INVALID);
        }
        forms::require(&mut errors, "password1", &input.password1);
        forms::require(&mut errors, "password2", &input.password2);
        if !input.password2.is_empty() && input.password1 != input.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
        }

        if errors.is_empty()
            && self
                .user_repo
                .get_by_username(username)
                .await
                .context("Failed to check username")?
                .is_some()
        {
            errors.add("username", USERNAME_TAKEN);
        }
        errors.into_result().map_err(UserServiceError::ValidationError)?;

        let user = self.create_user(username, &input.password1).await?;
        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Create an account without form validation
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, UserServiceError> {
        let password_hash = hash_password(password).context("Failed to hash password")?;

        let mut user = User::new(username.to_string(), password_hash);
        user.created_at = self.clock.now();

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    /// Check credentials and open a session
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let invalid = || UserServiceError::ValidationError(FormErrors::single(NON_FIELD_ERRORS, INVALID_LOGIN));

        let user = self
            .user_repo
            .get_by_username(input.username.trim())
            .await
            .context("Failed to get user by username")?
            .ok_or_else(invalid)?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::warn!("Failed login for {}", user.username);
            return Err(invalid());
        }

        let session = self.start_session(&user).await?;
        tracing::info!("User {} logged in", user.username);
        Ok((user, session))
    }

    /// Open a session for an already authenticated user
    pub async fn start_session(&self, user: &User) -> Result<Session, UserServiceError> {
        let now = self.clock.now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Validate session token and return the associated user.
    ///
    /// Unknown and expired tokens yield `None`; expired sessions are removed.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired_at(self.clock.now()) {
            tracing::debug!("Session for user {} expired", session.user_id);
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Resolve an optional session token into a request identity
    pub async fn identify(&self, token: Option<&str>) -> Result<Identity, UserServiceError> {
        match token {
            Some(token) => Ok(Identity::from(self.validate_session(token).await?)),
            None => Ok(Identity::Anonymous),
        }
    }

    /// Delete all expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired(self.clock.now())
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }
}

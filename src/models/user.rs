//! User model
//!
//! Defines the [`User`] entity and the [`Identity`] a request is made with.
//! Every ownership check in the services takes an `Identity` explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User. The password must already be hashed.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Check if the user is the author of a record
    pub fn owns(&self, author_id: i64) -> bool {
        self.id == author_id
    }
}

/// The identity a request is made with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    /// No valid session
    #[default]
    Anonymous,
    /// Logged-in user
    User(User),
}

impl Identity {
    /// The logged-in user, if any
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl From<Option<User>> for Identity {
    fn from(user: Option<User>) -> Self {
        user.map_or(Self::Anonymous, Self::User)
    }
}

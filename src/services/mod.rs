//! Services layer - Business logic
//!
//! Services implement the rules of both sites on top of the repositories:
//! - ownership checks and the login requirement
//! - form validation (bad words, slugs, required fields)
//! - listing order and the home page cap

pub mod access;
pub mod clock;
pub mod comment;
pub mod forms;
pub mod news;
pub mod note;
pub mod password;
pub mod slug;
pub mod user;

pub use access::{authorize, AccessDecision, Action};
pub use clock::{system_clock, Clock, DynClock, FixedClock, SystemClock};
pub use comment::{CommentService, CommentServiceError, BAD_WORDS, WARNING};
pub use forms::{FieldError, FormErrors, REQUIRED_FIELD};
pub use news::{NewsDetail, NewsService, NewsServiceError, NEWS_COUNT_ON_HOME_PAGE};
pub use note::{NoteService, NoteServiceError, SLUG_MAX_LENGTH, SLUG_WARNING};
pub use password::{hash_password, verify_password};
pub use slug::slugify;
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};

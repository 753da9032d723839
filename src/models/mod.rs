//! Data models
//!
//! Database entities (User, Session, News, Comment, Note), submitted form
//! types and the request [`Identity`].

mod comment;
mod news;
mod note;
mod session;
mod user;

pub use comment::{Comment, CommentForm, CommentWithAuthor};
pub use news::{CreateNewsInput, News, NewsSummary};
pub use note::{Note, NoteForm};
pub use session::Session;
pub use user::{Identity, User};

//! URL paths of both sites
//!
//! Handlers, tests and templates (through the `url()` template function)
//! build links with these helpers. The route patterns in each router use
//! the same paths with `{id}` and `{slug}` placeholders.

pub const HOME: &str = "/";
pub const LOGIN: &str = "/auth/login/";
pub const LOGOUT: &str = "/auth/logout/";
pub const SIGNUP: &str = "/auth/signup/";
pub const NOTES_LIST: &str = "/notes/";
pub const NOTES_ADD: &str = "/notes/add/";
pub const NOTES_DONE: &str = "/notes/done/";

pub fn news_detail(id: i64) -> String {
    format!("/news/{}/", id)
}

/// Comment block of a news page
pub fn news_comments(id: i64) -> String {
    format!("{}#comments", news_detail(id))
}

pub fn edit_comment(id: i64) -> String {
    format!("/edit_comment/{}/", id)
}

pub fn delete_comment(id: i64) -> String {
    format!("/delete_comment/{}/", id)
}

pub fn note_detail(slug: &str) -> String {
    format!("/notes/note/{}/", slug)
}

pub fn note_edit(slug: &str) -> String {
    format!("/notes/edit/{}/", slug)
}

pub fn note_delete(slug: &str) -> String {
    format!("/notes/delete/{}/", slug)
}

/// Login page that sends the user back to `next` afterwards
pub fn login_redirect(next: &str) -> String {
    format!(
        "{}?next={}",
        LOGIN,
        urlencoding::encode(next).replace("%2F", "/")
    )
}

/// Where to go after logging in. Only local absolute paths are honoured.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && path.chars().all(|c| c.is_ascii_graphic()) =>
        {
            path
        }
        _ => HOME,
    }
}

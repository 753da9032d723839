//! Ownership checks
//!
//! Every mutating action and every owner-only read goes through
//! [`authorize`]. Anonymous requests are sent to the login page; a
//! logged-in user touching someone else's record is told it does not exist.

use crate::models::Identity;

/// What the requester wants to do with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Edit,
    Delete,
}

/// Outcome of an ownership check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Redirect to the login page with `next` set to the requested URL
    LoginRequired,
    /// Report the record as missing
    NotFound,
}

/// Decide whether `identity` may perform `action`.
///
/// `owner_id` is the author of the target record, or `None` when the target
/// has no owner (public pages, the create forms).
pub fn authorize(identity: &Identity, action: Action, owner_id: Option<i64>) -> AccessDecision {
    let user = match identity {
        Identity::User(user) => user,
        Identity::Anonymous => {
            return match (action, owner_id) {
                (Action::Read, None) => AccessDecision::Allow,
                _ => AccessDecision::LoginRequired,
            };
        }
    };

    match owner_id {
        Some(owner) if !user.owns(owner) => AccessDecision::NotFound,
        _ => AccessDecision::Allow,
    }
}

//! Template functions

use std::collections::HashMap;
use tera::{Error, Function, Result, Value};

use crate::api::urls;

/// `url(name=..., id=... | slug=...)`: a path built by [`crate::api::urls`]
///
/// Paths are made of route literals, numeric ids and validated slugs, so
/// the output is not escaped.
pub struct UrlFor;

impl Function for UrlFor {
    fn call(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::msg("url() needs a `name` argument"))?;

        let id = || {
            args.get("id")
                .and_then(Value::as_i64)
                .ok_or_else(|| Error::msg(format!("url(name=\"{}\") needs an integer `id`", name)))
        };
        let slug = || {
            args.get("slug")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::msg(format!("url(name=\"{}\") needs a `slug`", name)))
        };

        let path = match name {
            "home" => urls::HOME.to_string(),
            "login" => urls::LOGIN.to_string(),
            "logout" => urls::LOGOUT.to_string(),
            "signup" => urls::SIGNUP.to_string(),
            "notes_list" => urls::NOTES_LIST.to_string(),
            "notes_add" => urls::NOTES_ADD.to_string(),
            "notes_done" => urls::NOTES_DONE.to_string(),
            "news_detail" => urls::news_detail(id()?),
            "news_comments" => urls::news_comments(id()?),
            "edit_comment" => urls::edit_comment(id()?),
            "delete_comment" => urls::delete_comment(id()?),
            "note_detail" => urls::note_detail(slug()?),
            "note_edit" => urls::note_edit(slug()?),
            "note_delete" => urls::note_delete(slug()?),
            other => return Err(Error::msg(format!("Unknown url name: {}", other))),
        };
        Ok(Value::String(path))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

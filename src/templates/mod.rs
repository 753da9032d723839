//! HTML rendering
//!
//! Page templates live in the top-level `templates/` directory and are
//! embedded into the binary. All of them are parsed once at startup, so a
//! broken template fails the boot rather than a request.

use rust_embed::RustEmbed;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

mod error;
mod functions;

pub use error::TemplateError;

/// Embedded page templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*"]
struct TemplateAssets;

pub const HOME: &str = "news/home.html";
pub const NEWS_DETAIL: &str = "news/detail.html";
pub const COMMENT_EDIT: &str = "news/edit.html";
pub const COMMENT_DELETE: &str = "news/delete.html";
pub const NOTES_LIST: &str = "notes/list.html";
pub const NOTE_DETAIL: &str = "notes/detail.html";
pub const NOTE_FORM: &str = "notes/form.html";
pub const NOTE_DELETE: &str = "notes/delete.html";
pub const NOTES_DONE: &str = "notes/success.html";
pub const LOGIN: &str = "registration/login.html";
pub const LOGOUT: &str = "registration/logout.html";
pub const SIGNUP: &str = "registration/signup.html";

/// Tera engine over the embedded templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Parse every embedded template
    pub fn new() -> Result<Self, TemplateError> {
        let mut templates = Vec::new();
        for name in TemplateAssets::iter() {
            let file = TemplateAssets::get(&name).ok_or_else(|| TemplateError::InvalidTemplate {
                name: name.to_string(),
                message: "missing from the embedded assets".to_string(),
            })?;
            let content = String::from_utf8(file.data.into_owned()).map_err(|e| {
                TemplateError::InvalidTemplate {
                    name: name.to_string(),
                    message: e.to_string(),
                }
            })?;
            templates.push((name.to_string(), content));
        }

        let mut tera = Tera::default();
        tera.register_function("url", functions::UrlFor);
        // Parents and children arrive in any order; inheritance is resolved
        // once everything is added.
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::LoadError(describe(&e)))?;

        tracing::info!("Loaded {} templates", tera.get_template_names().count());
        Ok(Self { tera })
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, TemplateError> {
        self.tera.render(template, context).map_err(|e| {
            TemplateError::RenderError(format!("Failed to render '{}': {}", template, describe(&e)))
        })
    }

    /// Names of all loaded templates
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }
}

/// Tera nests the useful part of an error in its source chain
fn describe(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

//! Template engine error types

use thiserror::Error;

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum TemplateError {
    /// An embedded template is missing or not valid UTF-8
    #[error("Invalid template '{name}': {message}")]
    InvalidTemplate { name: String, message: String },

    /// Template parsing or inheritance error
    #[error("Template load error: {0}")]
    LoadError(String),

    /// Template rendering error
    #[error("Template error: {0}")]
    RenderError(String),
}

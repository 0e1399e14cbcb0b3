//! Error types for every stage of the export pipeline.
//!
//! Missing profile fields are never errors: the mapper resolves them to
//! defaults. Everything else is surfaced through one of the enums below and
//! converted into a tagged [`crate::export::ExportFailure`] at the export
//! boundary.

use thiserror::Error;

use crate::export::ExportFormat;

/// Malformed template markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Unterminated tag, unmatched or mismatched section marker, unknown
    /// helper or invalid path. Positions are 1-based.
    #[error("template syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
}

impl TemplateError {
    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        TemplateError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Rejected layout configuration.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid page orientation '{0}' (expected 'portrait' or 'landscape')")]
    InvalidOrientation(String),

    #[error("invalid layout value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Profile input that cannot be interpreted as a profile record at all.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("profile must be a JSON object or null, got {0}")]
    NotAnObject(&'static str),
}

/// Any failure raised while exporting or delivering a document.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("unknown export format '{0}' (expected 'pdf' or 'html')")]
    UnknownFormat(String),

    #[error("no renderer registered for {0} export")]
    NoRenderer(ExportFormat),

    #[error("renderer failed: {0}")]
    Render(String),
}

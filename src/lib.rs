//! # cv-forge – Template-driven CV rendering engine
//!
//! This crate turns an employee profile into a styled, print-ready CV. The
//! pipeline stages are:
//!
//! 1. **Map** – raw profile → normalised employee data ([`profile`], [`mapper`])
//! 2. **Parse** – template markup → AST ([`template`])
//! 3. **Render** – AST + data → HTML ([`processor`], [`value`])
//! 4. **Style** – layout configuration → A4 stylesheet ([`layout_config`], [`css`])
//! 5. **Export** – compose and hand off to a document renderer ([`export`])
//!
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod css;
pub mod error;
pub mod export;
pub mod ffi;
pub mod layout_config;
pub mod mapper;
pub mod processor;
pub mod profile;
pub mod template;
pub mod templates;
pub mod value;

// Re-exports for convenience
pub use css::{generate_css, generate_css_for, LayoutStyleFactory};
pub use error::{ExportError, LayoutError, MappingError, TemplateError};
pub use export::{
    DocumentRenderer, ExportConfig, ExportDriver, ExportFailure, ExportFormat, FailureKind,
    HtmlRenderer, RenderResult, RenderedDocument, RendererRegistry,
};
pub use layout_config::{LayoutConfig, Orientation};
pub use mapper::{DataMapper, MappedEmployeeData, MapperOptions};
pub use processor::{LivePreview, ProcessorOptions, TemplateProcessor};
pub use profile::ProfileData;
pub use template::Template;
pub use value::TemplateValue;

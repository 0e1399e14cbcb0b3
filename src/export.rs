//! Export driver – ties mapping, templating and CSS generation into a single
//! call and routes the result to a document renderer.
//!
//! [`ExportDriver::export`] never fails across its boundary: every error is
//! returned as a tagged [`ExportFailure`] inside [`RenderResult`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use crate::css::LayoutStyleFactory;
use crate::error::{ExportError, LayoutError};
use crate::layout_config::{LayoutConfig, Orientation};
use crate::mapper::{DataMapper, MappedEmployeeData, MapperOptions};
use crate::processor::{escape_html, ProcessorOptions, TemplateProcessor};
use crate::profile::ProfileData;
use crate::template::Template;

/// Target document format. Selects the renderer in [`ExportDriver::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Html,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
        }
    }

    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "html" => Ok(ExportFormat::Html),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Html => "HTML",
        })
    }
}

/// Configuration for the export pipeline.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub mapper: MapperOptions,
    pub processor: ProcessorOptions,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The composed HTML body and stylesheet of one export.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub html: String,
    pub css: String,
    pub format: ExportFormat,
    pub orientation: Orientation,
    /// Document title (the employee's full name when known).
    pub title: String,
}

impl RenderedDocument {
    /// One self-contained HTML document with the stylesheet inlined, ready
    /// for a print-to-PDF renderer or a browser.
    pub fn to_standalone_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n<div class=\"cv-page\">\n{}\n</div>\n</body>\n</html>\n",
            escape_html(&self.title),
            self.css,
            self.html
        )
    }
}

/// Which stage rejected the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TemplateSyntax,
    InvalidLayoutOrientation,
    InvalidLayout,
    Composition,
}

/// A human-readable, caller-visible export failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ExportError> for ExportFailure {
    fn from(e: ExportError) -> Self {
        let kind = match &e {
            ExportError::Template(_) => FailureKind::TemplateSyntax,
            ExportError::Layout(LayoutError::InvalidOrientation(_)) => {
                FailureKind::InvalidLayoutOrientation
            }
            ExportError::Layout(_) => FailureKind::InvalidLayout,
            ExportError::Mapping(_)
            | ExportError::UnknownFormat(_)
            | ExportError::NoRenderer(_)
            | ExportError::Render(_) => FailureKind::Composition,
        };
        ExportFailure {
            kind,
            message: e.to_string(),
        }
    }
}

/// Outcome of [`ExportDriver::export`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResult {
    Rendered(RenderedDocument),
    Failed(ExportFailure),
}

impl RenderResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RenderResult::Rendered(_))
    }

    pub fn document(&self) -> Option<&RenderedDocument> {
        match self {
            RenderResult::Rendered(doc) => Some(doc),
            RenderResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ExportFailure> {
        match self {
            RenderResult::Rendered(_) => None,
            RenderResult::Failed(f) => Some(f),
        }
    }

    pub fn into_result(self) -> Result<RenderedDocument, ExportFailure> {
        match self {
            RenderResult::Rendered(doc) => Ok(doc),
            RenderResult::Failed(f) => Err(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Turns a composed document into the bytes of a downloadable artifact.
pub trait DocumentRenderer: Send + Sync {
    fn format(&self) -> ExportFormat;
    fn render(&self, doc: &RenderedDocument) -> Result<Vec<u8>, ExportError>;
}

/// Writes the standalone HTML document.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn render(&self, doc: &RenderedDocument) -> Result<Vec<u8>, ExportError> {
        Ok(doc.to_standalone_html().into_bytes())
    }
}

/// Renderers available to [`ExportDriver::deliver`], one per format.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: Vec<Box<dyn DocumentRenderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in HTML renderer.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HtmlRenderer));
        registry
    }

    /// Register `renderer`, replacing any previous one for the same format.
    pub fn register(&mut self, renderer: Box<dyn DocumentRenderer>) {
        let format = renderer.format();
        self.renderers.retain(|r| r.format() != format);
        self.renderers.push(renderer);
    }

    pub fn get(&self, format: ExportFormat) -> Option<&dyn DocumentRenderer> {
        self.renderers
            .iter()
            .find(|r| r.format() == format)
            .map(|r| r.as_ref())
    }

    pub fn formats(&self) -> Vec<ExportFormat> {
        self.renderers.iter().map(|r| r.format()).collect()
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ExportDriver {
    mapper: DataMapper,
    processor: TemplateProcessor,
}

impl ExportDriver {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            mapper: DataMapper::new(config.mapper),
            processor: TemplateProcessor::new(config.processor),
        }
    }

    pub fn mapper(&self) -> &DataMapper {
        &self.mapper
    }

    pub fn processor(&self) -> &TemplateProcessor {
        &self.processor
    }

    /// Map `profile`, render `template` and generate the stylesheet.
    pub fn export(
        &self,
        profile: &ProfileData,
        template: &str,
        layout: &LayoutConfig,
        format: ExportFormat,
    ) -> RenderResult {
        let composed = panic::catch_unwind(AssertUnwindSafe(|| {
            self.compose(profile, template, layout, format)
        }));
        match composed {
            Ok(Ok(doc)) => {
                log::info!(
                    "composed {} export '{}' ({} bytes html, {} bytes css, {})",
                    doc.format,
                    doc.title,
                    doc.html.len(),
                    doc.css.len(),
                    doc.orientation
                );
                RenderResult::Rendered(doc)
            }
            Ok(Err(e)) => {
                log::warn!("export failed: {e}");
                RenderResult::Failed(e.into())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("export aborted: {message}");
                RenderResult::Failed(ExportFailure {
                    kind: FailureKind::Composition,
                    message: format!("export aborted: {message}"),
                })
            }
        }
    }

    /// Like [`export`](Self::export) but from raw JSON. A missing layout
    /// means all defaults.
    pub fn export_json(
        &self,
        profile_json: &str,
        template: &str,
        layout_json: Option<&str>,
        format: ExportFormat,
    ) -> RenderResult {
        let profile = match ProfileData::from_json(profile_json) {
            Ok(p) => p,
            Err(e) => return RenderResult::Failed(ExportError::from(e).into()),
        };
        let layout = match layout_json.map(LayoutConfig::from_json).transpose() {
            Ok(l) => l.unwrap_or_default(),
            Err(e) => return RenderResult::Failed(ExportError::from(e).into()),
        };
        self.export(&profile, template, &layout, format)
    }

    /// Hand a composed document to the renderer registered for its format.
    pub fn deliver(
        &self,
        doc: &RenderedDocument,
        registry: &RendererRegistry,
    ) -> Result<Vec<u8>, ExportError> {
        let renderer = registry
            .get(doc.format)
            .ok_or(ExportError::NoRenderer(doc.format))?;
        let bytes = renderer.render(doc)?;
        log::debug!("{} renderer produced {} bytes", doc.format, bytes.len());
        Ok(bytes)
    }

    fn compose(
        &self,
        profile: &ProfileData,
        template: &str,
        layout: &LayoutConfig,
        format: ExportFormat,
    ) -> Result<RenderedDocument, ExportError> {
        // 1. Map profile data
        let mapped = self.mapper.map(profile);
        let data = mapped.to_value();

        // 2. Parse and render the template
        let parsed = Template::parse(template)?;
        for field in parsed.root_fields() {
            if !MappedEmployeeData::KEYS.contains(&field.as_str()) {
                log::warn!("template references unknown field '{field}'");
            }
        }
        let html = self.processor.render(&parsed, &data);

        // 3. Generate the stylesheet
        let orientation = layout.orientation()?;
        let css = LayoutStyleFactory::new(layout.resolve()?, orientation).stylesheet();

        let title = if mapped.full_name.is_empty() {
            "Curriculum Vitae".to_string()
        } else {
            mapped.full_name
        };

        Ok(RenderedDocument {
            html,
            css,
            format,
            orientation,
            title,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "<h1>{{full_name}}</h1>{{#each skills}}<p>{{name}}</p>{{/each}}";

    #[test]
    fn export_composes_html_and_css() {
        let driver = ExportDriver::default();
        let result = driver.export_json(
            r#"{"general_information": {"first_name": "Ada", "last_name": "Lovelace"}}"#,
            TEMPLATE,
            None,
            ExportFormat::Html,
        );
        let doc = result.into_result().unwrap();
        assert_eq!(doc.html, "<h1>Ada Lovelace</h1>");
        assert!(doc.css.contains("size: A4 portrait;"));
        assert_eq!(doc.title, "Ada Lovelace");
        assert_eq!(doc.orientation, Orientation::Portrait);
    }

    #[test]
    fn failures_are_tagged() {
        let driver = ExportDriver::default();
        let cases = [
            ("{}", "{{#if x}}", None, FailureKind::TemplateSyntax),
            (
                "{}",
                TEMPLATE,
                Some(r#"{"orientation": "sideways"}"#),
                FailureKind::InvalidLayoutOrientation,
            ),
            ("{}", TEMPLATE, Some(r#"{"accent_color": "red"}"#), FailureKind::InvalidLayout),
            ("{}", TEMPLATE, Some("{"), FailureKind::InvalidLayout),
            ("42", TEMPLATE, None, FailureKind::Composition),
        ];
        for (profile, template, layout, kind) in cases {
            let result = driver.export_json(profile, template, layout, ExportFormat::Pdf);
            let failure = result.failure().cloned().unwrap();
            assert_eq!(failure.kind, kind, "{failure:?}");
            assert!(!failure.message.is_empty());
        }
    }

    #[test]
    fn deliver_routes_by_format() {
        let driver = ExportDriver::default();
        let doc = driver
            .export(&ProfileData::default(), TEMPLATE, &LayoutConfig::default(), ExportFormat::Html)
            .into_result()
            .unwrap();
        let registry = RendererRegistry::with_builtin();
        let bytes = driver.deliver(&doc, &registry).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Curriculum Vitae</title>"));

        let pdf = RenderedDocument { format: ExportFormat::Pdf, ..doc };
        assert!(matches!(
            driver.deliver(&pdf, &registry),
            Err(ExportError::NoRenderer(ExportFormat::Pdf))
        ));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("html".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    struct FixedRenderer;

    impl DocumentRenderer for FixedRenderer {
        fn format(&self) -> ExportFormat {
            ExportFormat::Pdf
        }

        fn render(&self, doc: &RenderedDocument) -> Result<Vec<u8>, ExportError> {
            Ok(format!("%PDF-stub {}", doc.title).into_bytes())
        }
    }

    #[test]
    fn external_renderer_can_be_registered() {
        let mut registry = RendererRegistry::with_builtin();
        registry.register(Box::new(FixedRenderer));
        registry.register(Box::new(FixedRenderer));
        assert_eq!(registry.formats(), vec![ExportFormat::Html, ExportFormat::Pdf]);

        let driver = ExportDriver::default();
        let doc = driver
            .export(&ProfileData::default(), "x", &LayoutConfig::default(), ExportFormat::Pdf)
            .into_result()
            .unwrap();
        assert_eq!(driver.deliver(&doc, &registry).unwrap(), b"%PDF-stub Curriculum Vitae");
    }
}

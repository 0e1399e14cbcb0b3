//! CSS generator – turns a [`LayoutConfig`] into the stylesheet that lays the
//! rendered CV out as a paginated A4 document.
//!
//! Output is deterministic: rules are emitted in a fixed order and numbers
//! use a fixed format, so the same inputs always give byte-identical CSS.
//! The stylesheet never references external resources.

use std::fmt::Write as _;

use crate::error::LayoutError;
use crate::layout_config::{LayoutConfig, Orientation, ResolvedLayout};

/// Generate CSS for `orientation` given as text (`portrait`/`landscape`).
pub fn generate_css(config: &LayoutConfig, orientation: &str) -> Result<String, LayoutError> {
    let orientation: Orientation = orientation.parse()?;
    generate_css_for(config, orientation)
}

/// Generate CSS for an already-validated orientation.
pub fn generate_css_for(
    config: &LayoutConfig,
    orientation: Orientation,
) -> Result<String, LayoutError> {
    let layout = config.resolve()?;
    Ok(LayoutStyleFactory::new(layout, orientation).stylesheet())
}

/// Emits the stylesheet section by section from a resolved layout.
#[derive(Debug, Clone)]
pub struct LayoutStyleFactory {
    layout: ResolvedLayout,
    orientation: Orientation,
}

impl LayoutStyleFactory {
    pub fn new(layout: ResolvedLayout, orientation: Orientation) -> Self {
        Self {
            layout,
            orientation,
        }
    }

    pub fn layout(&self) -> &ResolvedLayout {
        &self.layout
    }

    /// The complete stylesheet.
    pub fn stylesheet(&self) -> String {
        let mut css = String::with_capacity(4096);
        self.page_rules(&mut css);
        self.variables(&mut css);
        self.base(&mut css);
        self.header(&mut css);
        self.sections(&mut css);
        self.items(&mut css);
        self.skills(&mut css);
        self.columns(&mut css);
        self.print_rules(&mut css);
        css
    }

    fn page_rules(&self, css: &mut String) {
        let (w, h) = self.orientation.page_size_mm();
        let m = &self.layout.margins;
        let _ = writeln!(css, "@page {{");
        let _ = writeln!(css, "  size: A4 {};", self.orientation);
        let _ = writeln!(
            css,
            "  margin: {}mm {}mm {}mm {}mm;",
            num(m.top),
            num(m.right),
            num(m.bottom),
            num(m.left)
        );
        let _ = writeln!(css, "}}");
        rule(
            css,
            ".cv-page",
            &[
                ("box-sizing", "border-box".to_string()),
                ("width", format!("{}mm", num(w))),
                ("min-height", format!("{}mm", num(h))),
                (
                    "padding",
                    format!(
                        "{}mm {}mm {}mm {}mm",
                        num(m.top),
                        num(m.right),
                        num(m.bottom),
                        num(m.left)
                    ),
                ),
                ("margin", "0 auto".to_string()),
                ("background", "#ffffff".to_string()),
            ],
        );
    }

    fn variables(&self, css: &mut String) {
        let l = &self.layout;
        rule(
            css,
            ":root",
            &[
                ("--cv-accent", l.accent_color.clone()),
                ("--cv-text", l.text_color.clone()),
                ("--cv-muted", l.muted_color.clone()),
                ("--cv-section-gap", format!("{}mm", num(l.section_spacing_mm))),
                ("--cv-item-gap", format!("{}mm", num(l.item_spacing_mm))),
            ],
        );
    }

    fn base(&self, css: &mut String) {
        let l = &self.layout;
        rule(
            css,
            "html, body",
            &[
                ("margin", "0".to_string()),
                ("padding", "0".to_string()),
            ],
        );
        rule(
            css,
            "body",
            &[
                ("font-family", l.font_family.clone()),
                ("font-size", format!("{}pt", num(l.base_font_size_pt))),
                ("line-height", num(l.line_height)),
                ("color", "var(--cv-text)".to_string()),
                ("-webkit-print-color-adjust", "exact".to_string()),
                ("print-color-adjust", "exact".to_string()),
            ],
        );
        rule(
            css,
            "h1, h2, h3, h4",
            &[
                ("font-family", l.heading_font_family.clone()),
                ("margin", "0".to_string()),
                ("line-height", "1.2".to_string()),
            ],
        );
        rule(
            css,
            "p",
            &[("margin", "0 0 var(--cv-item-gap) 0".to_string())],
        );
        rule(
            css,
            "a",
            &[
                ("color", "var(--cv-accent)".to_string()),
                ("text-decoration", "none".to_string()),
            ],
        );
        rule(
            css,
            "ul",
            &[
                ("margin", "0".to_string()),
                ("padding-left", "1.2em".to_string()),
            ],
        );
    }

    fn header(&self, css: &mut String) {
        let l = &self.layout;
        rule(
            css,
            ".cv-header",
            &[
                ("display", "flex".to_string()),
                ("align-items", "center".to_string()),
                ("gap", "6mm".to_string()),
                ("padding-bottom", "var(--cv-item-gap)".to_string()),
                ("margin-bottom", "var(--cv-section-gap)".to_string()),
                ("border-bottom", "2px solid var(--cv-accent)".to_string()),
            ],
        );
        rule(
            css,
            ".cv-photo",
            &[
                ("width", "28mm".to_string()),
                ("height", "28mm".to_string()),
                ("border-radius", "50%".to_string()),
                ("object-fit", "cover".to_string()),
                ("flex-shrink", "0".to_string()),
            ],
        );
        rule(
            css,
            ".cv-name",
            &[
                ("font-size", format!("{}pt", num(l.heading_font_size_pt))),
                ("font-weight", "700".to_string()),
                ("color", "var(--cv-text)".to_string()),
            ],
        );
        rule(
            css,
            ".cv-title",
            &[
                ("font-size", format!("{}pt", num(l.section_title_font_size_pt))),
                ("color", "var(--cv-accent)".to_string()),
                ("margin-top", "1mm".to_string()),
            ],
        );
        rule(
            css,
            ".cv-contact",
            &[
                ("display", "flex".to_string()),
                ("flex-wrap", "wrap".to_string()),
                ("gap", "2mm 5mm".to_string()),
                ("margin-top", "2mm".to_string()),
                ("color", "var(--cv-muted)".to_string()),
                ("font-size", format!("{}pt", num(l.base_font_size_pt * 0.9))),
            ],
        );
    }

    fn sections(&self, css: &mut String) {
        let l = &self.layout;
        rule(
            css,
            ".cv-section",
            &[
                ("margin-bottom", "var(--cv-section-gap)".to_string()),
                ("break-inside", "auto".to_string()),
            ],
        );
        rule(
            css,
            ".cv-section-title",
            &[
                ("font-size", format!("{}pt", num(l.section_title_font_size_pt))),
                ("font-weight", "700".to_string()),
                ("text-transform", "uppercase".to_string()),
                ("letter-spacing", "0.06em".to_string()),
                ("color", "var(--cv-accent)".to_string()),
                ("border-bottom", "1px solid var(--cv-accent)".to_string()),
                ("padding-bottom", "1mm".to_string()),
                ("margin-bottom", "var(--cv-item-gap)".to_string()),
                ("break-after", "avoid".to_string()),
            ],
        );
        rule(
            css,
            ".cv-empty",
            &[
                ("color", "var(--cv-muted)".to_string()),
                ("font-style", "italic".to_string()),
            ],
        );
    }

    fn items(&self, css: &mut String) {
        let l = &self.layout;
        rule(
            css,
            ".cv-item",
            &[
                ("margin-bottom", "var(--cv-item-gap)".to_string()),
                ("break-inside", "avoid".to_string()),
            ],
        );
        rule(
            css,
            ".cv-item-header",
            &[
                ("display", "flex".to_string()),
                ("justify-content", "space-between".to_string()),
                ("align-items", "baseline".to_string()),
                ("gap", "4mm".to_string()),
            ],
        );
        rule(
            css,
            ".cv-item-title",
            &[("font-weight", "600".to_string())],
        );
        rule(
            css,
            ".cv-item-meta",
            &[
                ("color", "var(--cv-muted)".to_string()),
                ("font-size", format!("{}pt", num(l.base_font_size_pt * 0.9))),
                ("white-space", "nowrap".to_string()),
            ],
        );
        rule(
            css,
            ".cv-item-body",
            &[("margin-top", "1mm".to_string())],
        );
        rule(
            css,
            ".cv-tags",
            &[
                ("display", "flex".to_string()),
                ("flex-wrap", "wrap".to_string()),
                ("gap", "1.5mm".to_string()),
                ("margin-top", "1mm".to_string()),
            ],
        );
        rule(
            css,
            ".cv-tag",
            &[
                ("border", "1px solid var(--cv-accent)".to_string()),
                ("color", "var(--cv-accent)".to_string()),
                ("border-radius", "2mm".to_string()),
                ("padding", "0.3mm 2mm".to_string()),
                ("font-size", format!("{}pt", num(l.base_font_size_pt * 0.85))),
            ],
        );
    }

    fn skills(&self, css: &mut String) {
        rule(
            css,
            ".cv-skills",
            &[
                ("display", "grid".to_string()),
                ("grid-template-columns", "repeat(auto-fill, minmax(45mm, 1fr))".to_string()),
                ("gap", "var(--cv-item-gap) 6mm".to_string()),
            ],
        );
        rule(
            css,
            ".cv-skill",
            &[("break-inside", "avoid".to_string())],
        );
        if self.layout.show_skill_bars {
            rule(
                css,
                ".cv-skill-bar",
                &[
                    ("height", "1.5mm".to_string()),
                    ("background", "#e5e7eb".to_string()),
                    ("border-radius", "1mm".to_string()),
                    ("overflow", "hidden".to_string()),
                    ("margin-top", "0.8mm".to_string()),
                ],
            );
            rule(
                css,
                ".cv-skill-level",
                &[
                    ("height", "100%".to_string()),
                    ("background", "var(--cv-accent)".to_string()),
                ],
            );
        } else {
            rule(
                css,
                ".cv-skill-bar",
                &[("display", "none".to_string())],
            );
        }
    }

    fn columns(&self, css: &mut String) {
        let l = &self.layout;
        if l.columns == 2 {
            rule(
                css,
                ".cv-grid",
                &[
                    ("display", "grid".to_string()),
                    (
                        "grid-template-columns",
                        format!("{}% 1fr", num(l.sidebar_width_percent)),
                    ),
                    ("gap", "8mm".to_string()),
                ],
            );
            rule(
                css,
                ".cv-sidebar",
                &[
                    ("border-right", "1px solid #e5e7eb".to_string()),
                    ("padding-right", "6mm".to_string()),
                ],
            );
        } else {
            rule(
                css,
                ".cv-grid",
                &[("display", "block".to_string())],
            );
        }
        rule(css, ".cv-main", &[("min-width", "0".to_string())]);
    }

    fn print_rules(&self, css: &mut String) {
        let _ = writeln!(css, "@media print {{");
        let _ = writeln!(css, "  .cv-page {{");
        let _ = writeln!(css, "    width: auto;");
        let _ = writeln!(css, "    min-height: 0;");
        let _ = writeln!(css, "    padding: 0;");
        let _ = writeln!(css, "  }}");
        let _ = writeln!(css, "  .cv-page-break {{");
        let _ = writeln!(css, "    break-before: page;");
        let _ = writeln!(css, "  }}");
        let _ = writeln!(css, "}}");
    }
}

/// Write one rule with its declarations in the given order.
fn rule(css: &mut String, selector: &str, declarations: &[(&str, String)]) {
    let _ = writeln!(css, "{selector} {{");
    for (property, value) in declarations {
        let _ = writeln!(css, "  {property}: {value};");
    }
    let _ = writeln!(css, "}}");
}

/// Fixed-precision number with trailing zeros removed: `15`, `1.45`, `9.5`.
fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::{DEFAULT_ACCENT_COLOR, DEFAULT_FONT_FAMILY};

    #[test]
    fn number_format() {
        assert_eq!(num(15.0), "15");
        assert_eq!(num(1.45), "1.45");
        assert_eq!(num(9.0 * 0.9), "8.1");
        assert_eq!(num(-0.0001), "0");
        assert_eq!(num(100.0), "100");
    }

    #[test]
    fn portrait_and_landscape_page_sizes() {
        let config = LayoutConfig::default();
        let portrait = generate_css(&config, "portrait").unwrap();
        assert!(portrait.contains("size: A4 portrait;"));
        assert!(portrait.contains("width: 210mm;"));
        assert!(portrait.contains("min-height: 297mm;"));

        let landscape = generate_css(&config, "landscape").unwrap();
        assert!(landscape.contains("size: A4 landscape;"));
        assert!(landscape.contains("width: 297mm;"));
        assert!(landscape.contains("min-height: 210mm;"));
    }

    #[test]
    fn defaults_are_emitted() {
        let css = generate_css(&LayoutConfig::default(), "portrait").unwrap();
        assert!(css.contains(&format!("font-family: {DEFAULT_FONT_FAMILY};")));
        assert!(css.contains(&format!("--cv-accent: {DEFAULT_ACCENT_COLOR};")));
        assert!(css.contains("margin: 15mm 15mm 15mm 15mm;"));
        assert!(css.contains("font-size: 10pt;"));
        assert!(css.contains("line-height: 1.45;"));
        assert!(css.contains("--cv-section-gap: 6mm;"));
    }

    #[test]
    fn configured_values_are_used() {
        let config = LayoutConfig {
            accent_color: Some("#AA0000".into()),
            font_family: Some("Georgia, serif".into()),
            base_font_size_pt: Some(11.5),
            columns: Some(2),
            sidebar_width_percent: Some(30.0),
            show_skill_bars: Some(false),
            ..Default::default()
        };
        let css = generate_css(&config, "portrait").unwrap();
        assert!(css.contains("--cv-accent: #aa0000;"));
        assert!(css.contains("font-family: Georgia, serif;"));
        assert!(css.contains("font-size: 11.5pt;"));
        assert!(css.contains("grid-template-columns: 30% 1fr;"));
        assert!(css.contains(".cv-skill-bar {\n  display: none;\n}"));
    }

    #[test]
    fn invalid_orientation_is_rejected() {
        let err = generate_css(&LayoutConfig::default(), "sideways").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidOrientation(ref s) if s == "sideways"));
    }

    #[test]
    fn no_external_references() {
        let css = generate_css(&LayoutConfig::default(), "landscape").unwrap();
        assert!(!css.contains("url("));
        assert!(!css.contains("@import"));
    }
}

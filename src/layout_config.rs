//! Layout config – the visual parameters of an exported CV.
//!
//! Every key is optional. [`LayoutConfig::resolve`] fills the gaps from the
//! documented defaults and validates what was supplied, producing a
//! [`ResolvedLayout`] the CSS generator can emit without further checks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// A4 in millimetres (portrait).
pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

pub const DEFAULT_MARGIN_MM: f64 = 15.0;
pub const DEFAULT_FONT_FAMILY: &str =
    r#"system-ui, -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif"#;
pub const DEFAULT_BASE_FONT_SIZE_PT: f64 = 10.0;
pub const DEFAULT_HEADING_FONT_SIZE_PT: f64 = 20.0;
pub const DEFAULT_SECTION_TITLE_FONT_SIZE_PT: f64 = 12.0;
pub const DEFAULT_LINE_HEIGHT: f64 = 1.45;
pub const DEFAULT_SECTION_SPACING_MM: f64 = 6.0;
pub const DEFAULT_ITEM_SPACING_MM: f64 = 3.0;
pub const DEFAULT_ACCENT_COLOR: &str = "#2563eb";
pub const DEFAULT_TEXT_COLOR: &str = "#1f2937";
pub const DEFAULT_MUTED_COLOR: &str = "#6b7280";
pub const DEFAULT_COLUMNS: u8 = 1;
pub const DEFAULT_SIDEBAR_WIDTH_PERCENT: f64 = 32.0;

/// Page orientation of the exported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Page width and height in millimetres.
    pub fn page_size_mm(self) -> (f64, f64) {
        match self {
            Orientation::Portrait => (A4_WIDTH_MM, A4_HEIGHT_MM),
            Orientation::Landscape => (A4_HEIGHT_MM, A4_WIDTH_MM),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl FromStr for Orientation {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(LayoutError::InvalidOrientation(s.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing layout options. Absent keys take the `DEFAULT_*` values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// `portrait` or `landscape`. Kept as text so an invalid value is
    /// rejected by the CSS generator rather than silently by the parser.
    pub orientation: Option<String>,

    /// Shorthand for all four margins; per-side values take precedence.
    pub margin_mm: Option<f64>,
    pub margin_top_mm: Option<f64>,
    pub margin_right_mm: Option<f64>,
    pub margin_bottom_mm: Option<f64>,
    pub margin_left_mm: Option<f64>,

    pub font_family: Option<String>,
    /// Defaults to `font_family`.
    pub heading_font_family: Option<String>,
    pub base_font_size_pt: Option<f64>,
    pub heading_font_size_pt: Option<f64>,
    pub section_title_font_size_pt: Option<f64>,
    pub line_height: Option<f64>,

    pub section_spacing_mm: Option<f64>,
    pub item_spacing_mm: Option<f64>,

    pub accent_color: Option<String>,
    pub text_color: Option<String>,
    pub muted_color: Option<String>,

    /// 1 for a single column, 2 for sidebar + main.
    pub columns: Option<u8>,
    pub sidebar_width_percent: Option<f64>,
    pub show_skill_bars: Option<bool>,
}

/// Margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// A fully specified, validated layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub margins: Margins,
    pub font_family: String,
    pub heading_font_family: String,
    pub base_font_size_pt: f64,
    pub heading_font_size_pt: f64,
    pub section_title_font_size_pt: f64,
    pub line_height: f64,
    pub section_spacing_mm: f64,
    pub item_spacing_mm: f64,
    pub accent_color: String,
    pub text_color: String,
    pub muted_color: String,
    pub columns: u8,
    pub sidebar_width_percent: f64,
    pub show_skill_bars: bool,
}

impl LayoutConfig {
    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// The configured orientation, `portrait` when unset.
    pub fn orientation(&self) -> Result<Orientation, LayoutError> {
        match &self.orientation {
            Some(s) => s.parse(),
            None => Ok(Orientation::default()),
        }
    }

    /// Apply defaults and validate every supplied value.
    pub fn resolve(&self) -> Result<ResolvedLayout, LayoutError> {
        let margin = length("margin_mm", self.margin_mm, DEFAULT_MARGIN_MM)?;
        let margins = Margins {
            top: length("margin_top_mm", self.margin_top_mm, margin)?,
            right: length("margin_right_mm", self.margin_right_mm, margin)?,
            bottom: length("margin_bottom_mm", self.margin_bottom_mm, margin)?,
            left: length("margin_left_mm", self.margin_left_mm, margin)?,
        };

        let font_family = font("font_family", self.font_family.as_deref(), DEFAULT_FONT_FAMILY)?;
        let heading_font_family = font(
            "heading_font_family",
            self.heading_font_family.as_deref(),
            &font_family,
        )?;

        let columns = self.columns.unwrap_or(DEFAULT_COLUMNS);
        if !(1..=2).contains(&columns) {
            return Err(invalid("columns", columns));
        }

        let sidebar_width_percent = length(
            "sidebar_width_percent",
            self.sidebar_width_percent,
            DEFAULT_SIDEBAR_WIDTH_PERCENT,
        )?;
        if !(10.0..=60.0).contains(&sidebar_width_percent) {
            return Err(invalid("sidebar_width_percent", sidebar_width_percent));
        }

        Ok(ResolvedLayout {
            margins,
            font_family,
            heading_font_family,
            base_font_size_pt: size(
                "base_font_size_pt",
                self.base_font_size_pt,
                DEFAULT_BASE_FONT_SIZE_PT,
            )?,
            heading_font_size_pt: size(
                "heading_font_size_pt",
                self.heading_font_size_pt,
                DEFAULT_HEADING_FONT_SIZE_PT,
            )?,
            section_title_font_size_pt: size(
                "section_title_font_size_pt",
                self.section_title_font_size_pt,
                DEFAULT_SECTION_TITLE_FONT_SIZE_PT,
            )?,
            line_height: size("line_height", self.line_height, DEFAULT_LINE_HEIGHT)?,
            section_spacing_mm: length(
                "section_spacing_mm",
                self.section_spacing_mm,
                DEFAULT_SECTION_SPACING_MM,
            )?,
            item_spacing_mm: length(
                "item_spacing_mm",
                self.item_spacing_mm,
                DEFAULT_ITEM_SPACING_MM,
            )?,
            accent_color: color(
                "accent_color",
                self.accent_color.as_deref(),
                DEFAULT_ACCENT_COLOR,
            )?,
            text_color: color("text_color", self.text_color.as_deref(), DEFAULT_TEXT_COLOR)?,
            muted_color: color(
                "muted_color",
                self.muted_color.as_deref(),
                DEFAULT_MUTED_COLOR,
            )?,
            columns,
            sidebar_width_percent,
            show_skill_bars: self.show_skill_bars.unwrap_or(true),
        })
    }
}

fn invalid(field: &'static str, value: impl fmt::Display) -> LayoutError {
    LayoutError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

/// Finite, non-negative.
fn length(field: &'static str, value: Option<f64>, default: f64) -> Result<f64, LayoutError> {
    match value {
        None => Ok(default),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(invalid(field, v)),
    }
}

/// Finite, strictly positive.
fn size(field: &'static str, value: Option<f64>, default: f64) -> Result<f64, LayoutError> {
    match value {
        None => Ok(default),
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(invalid(field, v)),
    }
}

/// `#rgb` or `#rrggbb`, normalised to lowercase.
fn color(field: &'static str, value: Option<&str>, default: &str) -> Result<String, LayoutError> {
    let Some(raw) = value else {
        return Ok(default.to_string());
    };
    let hex = raw.trim();
    let digits = hex.strip_prefix('#').unwrap_or("");
    if (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_lowercase())
    } else {
        Err(invalid(field, raw))
    }
}

/// A font stack that cannot escape its declaration or pull in remote files.
fn font(field: &'static str, value: Option<&str>, default: &str) -> Result<String, LayoutError> {
    let Some(raw) = value else {
        return Ok(default.to_string());
    };
    let stack = raw.trim();
    let forbidden = |c: char| matches!(c, ';' | '{' | '}' | '<' | '>' | '\\' | '@' | '(' | ')');
    if stack.is_empty() || stack.chars().any(forbidden) {
        return Err(invalid(field, raw));
    }
    // Quotes must be balanced so the declaration stays intact.
    if stack.matches('"').count() % 2 != 0 || stack.matches('\'').count() % 2 != 0 {
        return Err(invalid(field, raw));
    }
    Ok(stack.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_parsing() {
        assert_eq!("portrait".parse::<Orientation>().unwrap(), Orientation::Portrait);
        assert_eq!(" Landscape ".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert!(matches!(
            "sideways".parse::<Orientation>(),
            Err(LayoutError::InvalidOrientation(s)) if s == "sideways"
        ));
        assert_eq!(Orientation::Landscape.page_size_mm(), (297.0, 210.0));
    }

    #[test]
    fn empty_config_resolves_to_defaults() {
        let layout = LayoutConfig::default().resolve().unwrap();
        assert_eq!(layout.margins.top, DEFAULT_MARGIN_MM);
        assert_eq!(layout.font_family, DEFAULT_FONT_FAMILY);
        assert_eq!(layout.heading_font_family, DEFAULT_FONT_FAMILY);
        assert_eq!(layout.accent_color, DEFAULT_ACCENT_COLOR);
        assert_eq!(layout.columns, 1);
        assert!(layout.show_skill_bars);
    }

    #[test]
    fn per_side_margin_overrides_shorthand() {
        let config = LayoutConfig {
            margin_mm: Some(10.0),
            margin_left_mm: Some(25.0),
            ..Default::default()
        };
        let m = config.resolve().unwrap().margins;
        assert_eq!((m.top, m.right, m.bottom, m.left), (10.0, 10.0, 10.0, 25.0));
    }

    #[test]
    fn rejects_invalid_values() {
        let fonts = ["x; } body { display: none", "url(http://evil/font.woff)", "\"Open Sans"];
        let mut cases: Vec<LayoutConfig> = fonts
            .iter()
            .map(|f| LayoutConfig {
                font_family: Some(f.to_string()),
                ..Default::default()
            })
            .collect();
        cases.extend([
            LayoutConfig {
                accent_color: Some("blue".into()),
                ..Default::default()
            },
            LayoutConfig {
                accent_color: Some("#12345".into()),
                ..Default::default()
            },
            LayoutConfig {
                base_font_size_pt: Some(0.0),
                ..Default::default()
            },
            LayoutConfig {
                margin_mm: Some(-1.0),
                ..Default::default()
            },
            LayoutConfig {
                line_height: Some(f64::NAN),
                ..Default::default()
            },
            LayoutConfig {
                columns: Some(3),
                ..Default::default()
            },
            LayoutConfig {
                sidebar_width_percent: Some(90.0),
                ..Default::default()
            },
        ]);
        for config in cases {
            assert!(
                matches!(config.resolve(), Err(LayoutError::InvalidValue { .. })),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn quoted_font_names_are_accepted() {
        let config = LayoutConfig {
            font_family: Some(r#""Source Serif 4", 'Iowan Old Style', serif"#.into()),
            heading_font_family: Some(DEFAULT_FONT_FAMILY.into()),
            ..Default::default()
        };
        let layout = config.resolve().unwrap();
        assert_eq!(layout.font_family, r#""Source Serif 4", 'Iowan Old Style', serif"#);
        assert_eq!(layout.heading_font_family, DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn json_roundtrip_keeps_unset_keys_unset() {
        let config =
            LayoutConfig::from_json(r##"{"accent_color": "#ABC", "columns": 2}"##).unwrap();
        assert_eq!(config.accent_color.as_deref(), Some("#ABC"));
        assert_eq!(config.font_family, None);
        assert_eq!(config.resolve().unwrap().accent_color, "#abc");

        let parsed = LayoutConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }
}

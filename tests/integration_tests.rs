//! Integration tests for the cv-forge pipeline.
//!
//! These tests validate:
//! - Mapped data always carries every documented key
//! - Repeating and conditional blocks render exactly what the data implies
//! - CSS output is deterministic and honours the page orientation
//! - The export driver reports every failure as a tagged result

use pretty_assertions::assert_eq;
use sha2::{Digest, Sha256};

use cv_forge::error::LayoutError;
use cv_forge::export::{ExportDriver, ExportFormat, FailureKind, RendererRegistry};
use cv_forge::layout_config::LayoutConfig;
use cv_forge::mapper::{DataMapper, MappedEmployeeData};
use cv_forge::processor::TemplateProcessor;
use cv_forge::profile::ProfileData;
use cv_forge::{generate_css, templates};

// =====================================================================
// Helper
// =====================================================================

const ADA: &str = r#"{
    "general_information": {"first_name": "Ada", "last_name": "Lovelace"},
    "technical_skills": [{"name": "Math", "proficiency": 9}]
}"#;

const FULL: &str = r#"{
    "general_information": {
        "first_name": "Grace",
        "last_name": "Hopper",
        "designation": "Rear Admiral",
        "email": "grace@navy.mil",
        "biography": "Pioneer of <compilers> & COBOL."
    },
    "technical_skills": [{"name": "COBOL", "proficiency": 10}, {"name": "FLOW-MATIC", "proficiency": 8}],
    "specialized_skills": [{"name": "Debugging", "proficiency": 7}],
    "experiences": [
        {"company_name": "US Navy", "designation": "Officer", "start_date": "1943-12-01", "end_date": "1966-12-31"},
        {"company_name": "Remington Rand", "designation": "Programmer", "start_date": "1949-06", "is_current": true}
    ],
    "educations": [{"degree": "PhD Mathematics", "university": "Yale", "start_date": "1930", "end_date": "1934"}],
    "trainings": [{"title": "Mark I", "provider": "Harvard"}],
    "achievements": [{"name": "National Medal of Technology", "date": "1991-09"}],
    "projects": [{"name": "A-0", "technologies": ["UNIVAC I", "assembly"]}]
}"#;

fn profile(json: &str) -> ProfileData {
    ProfileData::from_json(json).unwrap()
}

fn render(template: &str, json: &str) -> String {
    let mapped = DataMapper::default().map(&profile(json));
    TemplateProcessor::default().process(template, &mapped).unwrap()
}

fn sha256(s: &str) -> String {
    Sha256::digest(s.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// =====================================================================
// Mapping tests
// =====================================================================

#[test]
fn mapped_data_has_every_key_for_empty_and_full_profiles() {
    for json in ["{}", "null", FULL] {
        let value = DataMapper::default().map(&profile(json)).to_value();
        for key in MappedEmployeeData::KEYS {
            assert!(value.field(key).is_some(), "{json}: missing key {key}");
        }
    }
}

#[test]
fn full_profile_is_normalised() {
    let mapped = DataMapper::default().map(&profile(FULL));
    assert_eq!(mapped.full_name, "Grace Hopper");
    assert_eq!(mapped.initials, "GH");
    assert_eq!(mapped.experiences[0].period, "Dec 1943 – Dec 1966");
    assert_eq!(mapped.experiences[1].end_date, "Present");
    assert_eq!(mapped.technical_skills[1].level_percent, 80.0);
    assert_eq!(mapped.projects[0].technologies_text, "UNIVAC I, assembly");
    // Only the closed entry counts without a reference date.
    assert_eq!(mapped.total_experience_years, 23.0);
}

// =====================================================================
// Template processing tests
// =====================================================================

#[test]
fn ada_lovelace_scenario() {
    let template = "<h1>{{full_name}}</h1><table>{{#each technical_skills}}<tr class=\"skill\"><td>{{name}}</td><td>{{level_percent}}%</td></tr>{{/each}}</table>";
    let html = render(template, ADA);

    assert_eq!(html.matches("Ada Lovelace").count(), 1);
    assert_eq!(html.matches("<tr class=\"skill\">").count(), 1);
    assert!(html.contains("<td>Math</td><td>90%</td>"), "{html}");
}

#[test]
fn three_element_list_repeats_in_order() {
    let json = r#"{"experiences": [
        {"company_name": "A"}, {"company_name": "B"}, {"company_name": "C"}
    ]}"#;
    let html = render("{{#each experiences}}[{{@number}}:{{company_name}}]{{/each}}", json);
    assert_eq!(html, "[1:A][2:B][3:C]");
}

#[test]
fn empty_list_renders_nothing_or_empty_state() {
    assert_eq!(render("{{#each projects}}<li>{{name}}</li>{{/each}}", "{}"), "");
    assert_eq!(
        render("{{#each projects}}<li>{{name}}</li>{{else}}<p>None</p>{{/each}}", "{}"),
        "<p>None</p>"
    );
}

#[test]
fn falsy_conditional_leaves_no_wrapper() {
    let template = "<main>{{#if has_achievements}}<section><h2>Awards</h2></section>{{/if}}</main>";
    assert_eq!(render(template, ADA), "<main></main>");
    assert!(render(template, FULL).contains("<section><h2>Awards</h2></section>"));
}

#[test]
fn values_are_escaped_unless_raw() {
    let html = render("{{biography}}|{{{biography}}}", FULL);
    assert_eq!(
        html,
        "Pioneer of &lt;compilers&gt; &amp; COBOL.|Pioneer of <compilers> & COBOL."
    );
}

#[test]
fn processing_is_idempotent() {
    let mapped = DataMapper::default().map(&profile(FULL));
    let processor = TemplateProcessor::default();
    let template = templates::classic();
    let first = processor.process(template, &mapped).unwrap();
    let second = processor.process(template, &mapped).unwrap();
    assert_eq!(first, second);
}

#[test]
fn builtin_templates_render_full_profile() {
    for name in templates::BUILTIN_NAMES {
        let html = render(templates::builtin(name).unwrap(), FULL);
        assert!(html.contains("Grace Hopper"), "{name}");
        assert!(!html.contains("{{"), "{name} left markup behind");
    }
}

#[test]
fn syntax_errors_carry_position() {
    let mapped = DataMapper::default().map(&ProfileData::default());
    let err = TemplateProcessor::default()
        .process("<p>\n  {{#if email}}\n</p>", &mapped)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("line 2"), "{message}");
}

// =====================================================================
// CSS tests
// =====================================================================

#[test]
fn css_is_deterministic() {
    let config = LayoutConfig::from_json(
        r##"{"accent_color": "#0F766E", "base_font_size_pt": 11, "columns": 2}"##,
    )
    .unwrap();
    let first = generate_css(&config, "landscape").unwrap();
    let second = generate_css(&config, "landscape").unwrap();
    assert_eq!(sha256(&first), sha256(&second));
    assert!(first.contains("#0f766e"));
}

#[test]
fn unset_options_use_defaults() {
    let css = generate_css(&LayoutConfig::default(), "portrait").unwrap();
    assert!(css.contains("size: A4 portrait;"));
    assert!(css.contains("margin: 15mm 15mm 15mm 15mm;"));
    assert!(css.contains("--cv-accent: #2563eb;"));
    assert!(css.contains("width: 210mm;"));
}

#[test]
fn landscape_swaps_page_dimensions() {
    let css = generate_css(&LayoutConfig::default(), "Landscape").unwrap();
    assert!(css.contains("size: A4 landscape;"));
    assert!(css.contains("width: 297mm;"));
}

#[test]
fn sideways_orientation_is_rejected() {
    let err = generate_css(&LayoutConfig::default(), "sideways").unwrap_err();
    assert!(matches!(err, LayoutError::InvalidOrientation(ref s) if s == "sideways"));
}

// =====================================================================
// Export tests
// =====================================================================

#[test]
fn export_produces_standalone_document() {
    let driver = ExportDriver::default();
    let doc = driver
        .export_json(FULL, templates::classic(), None, ExportFormat::Html)
        .into_result()
        .unwrap();
    let bytes = driver.deliver(&doc, &RendererRegistry::with_builtin()).unwrap();
    let html = String::from_utf8(bytes).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Grace Hopper</title>"));
    assert!(html.contains("<style>\n@page"));
    assert!(html.contains("<div class=\"cv-page\">"));
}

#[test]
fn export_failures_are_tagged() {
    let driver = ExportDriver::default();

    let syntax = driver.export_json(ADA, "{{/each}}", None, ExportFormat::Pdf);
    assert_eq!(syntax.failure().unwrap().kind, FailureKind::TemplateSyntax);

    let orientation = driver.export_json(
        ADA,
        "{{full_name}}",
        Some(r#"{"orientation": "sideways"}"#),
        ExportFormat::Pdf,
    );
    let failure = orientation.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::InvalidLayoutOrientation);
    assert!(failure.message.contains("sideways"));

    let profile = driver.export_json("[1, 2]", "{{full_name}}", None, ExportFormat::Pdf);
    assert_eq!(profile.failure().unwrap().kind, FailureKind::Composition);
}

#[test]
fn loosely_typed_profile_still_exports() {
    let json = r#"{
        "general_information": {"first_name": 42, "last_name": "Lovelace", "email": true},
        "technical_skills": [null, {"name": "Rust", "proficiency": "8"}, "junk"],
        "experiences": [{"company_name": "Engines Ltd", "is_current": "true"}]
    }"#;
    let template = concat!(
        "{{full_name}}|{{#each skills}}{{name}} {{level_percent}}{{/each}}|",
        "{{#each experiences}}{{end_date}}{{/each}}|{{email}}"
    );
    let doc = ExportDriver::default()
        .export_json(json, template, None, ExportFormat::Html)
        .into_result()
        .unwrap();
    assert_eq!(doc.html, "42 Lovelace|Rust 80|Present|");
}

#[test]
fn export_respects_landscape_layout() {
    let layout = LayoutConfig {
        orientation: Some("landscape".into()),
        ..LayoutConfig::default()
    };
    let result = ExportDriver::default().export(
        &profile(ADA),
        "{{full_name}}",
        &layout,
        ExportFormat::Pdf,
    );
    let doc = result.document().unwrap();
    assert_eq!(doc.html, "Ada Lovelace");
    assert_eq!(doc.css, generate_css(&layout, "landscape").unwrap());
}

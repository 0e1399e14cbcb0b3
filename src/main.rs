//! cvforge – command-line CV renderer.
//!
//! Usage:
//!   cvforge <profile.json> <template.html> [output] [--layout layout.json]
//!           [--landscape] [--format html|pdf] [--split] [--debug]
//!   cvforge <profile.json> --builtin classic [output]
//!
//! If `output` is omitted the document is written next to the profile with
//! the same stem (e.g. `ada.json` → `ada.html`).

use std::{env, fs, path::Path, path::PathBuf, process};

use cv_forge::export::{
    ExportConfig, ExportDriver, ExportFormat, RenderedDocument, RendererRegistry,
};
use cv_forge::error::ExportError;
use cv_forge::layout_config::LayoutConfig;
use cv_forge::processor::ProcessorOptions;
use cv_forge::profile::ProfileData;
use cv_forge::templates;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut layout_path: Option<PathBuf> = None;
    let mut builtin: Option<String> = None;
    let mut format = ExportFormat::Html;
    let mut landscape = false;
    let mut split = false;
    let mut debug = false;
    let mut dump_data = false;
    let mut positional: Vec<PathBuf> = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => landscape = true,
            "--split" => split = true,
            "--debug" | "-d" => debug = true,
            "--data" => dump_data = true,
            "--layout" => layout_path = Some(PathBuf::from(flag_value(&mut iter, arg, &args[0]))),
            "--builtin" | "-b" => builtin = Some(flag_value(&mut iter, arg, &args[0])),
            "--format" | "-f" => {
                let value = flag_value(&mut iter, arg, &args[0]);
                format = match value.parse() {
                    Ok(f) => f,
                    Err(e) => {
                        eprintln!("Error: {e}");
                        process::exit(1);
                    }
                };
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => positional.push(PathBuf::from(path)),
        }
    }

    init_logging(debug);

    let mut positional = positional.into_iter();
    let profile_path = positional.next();
    let template_path = if builtin.is_none() { positional.next() } else { None };
    let output_path = positional.next();
    if let Some(extra) = positional.next() {
        eprintln!("Unexpected argument: {}", extra.display());
        print_usage(&args[0]);
        process::exit(1);
    }

    let profile_path = match profile_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no profile file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let profile = match ProfileData::from_json(&read(&profile_path)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error reading profile '{}': {e}", profile_path.display());
            process::exit(1);
        }
    };

    let driver = ExportDriver::new(ExportConfig {
        processor: ProcessorOptions {
            debug,
            ..ProcessorOptions::default()
        },
        ..ExportConfig::default()
    });

    if dump_data {
        println!("{}", driver.mapper().map(&profile).to_json());
        return;
    }

    let template = match (&builtin, &template_path) {
        (Some(name), _) => match templates::builtin(name) {
            Some(t) => t.to_string(),
            None => {
                eprintln!(
                    "Error: unknown built-in template '{name}' (available: {})",
                    templates::BUILTIN_NAMES.join(", ")
                );
                process::exit(1);
            }
        },
        (None, Some(path)) => read(path),
        (None, None) => {
            eprintln!("Error: no template specified (pass a file or --builtin).");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let mut layout = match &layout_path {
        Some(path) => match LayoutConfig::from_json(&read(path)) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading layout '{}': {e}", path.display());
                process::exit(1);
            }
        },
        None => LayoutConfig::default(),
    };
    if landscape {
        layout.orientation = Some("landscape".to_string());
    }

    let doc = match driver.export(&profile, &template, &layout, format).into_result() {
        Ok(doc) => doc,
        Err(failure) => {
            eprintln!("Error generating CV: {failure}");
            process::exit(1);
        }
    };

    // Default output: same directory + same stem as the profile.
    let output = output_path.unwrap_or_else(|| {
        let mut o = profile_path.clone();
        o.set_extension(format.extension());
        o
    });
    ensure_parent(&output);

    if split {
        let css_path = output.with_extension("css");
        write(&output.with_extension("html"), doc.html.as_bytes());
        write(&css_path, doc.css.as_bytes());
        eprintln!(
            "Wrote '{}' and '{}' ({} + {} bytes)",
            output.with_extension("html").display(),
            css_path.display(),
            doc.html.len(),
            doc.css.len()
        );
        return;
    }

    let (output, bytes) = deliver(&driver, &doc, output);
    write(&output, &bytes);
    eprintln!(
        "Wrote '{}' ({} bytes, {} {})",
        output.display(),
        bytes.len(),
        doc.format,
        doc.orientation
    );
}

/// Render through the registry. Without a PDF renderer a PDF request
/// produces the print-ready HTML document instead.
fn deliver(driver: &ExportDriver, doc: &RenderedDocument, output: PathBuf) -> (PathBuf, Vec<u8>) {
    let registry = RendererRegistry::with_builtin();
    match driver.deliver(doc, &registry) {
        Ok(bytes) => (output, bytes),
        Err(ExportError::NoRenderer(format)) => {
            log::warn!("no {format} renderer available, writing print-ready HTML");
            let html = RenderedDocument {
                format: ExportFormat::Html,
                ..doc.clone()
            };
            match driver.deliver(&html, &registry) {
                Ok(bytes) => (output.with_extension("html"), bytes),
                Err(e) => {
                    eprintln!("Error rendering document: {e}");
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error rendering document: {e}");
            process::exit(1);
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn read(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", path.display());
            process::exit(1);
        }
    }
}

fn write(path: &Path, bytes: &[u8]) {
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}

// Create output directory if necessary.
fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("cvforge – CV template renderer (cv-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <profile.json> <template.html> [output] [flags]");
    eprintln!("  {prog} <profile.json> --builtin classic [output] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <profile.json>   Employee profile (general_information, skills, experiences, ...)");
    eprintln!("  <template.html>  Template markup ({{{{field}}}}, {{{{#each}}}}, {{{{#if}}}})");
    eprintln!("  [output]         Output path (default: profile stem with the format's extension)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --layout <file>  Layout configuration JSON (fonts, colours, margins)");
    eprintln!("  --landscape      Use landscape A4 (297×210 mm)");
    eprintln!("  --format <fmt>   html or pdf (default: html)");
    eprintln!("  --split          Write the HTML body and the CSS as separate files");
    eprintln!(
        "  --builtin <name> Use a built-in template: {}",
        templates::BUILTIN_NAMES.join(", ")
    );
    eprintln!("  --data           Print the mapped template data as JSON and exit");
    eprintln!("  --debug          Log template resolution steps");
    eprintln!("  --help           Print this message");
}

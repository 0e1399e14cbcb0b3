//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use the `extern "C"` calling convention and
//! `#[no_mangle]` so symbol names stay stable. The header is generated into
//! `include/cvforge.h` by `build.rs`.
//!
//! ## Strings
//! - Inputs are null-terminated UTF-8 strings.
//! - Strings returned through `out_*` pointers are allocated on the Rust heap
//!   and **must** be freed with `cvforge_free_string`.
//!
//! ## Error handling
//! Functions return a `c_int`: `0` on success, otherwise
//!
//! | code | meaning |
//! |------|---------|
//! | 1 | null pointer argument |
//! | 2 | invalid UTF-8 |
//! | 3 | template syntax error |
//! | 4 | invalid page orientation |
//! | 5 | invalid layout configuration |
//! | 6 | composition failure (profile input, output encoding) |
//!
//! The message is available from `cvforge_last_error`, which is
//! thread-local and therefore safe to call from multiple threads.
//!
//! ## Usage from Go (cgo)
//! ```go
//! // #cgo LDFLAGS: -lcv_forge
//! // #include "cvforge.h"
//! import "C"
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use crate::css::generate_css;
use crate::error::ExportError;
use crate::export::{ExportDriver, ExportFailure, ExportFormat, FailureKind, RenderResult};
use crate::layout_config::LayoutConfig;
use crate::mapper::DataMapper;
use crate::processor::TemplateProcessor;
use crate::profile::ProfileData;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Target format for [`cvforge_export`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvforgeExportFormat {
    Pdf = 0,
    Html = 1,
}

impl From<CvforgeExportFormat> for ExportFormat {
    fn from(f: CvforgeExportFormat) -> Self {
        match f {
            CvforgeExportFormat::Pdf => ExportFormat::Pdf,
            CvforgeExportFormat::Html => ExportFormat::Html,
        }
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Borrow a required string argument.
///
/// # Safety
/// `ptr`, if non-null, must point to a valid null-terminated string.
unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, c_int> {
    if ptr.is_null() {
        set_last_error(&format!("Null pointer argument: {name}"));
        return Err(1);
    }
    opt_str_arg(ptr, name).map(|s| s.unwrap_or_default())
}

/// Borrow an optional string argument; null means absent.
///
/// # Safety
/// `ptr`, if non-null, must point to a valid null-terminated string.
unsafe fn opt_str_arg<'a>(ptr: *const c_char, name: &str) -> Result<Option<&'a str>, c_int> {
    if ptr.is_null() {
        return Ok(None);
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Ok(Some(s)),
        Err(e) => {
            set_last_error(&format!("Invalid UTF-8 in {name}: {e}"));
            Err(2)
        }
    }
}

/// Hand `s` to the caller through `out`.
///
/// # Safety
/// `out` must be a valid, writable pointer.
unsafe fn write_string(s: String, out: *mut *mut c_char) -> Result<(), c_int> {
    match CString::new(s) {
        Ok(cs) => {
            *out = cs.into_raw();
            Ok(())
        }
        Err(_) => {
            set_last_error("Output contained a null byte");
            Err(6)
        }
    }
}

fn failure_code(kind: FailureKind) -> c_int {
    match kind {
        FailureKind::TemplateSyntax => 3,
        FailureKind::InvalidLayoutOrientation => 4,
        FailureKind::InvalidLayout => 5,
        FailureKind::Composition => 6,
    }
}

fn report(failure: &ExportFailure) -> c_int {
    set_last_error(&failure.message);
    failure_code(failure.kind)
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Map a profile, render a template and generate the stylesheet in one call.
///
/// # Parameters
/// - `profile_json`: employee profile as JSON
/// - `template`: template markup
/// - `layout_json`: layout configuration as JSON; pass `NULL` for defaults
/// - `format`: target document format. It tags the export only; the
///   outputs are always the HTML body and the stylesheet, and producing
///   PDF bytes is left to the host's own renderer.
/// - `out_html`: on success, receives the rendered HTML body
/// - `out_css`: on success, receives the generated stylesheet
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `cvforge_last_error`.
///
/// # Safety
/// - String arguments must be valid null-terminated strings (or `NULL`
///   where allowed).
/// - `out_html` and `out_css` must be valid pointers. Both outputs must be
///   freed with `cvforge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn cvforge_export(
    profile_json: *const c_char,
    template: *const c_char,
    layout_json: *const c_char,
    format: CvforgeExportFormat,
    out_html: *mut *mut c_char,
    out_css: *mut *mut c_char,
) -> c_int {
    if out_html.is_null() || out_css.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let inputs = str_arg(profile_json, "profile_json").and_then(|profile| {
        let template = str_arg(template, "template")?;
        let layout = opt_str_arg(layout_json, "layout_json")?;
        Ok((profile, template, layout))
    });
    let (profile, template, layout) = match inputs {
        Ok(i) => i,
        Err(code) => return code,
    };

    let driver = ExportDriver::default();
    match driver.export_json(profile, template, layout, format.into()) {
        RenderResult::Rendered(doc) => {
            if let Err(code) = write_string(doc.html, out_html) {
                return code;
            }
            if let Err(code) = write_string(doc.css, out_css) {
                cvforge_free_string(*out_html);
                *out_html = ptr::null_mut();
                return code;
            }
            0
        }
        RenderResult::Failed(failure) => report(&failure),
    }
}

/// Generate only the stylesheet.
///
/// # Parameters
/// - `layout_json`: layout configuration as JSON; pass `NULL` for defaults
/// - `orientation`: `"portrait"` or `"landscape"`
/// - `out_css`: on success, receives the stylesheet
///
/// # Safety
/// See [`cvforge_export`].
#[no_mangle]
pub unsafe extern "C" fn cvforge_generate_css(
    layout_json: *const c_char,
    orientation: *const c_char,
    out_css: *mut *mut c_char,
) -> c_int {
    if out_css.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    let layout = match opt_str_arg(layout_json, "layout_json") {
        Ok(l) => l,
        Err(code) => return code,
    };
    let orientation = match str_arg(orientation, "orientation") {
        Ok(o) => o,
        Err(code) => return code,
    };

    let css = layout
        .map(LayoutConfig::from_json)
        .transpose()
        .and_then(|config| generate_css(&config.unwrap_or_default(), orientation));
    match css {
        Ok(css) => match write_string(css, out_css) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(e) => report(&ExportFailure::from(ExportError::from(e))),
    }
}

/// Map a profile and render a template against it, without CSS.
///
/// # Parameters
/// - `template`: template markup
/// - `profile_json`: employee profile as JSON
/// - `out_html`: on success, receives the rendered HTML
///
/// # Safety
/// See [`cvforge_export`].
#[no_mangle]
pub unsafe extern "C" fn cvforge_process_template(
    template: *const c_char,
    profile_json: *const c_char,
    out_html: *mut *mut c_char,
) -> c_int {
    if out_html.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    let template = match str_arg(template, "template") {
        Ok(t) => t,
        Err(code) => return code,
    };
    let profile = match str_arg(profile_json, "profile_json") {
        Ok(p) => p,
        Err(code) => return code,
    };

    let rendered = ProfileData::from_json(profile)
        .map_err(ExportError::from)
        .and_then(|profile| {
            let mapped = DataMapper::default().map(&profile);
            Ok(TemplateProcessor::default().process(template, &mapped)?)
        });
    match rendered {
        Ok(html) => match write_string(html, out_html) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(e) => report(&ExportFailure::from(e)),
    }
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a string returned by any `cvforge_*` function.
///
/// # Safety
/// `s` must have been returned through an `out_*` pointer of this library,
/// or be null (a no-op).
#[no_mangle]
pub unsafe extern "C" fn cvforge_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next failing `cvforge_*` call on
/// the same thread. The caller should **not** free this pointer.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn cvforge_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn cvforge_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take(s: *mut c_char) -> String {
        let out = CStr::from_ptr(s).to_str().unwrap().to_string();
        cvforge_free_string(s);
        out
    }

    fn last_error() -> String {
        let p = cvforge_last_error();
        assert!(!p.is_null());
        unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
    }

    #[test]
    fn ffi_export() {
        let profile =
            c(r#"{"general_information": {"first_name": "Ada", "last_name": "Lovelace"}}"#);
        let template = c("<h1>{{full_name}}</h1>");
        let mut html: *mut c_char = ptr::null_mut();
        let mut css: *mut c_char = ptr::null_mut();

        let rc = unsafe {
            cvforge_export(
                profile.as_ptr(),
                template.as_ptr(),
                ptr::null(),
                CvforgeExportFormat::Pdf,
                &mut html,
                &mut css,
            )
        };

        assert_eq!(rc, 0, "Expected success");
        assert_eq!(unsafe { take(html) }, "<h1>Ada Lovelace</h1>");
        assert!(unsafe { take(css) }.contains("size: A4 portrait;"));
    }

    #[test]
    fn ffi_export_outputs_do_not_depend_on_format() {
        let profile = c(r#"{"name": "Grace Hopper", "technical_skills": [{"name": "COBOL"}]}"#);
        let template = c("<h1>{{full_name}}</h1>{{#each skills}}{{name}}{{/each}}");
        let mut outputs = Vec::new();

        for format in [CvforgeExportFormat::Pdf, CvforgeExportFormat::Html] {
            let mut html: *mut c_char = ptr::null_mut();
            let mut css: *mut c_char = ptr::null_mut();
            let rc = unsafe {
                cvforge_export(
                    profile.as_ptr(),
                    template.as_ptr(),
                    ptr::null(),
                    format,
                    &mut html,
                    &mut css,
                )
            };
            assert_eq!(rc, 0);
            outputs.push(unsafe { (take(html), take(css)) });
        }

        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0].0, "<h1>Grace Hopper</h1>COBOL");
    }

    #[test]
    fn ffi_export_reports_failure_kind() {
        let profile = c("{}");
        let template = c("{{#each skills}}");
        let mut html: *mut c_char = ptr::null_mut();
        let mut css: *mut c_char = ptr::null_mut();

        let rc = unsafe {
            cvforge_export(
                profile.as_ptr(),
                template.as_ptr(),
                ptr::null(),
                CvforgeExportFormat::Html,
                &mut html,
                &mut css,
            )
        };

        assert_eq!(rc, 3);
        assert!(html.is_null());
        assert!(last_error().contains("each"));
    }

    #[test]
    fn ffi_generate_css_landscape() {
        let orientation = c("landscape");
        let mut css: *mut c_char = ptr::null_mut();
        let rc = unsafe { cvforge_generate_css(ptr::null(), orientation.as_ptr(), &mut css) };
        assert_eq!(rc, 0);
        assert!(unsafe { take(css) }.contains("size: A4 landscape;"));
    }

    #[test]
    fn ffi_generate_css_rejects_orientation() {
        let orientation = c("sideways");
        let mut css: *mut c_char = ptr::null_mut();
        let rc = unsafe { cvforge_generate_css(ptr::null(), orientation.as_ptr(), &mut css) };
        assert_eq!(rc, 4);
        assert!(css.is_null());
        assert!(last_error().contains("sideways"));
    }

    #[test]
    fn ffi_process_template() {
        let template = c("{{#each skills}}<li>{{name}}</li>{{/each}}");
        let profile = c(r#"{"technical_skills": [{"name": "Rust"}, {"name": "SQL"}]}"#);
        let mut html: *mut c_char = ptr::null_mut();
        let rc =
            unsafe { cvforge_process_template(template.as_ptr(), profile.as_ptr(), &mut html) };
        assert_eq!(rc, 0);
        assert_eq!(unsafe { take(html) }, "<li>Rust</li><li>SQL</li>");
    }

    #[test]
    fn ffi_null_input() {
        let mut html: *mut c_char = ptr::null_mut();
        let rc = unsafe { cvforge_process_template(ptr::null(), ptr::null(), &mut html) };
        assert_eq!(rc, 1, "Should fail on null input");
    }

    #[test]
    fn ffi_invalid_utf8() {
        let bad = [0xffu8, 0xfe, 0x00];
        let profile = c("{}");
        let mut html: *mut c_char = ptr::null_mut();
        let rc = unsafe {
            cvforge_process_template(bad.as_ptr() as *const c_char, profile.as_ptr(), &mut html)
        };
        assert_eq!(rc, 2);
    }

    #[test]
    fn ffi_version() {
        let v = cvforge_version();
        let version = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}

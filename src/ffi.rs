//! FFI bindings for gazeflux
//!
//! This module provides C-compatible functions for calling gazeflux from other
//! languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `gazeflux_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::AnalysisConfig;
use crate::pipeline::{analyze_session_json, GazeAnalyzer};
use crate::schema::SampleAdapter;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Parse an optional config string; NULL means defaults
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<AnalysisConfig, String> {
    if config_json.is_null() {
        return Ok(AnalysisConfig::default());
    }
    let json = cstr_to_string(config_json).ok_or("Invalid config string pointer")?;
    AnalysisConfig::from_json(&json).map_err(|e| e.to_string())
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a recording JSON document and return the session report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a newly allocated string that must be freed with `gazeflux_free_string`.
/// - Returns NULL on error; call `gazeflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gazeflux_analyze_session(
    json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(c) => c,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    match analyze_session_json(&json_str, &config) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Analyzer API
// ============================================================================

/// Opaque handle to a GazeAnalyzer
pub struct GazeAnalyzerHandle {
    analyzer: GazeAnalyzer,
}

/// Create an analyzer. Reports produced through one handle share an instance ID.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Must be freed with `gazeflux_analyzer_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn gazeflux_analyzer_new(
    config_json: *const c_char,
) -> *mut GazeAnalyzerHandle {
    clear_last_error();

    let analyzer = match config_from_ptr(config_json).and_then(|c| {
        GazeAnalyzer::new(c).map_err(|e| e.to_string())
    }) {
        Ok(a) => a,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(GazeAnalyzerHandle { analyzer }))
}

/// Free an analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `gazeflux_analyzer_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gazeflux_analyzer_free(analyzer: *mut GazeAnalyzerHandle) {
    if !analyzer.is_null() {
        drop(Box::from_raw(analyzer));
    }
}

/// Analyze a recording with an existing analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `gazeflux_analyzer_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `gazeflux_free_string`.
/// - Returns NULL on error; call `gazeflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gazeflux_analyzer_analyze(
    analyzer: *const GazeAnalyzerHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(handle) = analyzer.as_ref() else {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    };

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = SampleAdapter::parse_recording(&json_str)
        .and_then(|recording| handle.analyzer.analyze_session(&recording))
        .and_then(|report| handle.analyzer.encoder().encode_to_json(&report));

    match result {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by gazeflux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a gazeflux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gazeflux_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next gazeflux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn gazeflux_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn gazeflux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawSample, Recording, TrialSpec};
    use crate::types::{AoiConfig, Rect};

    fn sample_recording_json() -> CString {
        let samples = (0..600)
            .map(|i| RawSample::new(i as f64 * 20.0, Some(480.0), Some(300.0)))
            .collect();
        let trial = |start: f64| TrialSpec {
            label: None,
            aoi: AoiConfig::new(
                Rect::new(480.0, 300.0, 520.0, 520.0),
                Rect::new(1440.0, 900.0, 520.0, 520.0),
            ),
            attention_getter: None,
            baseline_start: start,
            attention_start: start + 1000.0,
            test_start: start + 2000.0,
            test_end: start + 5000.0,
            target: None,
        };
        let recording = Recording {
            schema_version: None,
            subject_id: "ffi-subject".to_string(),
            frame_rate_hz: Some(50.0),
            samples,
            trials: vec![trial(0.0), trial(6000.0)],
            introduction: Vec::new(),
            familiarisation: Vec::new(),
        };
        CString::new(serde_json::to_string(&recording).unwrap()).unwrap()
    }

    #[test]
    fn test_ffi_analyze_session() {
        let json = sample_recording_json();

        unsafe {
            let result = gazeflux_analyze_session(json.as_ptr(), ptr::null());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("ffi-subject"));
            assert!(result_str.contains("trial_2"));

            gazeflux_free_string(result);
        }
    }

    #[test]
    fn test_ffi_analyzer_lifecycle() {
        let config = CString::new(r#"{"min_gaze_ms": 151.0}"#).unwrap();
        let json = sample_recording_json();

        unsafe {
            let analyzer = gazeflux_analyzer_new(config.as_ptr());
            assert!(!analyzer.is_null());

            let first = gazeflux_analyzer_analyze(analyzer, json.as_ptr());
            let second = gazeflux_analyzer_analyze(analyzer, json.as_ptr());
            assert!(!first.is_null());
            assert!(!second.is_null());

            let a: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(first).to_str().unwrap()).unwrap();
            let b: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(second).to_str().unwrap()).unwrap();
            assert_eq!(a["producer"]["instance_id"], b["producer"]["instance_id"]);

            gazeflux_free_string(first);
            gazeflux_free_string(second);
            gazeflux_analyzer_free(analyzer);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = gazeflux_analyze_session(invalid_json.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = gazeflux_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_bad_config() {
        let config = CString::new(r#"{"frame_rate_hz": -1.0}"#).unwrap();
        unsafe {
            assert!(gazeflux_analyzer_new(config.as_ptr()).is_null());
            let error_str = CStr::from_ptr(gazeflux_last_error()).to_str().unwrap();
            assert!(error_str.contains("frame_rate_hz"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = gazeflux_version();
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::GAZEFLUX_VERSION);
        }
    }
}

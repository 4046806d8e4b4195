//! FFI bindings for carelog analytics
//!
//! C-compatible functions for calling the engine from mobile and backend
//! hosts. All functions take null-terminated C strings and return allocated
//! memory that must be freed by the caller using `carelog_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, Utc};

use crate::config::AnalyticsConfig;
use crate::encoder::SummaryEncoder;
use crate::error::AnalyticsError;
use crate::repository::InMemoryRepository;
use crate::summary::{weekly_summary_json, AnalyticsEngine};

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

/// Resolve the `now` argument; NULL means the current time
unsafe fn parse_now(now_rfc3339: *const c_char) -> Result<DateTime<Utc>, AnalyticsError> {
    if now_rfc3339.is_null() {
        return Ok(Utc::now());
    }
    let raw = cstr_to_string(now_rfc3339)
        .ok_or_else(|| AnalyticsError::ParseError("Invalid now string pointer".to_string()))?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AnalyticsError::ParseError(format!("now: {e}")))
}

/// Hand a result back over the boundary
fn finish(result: Result<String, AnalyticsError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Build a weekly summary payload from a log dataset.
///
/// # Safety
/// - `dataset_json` and `child_id` must be valid null-terminated C strings.
/// - `now_rfc3339` may be NULL to use the current time.
/// - Returns a newly allocated string that must be freed with `carelog_free_string`.
/// - Returns NULL on error; call `carelog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn carelog_weekly_summary(
    dataset_json: *const c_char,
    child_id: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_string(dataset_json) else {
        set_last_error("Invalid dataset string pointer");
        return ptr::null_mut();
    };
    let Some(child) = cstr_to_string(child_id) else {
        set_last_error("Invalid child_id string pointer");
        return ptr::null_mut();
    };

    finish(parse_now(now_rfc3339).and_then(|now| weekly_summary_json(&json_str, &child, now)))
}

/// Compute pattern alerts from a log dataset and return them as a JSON array.
///
/// # Safety
/// - `dataset_json` and `child_id` must be valid null-terminated C strings.
/// - `now_rfc3339` may be NULL to use the current time.
/// - Returns a newly allocated string that must be freed with `carelog_free_string`.
/// - Returns NULL on error; call `carelog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn carelog_pattern_alerts(
    dataset_json: *const c_char,
    child_id: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_string(dataset_json) else {
        set_last_error("Invalid dataset string pointer");
        return ptr::null_mut();
    };
    let Some(child) = cstr_to_string(child_id) else {
        set_last_error("Invalid child_id string pointer");
        return ptr::null_mut();
    };

    let result = parse_now(now_rfc3339).and_then(|now| {
        let repo = InMemoryRepository::from_json(&json_str)?;
        let alerts = AnalyticsEngine::new().pattern_alerts(&repo, &child, now)?;
        Ok(serde_json::to_string(&alerts)?)
    });
    finish(result)
}

// ============================================================================
// Configured Engine API
// ============================================================================

/// Opaque handle to a configured engine
pub struct CarelogEngineHandle {
    engine: AnalyticsEngine,
    encoder: SummaryEncoder,
}

/// Create an engine from a configuration document.
///
/// # Safety
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a pointer that must be freed with `carelog_engine_free`.
/// - Returns NULL if the configuration is invalid; call `carelog_last_error`.
#[no_mangle]
pub unsafe extern "C" fn carelog_engine_new(
    config_json: *const c_char,
) -> *mut CarelogEngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        Ok(AnalyticsConfig::default())
    } else {
        match cstr_to_string(config_json) {
            Some(s) => AnalyticsConfig::from_json(&s),
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        }
    };

    match config.and_then(AnalyticsEngine::with_config) {
        Ok(engine) => Box::into_raw(Box::new(CarelogEngineHandle {
            engine,
            encoder: SummaryEncoder::new(),
        })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `carelog_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn carelog_engine_free(engine: *mut CarelogEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Build a weekly summary payload with a configured engine.
///
/// Payloads from the same handle share one producer instance ID.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `carelog_engine_new`.
/// - `dataset_json` and `child_id` must be valid null-terminated C strings.
/// - `now_rfc3339` may be NULL to use the current time.
/// - Returns a newly allocated string that must be freed with `carelog_free_string`.
/// - Returns NULL on error; call `carelog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn carelog_engine_weekly_summary(
    engine: *const CarelogEngineHandle,
    dataset_json: *const c_char,
    child_id: *const c_char,
    now_rfc3339: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let Some(json_str) = cstr_to_string(dataset_json) else {
        set_last_error("Invalid dataset string pointer");
        return ptr::null_mut();
    };
    let Some(child) = cstr_to_string(child_id) else {
        set_last_error("Invalid child_id string pointer");
        return ptr::null_mut();
    };

    let result = parse_now(now_rfc3339).and_then(|now| {
        let repo = InMemoryRepository::from_json(&json_str)?;
        let report = handle.engine.weekly_summary(&repo, &child, now)?;
        handle.encoder.encode_to_json(&child, now, &report)
    });
    finish(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by carelog functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a carelog function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn carelog_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next carelog call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn carelog_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn carelog_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> CString {
        CString::new(
            r#"{
            "meals": [
                {"id": 1, "child_id": "child-1", "meal_type": "PRE_MEAL", "timestamp": "2024-01-15T07:30:00Z"}
            ],
            "behavior_incidents": [
                {"id": 7, "child_id": "child-1", "behavior_type": "tantrum", "timestamp": "2024-01-15T11:30:00Z",
                 "analysis": {"antecedent": "Screen time ended", "request_status": "DENIED", "request_object": "Tablet"}}
            ]
        }"#,
        )
        .unwrap()
    }

    fn read(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        unsafe {
            let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
            carelog_free_string(ptr);
            value
        }
    }

    #[test]
    fn test_ffi_weekly_summary() {
        let dataset = sample_dataset();
        let child = CString::new("child-1").unwrap();
        let now = CString::new("2024-01-15T12:00:00Z").unwrap();

        let payload = read(unsafe {
            carelog_weekly_summary(dataset.as_ptr(), child.as_ptr(), now.as_ptr())
        });

        assert_eq!(payload["schema_version"], "carelog.weekly_summary.v1");
        assert_eq!(payload["computed_at_utc"], "2024-01-15T12:00:00Z");
        // 70 - 10 (one meal) - 15 (tantrum)
        assert_eq!(payload["summary"]["regulation_battery"]["level"], 45);
        assert_eq!(payload["summary"]["open_loops"][0]["request_object"], "Tablet");
        assert_eq!(payload["summary"]["open_loops"][0]["risk_level"], "High");
    }

    #[test]
    fn test_ffi_null_now_uses_clock() {
        let dataset = sample_dataset();
        let child = CString::new("child-1").unwrap();

        let payload =
            read(unsafe { carelog_weekly_summary(dataset.as_ptr(), child.as_ptr(), ptr::null()) });
        assert_eq!(payload["child_id"], "child-1");
    }

    #[test]
    fn test_ffi_pattern_alerts() {
        let dataset = sample_dataset();
        let child = CString::new("child-1").unwrap();
        let now = CString::new("2024-01-15T12:00:00Z").unwrap();

        let alerts = read(unsafe {
            carelog_pattern_alerts(dataset.as_ptr(), child.as_ptr(), now.as_ptr())
        });
        assert_eq!(alerts.as_array().unwrap().len(), 1);
        assert_eq!(alerts[0]["title"], "Low Meal Logging Frequency");
    }

    #[test]
    fn test_ffi_engine_lifecycle() {
        let config = CString::new(r#"{"abc_top_n": 1}"#).unwrap();
        let dataset = sample_dataset();
        let child = CString::new("child-1").unwrap();
        let now = CString::new("2024-01-15T12:00:00Z").unwrap();

        unsafe {
            let engine = carelog_engine_new(config.as_ptr());
            assert!(!engine.is_null());

            let first = read(carelog_engine_weekly_summary(
                engine,
                dataset.as_ptr(),
                child.as_ptr(),
                now.as_ptr(),
            ));
            let second = read(carelog_engine_weekly_summary(
                engine,
                dataset.as_ptr(),
                child.as_ptr(),
                now.as_ptr(),
            ));
            assert_eq!(first, second);
            assert_eq!(
                first["summary"]["abc_analysis"]["top_triggers"][0]["label"],
                "Screen time ended"
            );

            carelog_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_rejects_invalid_config() {
        let config = CString::new(r#"{"baseline_level": 150}"#).unwrap();
        unsafe {
            assert!(carelog_engine_new(config.as_ptr()).is_null());
            assert!(!carelog_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_rejects_oversized_window() {
        let config = CString::new(r#"{"summary_window_days": 100000000}"#).unwrap();
        unsafe {
            assert!(carelog_engine_new(config.as_ptr()).is_null());
            let error = CStr::from_ptr(carelog_last_error()).to_str().unwrap();
            assert!(error.starts_with("Invalid configuration"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();
        let child = CString::new("child-1").unwrap();
        let bad_now = CString::new("yesterday").unwrap();

        unsafe {
            let result = carelog_weekly_summary(invalid.as_ptr(), child.as_ptr(), ptr::null());
            assert!(result.is_null());
            let error = CStr::from_ptr(carelog_last_error()).to_str().unwrap();
            assert!(error.starts_with("Invalid JSON"));

            let dataset = sample_dataset();
            let result = carelog_weekly_summary(dataset.as_ptr(), child.as_ptr(), bad_now.as_ptr());
            assert!(result.is_null());
            assert!(!carelog_last_error().is_null());

            assert!(carelog_weekly_summary(ptr::null(), child.as_ptr(), ptr::null()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = carelog_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::ENGINE_VERSION);
        }
    }
}

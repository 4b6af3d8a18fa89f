//! FFI bindings for goodhours
//!
//! This module provides C-compatible functions for calling goodhours from the
//! on-device display layer. Inputs and outputs are JSON (settings are TOML),
//! passed as null-terminated C strings. Returned strings are allocated here and
//! must be freed by the caller using `gh_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, Utc};

use crate::config::{parse_timezone, validate_work_hours, Settings};
use crate::daily::classify_days;
use crate::error::ForecastError;
use crate::extractor::WindowExtractor;
use crate::pipeline::WindowProcessor;
use crate::reconciler::WindowReconciler;
use crate::splitter::WindowSplitter;
use crate::types::{ComfortPolicy, DailySample, HourlySample, Window, WorkHours};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Hand a JSON result to the caller, or record the error and return NULL
fn finish(result: Result<String, ForecastError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// JSON in, JSON out wrappers around the core

fn parse_samples(json: &str) -> Result<Vec<HourlySample>, ForecastError> {
    let mut samples: Vec<HourlySample> = serde_json::from_str(json)?;
    samples.sort_by_key(|s| s.time);
    Ok(samples)
}

fn extract_json(samples_json: &str, policy_json: &str) -> Result<String, ForecastError> {
    let samples = parse_samples(samples_json)?;
    let policy: ComfortPolicy = serde_json::from_str(policy_json)?;
    Ok(serde_json::to_string(&WindowExtractor::extract(&samples, &policy))?)
}

fn split_json(
    windows_json: &str,
    work_hours_json: Option<&str>,
    timezone: &str,
) -> Result<String, ForecastError> {
    let windows: Vec<Window> = serde_json::from_str(windows_json)?;
    let band: Option<WorkHours> = match work_hours_json {
        Some(json) => Some(serde_json::from_str(json)?),
        None => None,
    };
    if let Some(band) = band {
        validate_work_hours(band)?;
    }
    let tz = parse_timezone(timezone)?;
    Ok(serde_json::to_string(&WindowSplitter::split(windows, band, &tz))?)
}

fn reconcile_json(fresh_json: &str, previous_json: &str) -> Result<String, ForecastError> {
    let fresh: Vec<Window> = serde_json::from_str(fresh_json)?;
    let previous: Vec<Window> = serde_json::from_str(previous_json)?;
    Ok(serde_json::to_string(&WindowReconciler::reconcile(fresh, &previous))?)
}

fn classify_json(days_json: &str, policy_json: &str) -> Result<String, ForecastError> {
    let days: Vec<DailySample> = serde_json::from_str(days_json)?;
    let policy: ComfortPolicy = serde_json::from_str(policy_json)?;
    Ok(serde_json::to_string(&classify_days(&days, &policy))?)
}

fn process_json(
    processor: &mut WindowProcessor,
    location_id: &str,
    samples_json: &str,
    settings_toml: &str,
) -> Result<String, ForecastError> {
    let samples = parse_samples(samples_json)?;
    let settings = Settings::from_toml_str(settings_toml)?;
    settings.validate()?;
    let tz = settings.tz()?;
    let windows = processor.process(
        location_id,
        &samples,
        &settings.policy,
        settings.work_hours,
        &tz,
    );
    Ok(serde_json::to_string(&windows)?)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Extract windows from hourly samples.
///
/// # Safety
/// - `samples_json` (array of samples) and `policy_json` must be valid null-terminated C strings.
/// - Returns a newly allocated JSON array that must be freed with `gh_free_string`.
/// - Returns NULL on error; call `gh_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gh_extract_windows(
    samples_json: *const c_char,
    policy_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let samples_str = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid samples string pointer");
            return ptr::null_mut();
        }
    };

    let policy_str = match cstr_to_string(policy_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid policy string pointer");
            return ptr::null_mut();
        }
    };

    finish(extract_json(&samples_str, &policy_str))
}

/// Split windows against a work-hours band.
///
/// # Safety
/// - `windows_json` and `timezone` must be valid null-terminated C strings.
/// - `work_hours_json` may be NULL (no band) or a valid C string.
/// - Returns a newly allocated JSON array that must be freed with `gh_free_string`.
/// - Returns NULL on error; call `gh_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gh_split_windows(
    windows_json: *const c_char,
    work_hours_json: *const c_char,
    timezone: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let windows_str = match cstr_to_string(windows_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid windows string pointer");
            return ptr::null_mut();
        }
    };

    let tz_str = match cstr_to_string(timezone) {
        Some(s) => s,
        None => {
            set_last_error("Invalid timezone string pointer");
            return ptr::null_mut();
        }
    };

    let band_str = cstr_to_string(work_hours_json);

    finish(split_json(&windows_str, band_str.as_deref(), &tz_str))
}

/// Carry annotations from previous windows onto fresh ones.
///
/// # Safety
/// - `fresh_json` and `previous_json` must be valid null-terminated C strings.
/// - Returns a newly allocated JSON array that must be freed with `gh_free_string`.
/// - Returns NULL on error; call `gh_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gh_reconcile_windows(
    fresh_json: *const c_char,
    previous_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let fresh_str = match cstr_to_string(fresh_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid fresh windows string pointer");
            return ptr::null_mut();
        }
    };

    let previous_str = match cstr_to_string(previous_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid previous windows string pointer");
            return ptr::null_mut();
        }
    };

    finish(reconcile_json(&fresh_str, &previous_str))
}

/// Classify daily aggregates as good or not.
///
/// # Safety
/// - `days_json` and `policy_json` must be valid null-terminated C strings.
/// - Returns a newly allocated JSON array that must be freed with `gh_free_string`.
/// - Returns NULL on error; call `gh_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gh_classify_days(
    days_json: *const c_char,
    policy_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let days_str = match cstr_to_string(days_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid days string pointer");
            return ptr::null_mut();
        }
    };

    let policy_str = match cstr_to_string(policy_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid policy string pointer");
            return ptr::null_mut();
        }
    };

    finish(classify_json(&days_str, &policy_str))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a WindowProcessor
pub struct WindowProcessorHandle {
    processor: WindowProcessor,
}

/// Create a new WindowProcessor with an empty store.
///
/// # Safety
/// - Returns a pointer to a newly allocated WindowProcessor.
/// - Must be freed with `gh_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn gh_processor_new() -> *mut WindowProcessorHandle {
    clear_last_error();

    let handle = Box::new(WindowProcessorHandle {
        processor: WindowProcessor::new(),
    });
    Box::into_raw(handle)
}

/// Free a WindowProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gh_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gh_processor_free(processor: *mut WindowProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Recompute windows for a location, reconciling against and updating the store.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gh_processor_new`.
/// - `location_id`, `samples_json` and `settings_toml` must be valid null-terminated C strings.
/// - Returns a newly allocated JSON array that must be freed with `gh_free_string`.
/// - Returns NULL on error; call `gh_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gh_processor_process(
    processor: *mut WindowProcessorHandle,
    location_id: *const c_char,
    samples_json: *const c_char,
    settings_toml: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let location_str = match cstr_to_string(location_id) {
        Some(s) => s,
        None => {
            set_last_error("Invalid location_id string pointer");
            return ptr::null_mut();
        }
    };

    let samples_str = match cstr_to_string(samples_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid samples string pointer");
            return ptr::null_mut();
        }
    };

    let settings_str = match cstr_to_string(settings_toml) {
        Some(s) => s,
        None => {
            set_last_error("Invalid settings string pointer");
            return ptr::null_mut();
        }
    };

    finish(process_json(
        &mut handle.processor,
        &location_str,
        &samples_str,
        &settings_str,
    ))
}

/// Set or clear the plan on a stored window.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gh_processor_new`.
/// - `location_id` and `window_id` must be valid null-terminated C strings.
/// - `plan` may be NULL to clear the plan.
/// - Returns 1 if the window was annotated, 0 if no such window is stored, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn gh_processor_annotate(
    processor: *mut WindowProcessorHandle,
    location_id: *const c_char,
    window_id: *const c_char,
    plan: *const c_char,
    skipped: bool,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let location_str = match cstr_to_string(location_id) {
        Some(s) => s,
        None => {
            set_last_error("Invalid location_id string pointer");
            return -1;
        }
    };

    let window_str = match cstr_to_string(window_id) {
        Some(s) => s,
        None => {
            set_last_error("Invalid window_id string pointer");
            return -1;
        }
    };

    let plan_str = if plan.is_null() {
        None
    } else {
        match cstr_to_string(plan) {
            Some(s) => Some(s),
            None => {
                set_last_error("Invalid plan string pointer");
                return -1;
            }
        }
    };

    i32::from(
        handle
            .processor
            .annotate(&location_str, &window_str, plan_str, skipped),
    )
}

/// Drop stored windows that ended before `now_rfc3339`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gh_processor_new`.
/// - `now_rfc3339` must be a valid null-terminated C string.
/// - Returns the number of purged windows, or -1 on error.
#[no_mangle]
pub unsafe extern "C" fn gh_processor_purge_expired(
    processor: *mut WindowProcessorHandle,
    now_rfc3339: *const c_char,
) -> i64 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let now_str = match cstr_to_string(now_rfc3339) {
        Some(s) => s,
        None => {
            set_last_error("Invalid timestamp string pointer");
            return -1;
        }
    };

    match DateTime::parse_from_rfc3339(&now_str) {
        Ok(now) => handle.processor.purge_expired(now.with_timezone(&Utc)) as i64,
        Err(e) => {
            set_last_error(&format!("Invalid timestamp {now_str}: {e}"));
            -1
        }
    }
}

/// Save the processor's window store to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gh_processor_new`.
/// - Returns a newly allocated string that must be freed with `gh_free_string`.
/// - Returns NULL on error; call `gh_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gh_processor_save_store(
    processor: *mut WindowProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    finish(handle.processor.save_store())
}

/// Load the processor's window store from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gh_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `gh_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gh_processor_load_store(
    processor: *mut WindowProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_store(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by goodhours functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a goodhours function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gh_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next goodhours call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn gh_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the goodhours library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn gh_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

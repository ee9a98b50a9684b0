//! FFI bindings for Cogniscore
//!
//! This module provides C-compatible functions for calling the scoring engine from
//! client runtimes. All functions take null-terminated JSON strings and return
//! allocated memory that must be freed by the caller using `cogniscore_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::ScoringConfig;
use crate::error::ScoreError;
use crate::history::DEFAULT_HISTORY_WINDOW;
use crate::pipeline::{parse_session, score_session, ScoringEngine, ScoringProcessor};

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

/// Read a required string argument, recording an error when it is unusable
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {} string pointer", name));
    }
    value
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Return the string on success, or NULL with the error recorded
fn result_to_cstr(result: Result<String, ScoreError>) -> *mut c_char {
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

/// Score a finalized session and return ScoreBreakdown JSON.
///
/// # Safety
/// - `session_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `cogniscore_free_string`.
/// - Returns NULL on error; call `cogniscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_score_session(session_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json) = required_arg(session_json, "session JSON") else {
        return ptr::null_mut();
    };

    result_to_cstr(score_session(json))
}

/// Score a finalized session with a custom configuration.
///
/// # Safety
/// - `session_json` must be a valid null-terminated C string.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `cogniscore_free_string`.
/// - Returns NULL on error; call `cogniscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_score_session_with_config(
    session_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json) = required_arg(session_json, "session JSON") else {
        return ptr::null_mut();
    };

    let engine = if config_json.is_null() {
        Ok(ScoringEngine::default())
    } else {
        match required_arg(config_json, "config JSON") {
            Some(config) => ScoringConfig::from_json(&config).and_then(ScoringEngine::new),
            None => return ptr::null_mut(),
        }
    };

    result_to_cstr(engine.and_then(|engine| engine.score_json(&json)))
}

/// Validate a session without scoring it.
///
/// # Safety
/// - `session_json` must be a valid null-terminated C string.
/// - Returns 0 when the session can be scored, non-zero otherwise.
/// - On error, call `cogniscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_validate_session(session_json: *const c_char) -> i32 {
    clear_last_error();

    let Some(json) = required_arg(session_json, "session JSON") else {
        return -1;
    };

    let checked = parse_session(&json).and_then(|session| session.validate().map_err(ScoreError::from));
    match checked {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a ScoringProcessor
pub struct CogniscoreProcessorHandle {
    processor: ScoringProcessor,
}

/// Create a new processor with the specified history window.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `cogniscore_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_processor_new(
    history_window: i32,
) -> *mut CogniscoreProcessorHandle {
    clear_last_error();

    let window = if history_window <= 0 {
        DEFAULT_HISTORY_WINDOW
    } else {
        history_window as usize
    };

    let processor = ScoringProcessor::with_history_window(window);
    Box::into_raw(Box::new(CogniscoreProcessorHandle { processor }))
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cogniscore_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_processor_free(processor: *mut CogniscoreProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Score a session, record it, and return ScoredAttempt JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cogniscore_processor_new`.
/// - `session_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `cogniscore_free_string`.
/// - Returns NULL on error; call `cogniscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_processor_process(
    processor: *mut CogniscoreProcessorHandle,
    session_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(json) = required_arg(session_json, "session JSON") else {
        return ptr::null_mut();
    };

    result_to_cstr(handle.processor.process(&json))
}

/// Return one learner's overview as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cogniscore_processor_new`.
/// - `subject_id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `cogniscore_free_string`.
/// - Returns NULL on error; call `cogniscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_processor_overview(
    processor: *mut CogniscoreProcessorHandle,
    subject_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(subject) = required_arg(subject_id, "subject id") else {
        return ptr::null_mut();
    };

    result_to_cstr(
        serde_json::to_string(&handle.processor.overview(&subject))
            .map_err(ScoreError::from),
    )
}

/// Save processor history to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cogniscore_processor_new`.
/// - Returns a newly allocated string that must be freed with `cogniscore_free_string`.
/// - Returns NULL on error; call `cogniscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_processor_save_history(
    processor: *mut CogniscoreProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    result_to_cstr(handle.processor.save_history())
}

/// Load processor history from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cogniscore_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `cogniscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_processor_load_history(
    processor: *mut CogniscoreProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let Some(json_str) = required_arg(json, "history JSON") else {
        return -1;
    };

    match handle.processor.load_history(&json_str) {
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

/// Free a string returned by Cogniscore functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Cogniscore function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Cogniscore call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn cogniscore_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

//! FFI bindings for Posture Flux
//!
//! This module provides C-compatible functions for calling Posture Flux from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `posture_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::calibration::LevelAtEyeHeight;
use crate::config::PostureConfig;
use crate::pipeline::{frame_to_report, PostureProcessor};

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

// ============================================================================
// Stateless API
// ============================================================================

/// Classify one frame and return the report JSON.
///
/// # Safety
/// - `frame_json` must be a valid null-terminated C string.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `posture_free_string`.
/// - Returns NULL on error or when the frame has no usable pose; in the error
///   case `posture_last_error` returns the message.
#[no_mangle]
pub unsafe extern "C" fn posture_frame_to_report(
    frame_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let frame_str = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame JSON string pointer");
            return ptr::null_mut();
        }
    };

    let config_str = if config_json.is_null() {
        None
    } else {
        match cstr_to_string(config_json) {
            Some(s) => Some(s),
            None => {
                set_last_error("Invalid config JSON string pointer");
                return ptr::null_mut();
            }
        }
    };

    match frame_to_report(frame_str, config_str) {
        Ok(Some(report)) => string_to_cstr(&report),
        Ok(None) => ptr::null_mut(),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a PostureProcessor
pub struct PostureProcessorHandle {
    processor: PostureProcessor,
}

/// Create a new PostureProcessor.
///
/// # Safety
/// - `config_json` may be NULL to use the default configuration.
/// - A non-zero `level_on_recalibrate` selects the level-at-eye-height
///   recalibration policy; zero keeps the calibration unchanged.
/// - Must be freed with `posture_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn posture_processor_new(
    config_json: *const c_char,
    level_on_recalibrate: i32,
) -> *mut PostureProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        PostureConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config JSON string pointer");
                return ptr::null_mut();
            }
        };
        match PostureConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let processor = match PostureProcessor::new(&config) {
        Ok(processor) => processor,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let processor = if level_on_recalibrate != 0 {
        processor.with_policy(Box::new(LevelAtEyeHeight))
    } else {
        processor
    };

    Box::into_raw(Box::new(PostureProcessorHandle { processor }))
}

/// Free a PostureProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `posture_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn posture_processor_free(processor: *mut PostureProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Classify one frame with a stateful processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `posture_processor_new`.
/// - `frame_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `posture_free_string`.
/// - Returns NULL on error or when the frame was skipped; in the error case
///   `posture_last_error` returns the message.
#[no_mangle]
pub unsafe extern "C" fn posture_processor_process(
    processor: *mut PostureProcessorHandle,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let frame_str = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.process_frame_json(&frame_str) {
        Ok(Some(report)) => string_to_cstr(&report),
        Ok(None) => ptr::null_mut(),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Recalibrate from the last classified frame.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `posture_processor_new`.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `posture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn posture_processor_recalibrate(
    processor: *mut PostureProcessorHandle,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    match handle.processor.recalibrate() {
        Ok(_) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Posture Flux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Posture Flux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn posture_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Posture Flux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn posture_last_error() -> *const c_char {
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
pub unsafe extern "C" fn posture_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

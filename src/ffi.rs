//! FFI bindings for treeflat
//!
//! This module provides C-compatible functions for calling treeflat from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `treeflat_free_string`. Tables
//! are returned as JSON documents of the form `{"columns": [...], "rows": [[...]]}`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::FlattenConfig;
use crate::error::FlattenError;
use crate::pipeline::{markup_to_table, sessions_to_table, FlattenProcessor};
use crate::table::Table;

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

/// Serialize a table result, recording any error
fn table_result_to_cstr(result: Result<Table, FlattenError>) -> *mut c_char {
    let json = result.and_then(|table| serde_json::to_string(&table).map_err(FlattenError::from));
    match json {
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

/// Flatten a session JSON document and return a JSON table.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `treeflat_free_string`.
/// - Returns NULL on error; call `treeflat_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn treeflat_sessions_to_table(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    table_result_to_cstr(sessions_to_table(&json_str))
}

/// Flatten a customer markup document and return a JSON table.
///
/// # Safety
/// - `xml` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `treeflat_free_string`.
/// - Returns NULL on error; call `treeflat_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn treeflat_markup_to_table(xml: *const c_char) -> *mut c_char {
    clear_last_error();

    let xml_str = match cstr_to_string(xml) {
        Some(s) => s,
        None => {
            set_last_error("Invalid markup string pointer");
            return ptr::null_mut();
        }
    };

    table_result_to_cstr(markup_to_table(&xml_str))
}

// ============================================================================
// Configured Processor API
// ============================================================================

/// Opaque handle to a FlattenProcessor
pub struct FlattenProcessorHandle {
    processor: FlattenProcessor,
}

/// Create a processor from a JSON configuration document.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string, or NULL for defaults.
/// - Must be freed with `treeflat_processor_free`.
/// - Returns NULL on error; call `treeflat_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn treeflat_processor_new(
    config_json: *const c_char,
) -> *mut FlattenProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        FlattenConfig::default()
    } else {
        let json_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid configuration string pointer");
                return ptr::null_mut();
            }
        };
        match FlattenConfig::from_json(&json_str) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    match FlattenProcessor::with_config(config) {
        Ok(processor) => Box::into_raw(Box::new(FlattenProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `treeflat_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn treeflat_processor_free(processor: *mut FlattenProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Flatten a session document with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `treeflat_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `treeflat_free_string`.
/// - Returns NULL on error; call `treeflat_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn treeflat_processor_sessions(
    processor: *const FlattenProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    table_result_to_cstr(handle.processor.process_sessions(&json_str))
}

/// Flatten a markup document with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `treeflat_processor_new`.
/// - `xml` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `treeflat_free_string`.
/// - Returns NULL on error; call `treeflat_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn treeflat_processor_markup(
    processor: *const FlattenProcessorHandle,
    xml: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let xml_str = match cstr_to_string(xml) {
        Some(s) => s,
        None => {
            set_last_error("Invalid markup string pointer");
            return ptr::null_mut();
        }
    };

    table_result_to_cstr(handle.processor.process_markup(&xml_str))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by treeflat functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a treeflat function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn treeflat_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next treeflat call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn treeflat_last_error() -> *const c_char {
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
pub unsafe extern "C" fn treeflat_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSIONS: &str = r#"[{"examineeId": "E-1", "heartbeats": [{
        "interactions": [{"interactionType": "click", "value": "A", "time": 1}],
        "events": [{"type": "test", "action": "start", "time": 0, "itemId": "-"}]
    }]}]"#;

    #[test]
    fn test_ffi_sessions_to_table() {
        let json = CString::new(SESSIONS).unwrap();

        unsafe {
            let result = treeflat_sessions_to_table(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(value["rows"].as_array().map(Vec::len), Some(2));
            assert_eq!(value["columns"][1], "examineeId");

            treeflat_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let config = CString::new(r#"{"sessions": {"sequence_column": "seq"}}"#).unwrap();
            let processor = treeflat_processor_new(config.as_ptr());
            assert!(!processor.is_null());

            let json = CString::new(SESSIONS).unwrap();
            let result = treeflat_processor_sessions(processor, json.as_ptr());
            assert!(!result.is_null());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("\"seq\""));
            treeflat_free_string(result);

            let xml = CString::new("<Customers/>").unwrap();
            let result = treeflat_processor_markup(processor, xml.as_ptr());
            assert!(!result.is_null());
            treeflat_free_string(result);

            treeflat_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_default_processor() {
        unsafe {
            let processor = treeflat_processor_new(ptr::null());
            assert!(!processor.is_null());
            treeflat_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("<a><b></a>").unwrap();
            let result = treeflat_markup_to_table(invalid.as_ptr());
            assert!(result.is_null());

            let error = treeflat_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("markup"));

            let bad_config = CString::new(r#"{"max_depth": 0}"#).unwrap();
            assert!(treeflat_processor_new(bad_config.as_ptr()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = treeflat_version();
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}

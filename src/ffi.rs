//! FFI bindings for SmartSight Insights
//!
//! This module provides C-compatible functions for calling the inference
//! service from other languages. All functions use C strings (null-terminated)
//! and return allocated memory that must be freed by the caller using
//! `smartsight_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::config::InsightConfig;
use crate::risk::RiskFactorDetector;
use crate::service::WellnessInferenceService;
use crate::types::FeatureRecord;

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

// ============================================================================
// Stateless API
// ============================================================================

/// Detect risk factors in a JSON feature record and return a JSON array of labels.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `smartsight_free_string`.
/// - Returns NULL on error; call `smartsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn smartsight_detect_risk_factors(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let record = match FeatureRecord::from_json(&json_str) {
        Ok(record) => record,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let factors = match RiskFactorDetector::detect_validated(&record) {
        Ok(factors) => factors,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&factors) {
        Ok(labels) => string_to_cstr(&labels),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Service API
// ============================================================================

/// Opaque handle to a WellnessInferenceService and the runtime that drives it
pub struct SmartsightServiceHandle {
    service: Arc<WellnessInferenceService>,
    runtime: Runtime,
}

/// Create a new inference service. A negative seed selects an entropy-seeded RNG.
///
/// The model is not trained here; the first inference call trains it.
///
/// # Safety
/// - Returns a pointer to a newly allocated service.
/// - Must be freed with `smartsight_service_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn smartsight_service_new(seed: i64) -> *mut SmartsightServiceHandle {
    clear_last_error();

    let mut config = InsightConfig::default();
    if seed >= 0 {
        config = config.with_seed(seed as u64);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            set_last_error(&format!("Failed to start runtime: {}", e));
            return ptr::null_mut();
        }
    };

    let handle = Box::new(SmartsightServiceHandle {
        service: WellnessInferenceService::shared(config),
        runtime,
    });
    Box::into_raw(handle)
}

/// Free an inference service.
///
/// Returns without waiting for a training run that is still on the blocking
/// pool; that run is detached and finishes on its own.
///
/// # Safety
/// - `service` must be a valid pointer returned by `smartsight_service_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn smartsight_service_free(service: *mut SmartsightServiceHandle) {
    if !service.is_null() {
        let handle = *Box::from_raw(service);
        drop(handle.service);
        handle.runtime.shutdown_background();
    }
}

/// Run inference on a JSON feature record and return the encoded insight payload.
///
/// # Safety
/// - `service` must be a valid pointer returned by `smartsight_service_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `smartsight_free_string`.
/// - Returns NULL on error; call `smartsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn smartsight_service_infer(
    service: *mut SmartsightServiceHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if service.is_null() {
        set_last_error("Null service pointer");
        return ptr::null_mut();
    }

    let handle = &*service;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.runtime.block_on(handle.service.infer_json(&json_str)) {
        Ok(payload) => string_to_cstr(&payload),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by SmartSight functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a SmartSight function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn smartsight_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next SmartSight function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn smartsight_last_error() -> *const c_char {
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
pub unsafe extern "C" fn smartsight_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::time::{Duration, Instant};

    fn tough_day_json() -> CString {
        CString::new(
            r#"{
                "focusHours": 1,
                "appSwitches": 80,
                "sleepHours": 5,
                "stressLevel": 8,
                "exerciseMinutes": 0,
                "socialHours": 1
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_detect_risk_factors() {
        let json = tough_day_json();

        unsafe {
            let result = smartsight_detect_risk_factors(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let labels: Vec<String> = serde_json::from_str(result_str).unwrap();
            assert_eq!(
                labels,
                vec![
                    "Low Focus Duration",
                    "Severe Digital Distraction",
                    "Sleep Deprivation",
                    "High Stress Level",
                    "Low Physical Activity",
                    "Attention Deficit Pattern",
                    "Burnout Risk",
                ]
            );

            smartsight_free_string(result);
        }
    }

    #[test]
    fn test_ffi_service_lifecycle() {
        unsafe {
            let service = smartsight_service_new(42);
            assert!(!service.is_null());

            let json = tough_day_json();
            let result = smartsight_service_infer(service, json.as_ptr());
            assert!(!result.is_null());

            let payload: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(payload["insight_version"], "1.0.0");
            assert!(payload["result"]["score"].as_u64().unwrap() <= 100);
            assert_eq!(
                payload["result"]["recommendations"]
                    .as_array()
                    .unwrap()
                    .len(),
                5
            );

            smartsight_free_string(result);
            smartsight_service_free(service);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = smartsight_detect_risk_factors(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = smartsight_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("record"));

            let result = smartsight_service_infer(ptr::null_mut(), invalid_json.as_ptr());
            assert!(result.is_null());
            let error_str = CStr::from_ptr(smartsight_last_error()).to_str().unwrap();
            assert_eq!(error_str, "Null service pointer");
        }
    }

    #[test]
    fn test_ffi_out_of_range_input() {
        unsafe {
            let service = smartsight_service_new(-1);
            let json = CString::new(
                r#"{"focusHours":3,"appSwitches":45,"sleepHours":7,"stressLevel":11,"exerciseMinutes":30,"socialHours":2}"#,
            )
            .unwrap();

            let result = smartsight_service_infer(service, json.as_ptr());
            assert!(result.is_null());
            let error_str = CStr::from_ptr(smartsight_last_error()).to_str().unwrap();
            assert!(error_str.contains("stressLevel"));

            smartsight_service_free(service);
        }
    }

    #[test]
    fn test_ffi_detect_rejects_out_of_domain_record() {
        let json = CString::new(
            r#"{"focusHours":-4,"appSwitches":-30,"sleepHours":99,"stressLevel":0,"exerciseMinutes":-10,"socialHours":-1}"#,
        )
        .unwrap();

        unsafe {
            let result = smartsight_detect_risk_factors(json.as_ptr());
            assert!(result.is_null());

            let error = smartsight_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("focusHours"));
        }
    }

    #[test]
    fn test_ffi_free_does_not_wait_for_timed_out_training() {
        let config = InsightConfig::default()
            .with_seed(3)
            .with_training_timeout(Duration::ZERO);
        let handle = Box::into_raw(Box::new(SmartsightServiceHandle {
            service: WellnessInferenceService::shared(config),
            runtime: tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap(),
        }));
        let json = tough_day_json();

        unsafe {
            let result = smartsight_service_infer(handle, json.as_ptr());
            assert!(result.is_null());
            let error_str = CStr::from_ptr(smartsight_last_error()).to_str().unwrap();
            assert!(error_str.contains("training did not finish"));

            let started = Instant::now();
            smartsight_service_free(handle);
            assert!(started.elapsed() < Duration::from_millis(500));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = smartsight_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, env!("CARGO_PKG_VERSION"));
        }
    }
}

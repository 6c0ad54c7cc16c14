use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use serde::de::DeserializeOwned;
use serde::Serialize;
use crate::auth::{resolve_auth_context, AuthContext, Principal, StaticIdentity};
use crate::config::CoreConfig;
use crate::ffi::error::{ErrorCode, FFIError};
use crate::globals;

/// Ensure pointer is not null
macro_rules! ensure_ptr {
    ($ptr:expr) => {
        if $ptr.is_null() {
            return Err($crate::ffi::error::FFIError::new(
                $crate::ffi::error::ErrorCode::NullPointer,
                "null pointer",
            ));
        }
    };
}

pub mod donation;
pub mod error;
pub mod moderation;
pub mod payment;

// Re-export FFIResult for convenience within the ffi module
pub use error::FFIResult;

/// Error handling helper for FFI boundaries (returns error code)
pub fn handle_status_result<F>(func: F) -> c_int
where
    F: FnOnce() -> FFIResult<()>,
{
    match func() {
        Ok(_) => ErrorCode::Success as c_int,
        Err(e) => {
            log::error!(
                "FFI call failed. Code: {:?}, Message: {}, Details: {}",
                e.code,
                e.message,
                e.details.as_deref().unwrap_or("None")
            );
            e.code as c_int
        }
    }
}

/// Drive an async service call to completion on the shared runtime
pub fn block_on_async<F, T>(future: F) -> FFIResult<T>
where
    F: std::future::Future<Output = FFIResult<T>>,
{
    globals::runtime()?.block_on(future)
}

/// Decode a JSON payload from a C string
pub(crate) unsafe fn read_payload<T: DeserializeOwned>(payload_json: *const c_char) -> FFIResult<T> {
    let json = unsafe { CStr::from_ptr(payload_json) }
        .to_str()
        .map_err(|_| FFIError::new(ErrorCode::InvalidUtf8, "payload is not valid UTF-8"))?;
    serde_json::from_str(json).map_err(|e| FFIError::invalid_argument(&format!("json {e}")))
}

/// Serialize `value` and hand ownership of the string to the caller
pub(crate) unsafe fn write_json<T: Serialize>(result: *mut *mut c_char, value: &T) -> FFIResult<()> {
    let json_resp = serde_json::to_string(value).map_err(|e| FFIError::internal(format!("ser {e}")))?;
    let cstr = CString::new(json_resp)?;
    unsafe {
        *result = cstr.into_raw();
    }
    Ok(())
}

/// Resolve the host-supplied principal into an auth context. A missing
/// principal means nobody is signed in.
pub(crate) fn auth_from(principal: Option<Principal>) -> FFIResult<AuthContext> {
    let identity = StaticIdentity::new(principal);
    block_on_async(async { resolve_auth_context(&identity).await.map_err(FFIError::from) })
}

/// Initialize the library.
/// Expected JSON payload: a `CoreConfig` object; omitted fields take their
/// defaults. A null pointer loads the configuration from the environment.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crowdfund_initialize(config_json: *const c_char) -> c_int {
    handle_status_result(|| unsafe {
        let config = if config_json.is_null() {
            CoreConfig::from_env()?
        } else {
            read_payload::<CoreConfig>(config_json)?
        };
        crate::initialize(config)
    })
}

/// Fetch the active configuration
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crowdfund_get_config(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(result);
        let config = globals::get_config()?;
        write_json(result, config.as_ref())
    })
}

/// Whether `crowdfund_initialize` has completed
#[unsafe(no_mangle)]
pub extern "C" fn crowdfund_is_initialized() -> bool {
    globals::is_initialized()
}

/// Free a string previously returned by any function in this library
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crowdfund_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

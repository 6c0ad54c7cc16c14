// src/ffi/donation.rs
// ============================================================================
// FFI bindings for donation flows.
//
// A flow is opened with `donation_flow_start`, which returns an opaque
// `handle` (UUID string). Every later call names that handle. The flow and its
// fee cache live until `donation_flow_close` is called.
//
// Memory ownership: every *mut c_char written to `result` must be released
// with `crowdfund_free`.
//
// JSON contracts: each payload bundles its data with an `auth` principal
// (`{ "userId", "email", "isAdmin", "isVerified", "idToken" }`). A null or
// missing `auth` means nobody is signed in.
// ----------------------------------------------------------------------------

use std::os::raw::{c_char, c_int};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::auth::Principal;
use crate::domains::campaign::Campaign;
use crate::domains::donation::{DonorDetails, FlowState};
use crate::domains::fees::{amount_from_f64, FeeBreakdown};
use crate::domains::payment::PaymentMethod;
use crate::ffi::error::{ErrorCode, FFIError};
use crate::ffi::{auth_from, block_on_async, handle_status_result, read_payload, write_json, FFIResult};
use crate::globals;

#[derive(Deserialize)]
struct HandlePayload {
    handle: String,
    #[serde(default)]
    auth: Option<Principal>,
}

fn parse_handle(raw: &str) -> FFIResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| FFIError::new(ErrorCode::InvalidUuid, "invalid flow handle"))
}

/// Apply a synchronous step to the flow behind `handle`
unsafe fn with_flow<F>(payload_json: *const c_char, result: *mut *mut c_char, step: F) -> FFIResult<()>
where
    F: FnOnce(&mut crate::domains::donation::DonationSession) -> crate::errors::ServiceResult<FlowState>,
{
    ensure_ptr!(payload_json);
    ensure_ptr!(result);

    let p: HandlePayload = unsafe { read_payload(payload_json)? };
    auth_from(p.auth)?;
    let shared = globals::get_flow(&parse_handle(&p.handle)?)?;

    let state = block_on_async(async move {
        let mut session = shared.lock().await;
        step(&mut session).map_err(FFIError::from)
    })?;
    unsafe { write_json(result, &state) }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    handle: String,
    state: FlowState,
}

/// Open a donation flow for a campaign
/// Expected JSON payload:
/// {
///   "campaign": { Campaign },
///   "auth": { Principal }
/// }
/// Result: `{ "handle": "uuid", "state": { FlowState } }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_start(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            campaign: Campaign,
            #[serde(default)]
            auth: Option<Principal>,
        }

        let p: Payload = read_payload(payload_json)?;
        let auth = auth_from(p.auth)?;
        let orchestrator = globals::get_donation_orchestrator()?;

        let session = block_on_async(async {
            orchestrator.start_flow(&p.campaign, &auth).await.map_err(FFIError::from)
        })?;
        let state = session.state();
        let handle = globals::register_flow(session)?;

        write_json(result, &StartResponse {
            handle: handle.to_string(),
            state,
        })
    })
}

/// Quote processing fees for a candidate amount. `fees` is null when the
/// amount changed again before the quote returned.
/// Expected JSON payload:
/// {
///   "handle": "uuid",
///   "amount": 50.0,
///   "auth": { Principal }
/// }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_quote_fees(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            handle: String,
            amount: f64,
            #[serde(default)]
            auth: Option<Principal>,
        }

        #[derive(Serialize)]
        struct Response {
            fees: Option<FeeBreakdown>,
        }

        let p: Payload = read_payload(payload_json)?;
        let amount = amount_from_f64(p.amount)?;
        let auth = auth_from(p.auth)?;
        let shared = globals::get_flow(&parse_handle(&p.handle)?)?;

        // The session lock is released before the network call so a newer
        // quote can supersede this one.
        let fees = block_on_async(async move {
            let tracker = shared.lock().await.fee_tracker();
            tracker.quote(amount, &auth).await.map_err(FFIError::from)
        })?;
        write_json(result, &Response { fees })
    })
}

/// Expected JSON payload: `{ "handle": "uuid", "amount": 50.0, "auth": { Principal } }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_submit_amount(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            handle: String,
            amount: f64,
            #[serde(default)]
            auth: Option<Principal>,
        }

        let p: Payload = read_payload(payload_json)?;
        auth_from(p.auth)?;
        let amount = amount_from_f64(p.amount)?;
        let shared = globals::get_flow(&parse_handle(&p.handle)?)?;

        let state = block_on_async(async move {
            shared.lock().await.submit_amount(amount).map_err(FFIError::from)
        })?;
        write_json(result, &state)
    })
}

/// Expected JSON payload:
/// {
///   "handle": "uuid",
///   "details": { "donorName", "donorEmail", "message", "anonymous" },
///   "auth": { Principal }
/// }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_submit_details(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        struct Payload {
            handle: String,
            details: DonorDetails,
            #[serde(default)]
            auth: Option<Principal>,
        }

        let p: Payload = read_payload(payload_json)?;
        auth_from(p.auth)?;
        let shared = globals::get_flow(&parse_handle(&p.handle)?)?;
        let details = p.details;

        let state = block_on_async(async move {
            shared.lock().await.submit_details(details).map_err(FFIError::from)
        })?;
        write_json(result, &state)
    })
}

/// Expected JSON payload: `{ "handle": "uuid", "auth": { Principal } }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_back(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe { with_flow(payload_json, result, |session| session.back()) })
}

/// Expected JSON payload: `{ "handle": "uuid", "auth": { Principal } }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_cancel(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe { with_flow(payload_json, result, |session| session.cancel()) })
}

/// Expected JSON payload: `{ "handle": "uuid", "auth": { Principal } }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_retry(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe { with_flow(payload_json, result, |session| session.retry()) })
}

/// Expected JSON payload: `{ "handle": "uuid", "auth": { Principal } }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_state(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe { with_flow(payload_json, result, |session| Ok(session.state())) })
}

/// Run the processing step. A non-zero status means the flow did not move;
/// once a request is sent the status is zero and the returned state is
/// REDIRECT_PENDING, SUCCESS or FAILED.
/// Expected JSON payload:
/// {
///   "handle": "uuid",
///   "paymentMethod": "GATEWAY_CARD" | "BANK_TRANSFER",
///   "auth": { Principal }
/// }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_submit_payment(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            handle: String,
            payment_method: String,
            #[serde(default)]
            auth: Option<Principal>,
        }

        let p: Payload = read_payload(payload_json)?;
        let method = PaymentMethod::from_str(&p.payment_method)
            .ok_or_else(|| FFIError::invalid_argument("invalid paymentMethod"))?;
        let auth = auth_from(p.auth)?;
        let shared = globals::get_flow(&parse_handle(&p.handle)?)?;

        let state = block_on_async(async move {
            let mut session = shared.lock().await;
            session.submit_payment(method, &auth).await.map_err(FFIError::from)
        })?;
        write_json(result, &state)
    })
}

/// Release a flow and its fee cache. Closing an unknown handle is not an error.
/// Expected JSON payload: `{ "handle": "uuid" }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn donation_flow_close(payload_json: *const c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        let p: HandlePayload = read_payload(payload_json)?;
        if !globals::remove_flow(&parse_handle(&p.handle)?)? {
            log::debug!("Donation flow {} was already closed", p.handle);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_bad_handle_is_invalid_uuid() {
        assert_eq!(parse_handle("flow-1").unwrap_err().code, ErrorCode::InvalidUuid);
        assert!(parse_handle(" 67e55044-10b1-426f-9247-bb680e5fe0c8 ").is_ok());
    }

    #[test]
    fn test_null_payload_rejected() {
        let mut out: *mut c_char = std::ptr::null_mut();
        let code = unsafe { donation_flow_state(std::ptr::null(), &mut out) };
        assert_eq!(code, ErrorCode::NullPointer as c_int);
        assert!(out.is_null());
    }

    #[test]
    fn test_closing_unknown_handle_succeeds() {
        let payload = CString::new(r#"{"handle":"67e55044-10b1-426f-9247-bb680e5fe0c8"}"#).unwrap();
        assert_eq!(unsafe { donation_flow_close(payload.as_ptr()) }, 0);
    }

    #[test]
    fn test_unknown_payment_method_rejected_before_lookup() {
        let payload = CString::new(
            r#"{"handle":"67e55044-10b1-426f-9247-bb680e5fe0c8","paymentMethod":"CRYPTO"}"#,
        ).unwrap();
        let mut out: *mut c_char = std::ptr::null_mut();
        let code = unsafe { donation_flow_submit_payment(payload.as_ptr(), &mut out) };
        assert_eq!(code, ErrorCode::InvalidArgument as c_int);
    }
}

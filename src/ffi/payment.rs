// src/ffi/payment.rs
// ============================================================================
// FFI bindings for settling and refunding card payments.
//
// `payment_confirm_return` needs only the URL the browser returned to; it
// does not look at any donation flow. Strings written to `result` must be
// released with `crowdfund_free`.
// ----------------------------------------------------------------------------

use std::os::raw::{c_char, c_int};
use serde::Deserialize;
use crate::auth::Principal;
use crate::domains::fees::amount_from_f64;
use crate::ffi::error::FFIError;
use crate::ffi::{auth_from, block_on_async, handle_status_result, read_payload, write_json};
use crate::globals;

/// Resolve a hosted checkout return
/// Expected JSON payload:
/// {
///   "returnUrl": "https://app.example.org/payment/success?session_id=cs_123",
///   "auth": { Principal }
/// }
/// Result: `{ "outcome": "COMPLETED" | "FAILED" | "CANCELLED", ... }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn payment_confirm_return(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            return_url: String,
            #[serde(default)]
            auth: Option<Principal>,
        }

        let p: Payload = read_payload(payload_json)?;
        let auth = auth_from(p.auth)?;
        let handler = globals::get_confirmation_handler()?;

        let outcome = block_on_async(async {
            handler.handle_return(&p.return_url, &auth).await.map_err(FFIError::from)
        })?;
        write_json(result, &outcome)
    })
}

/// Refund a single donation, in full or in part. Administrators only.
/// Expected JSON payload:
/// {
///   "donationId": "string",
///   "amount": 25.0,            // optional; omitted refunds in full
///   "reason": "string",
///   "auth": { Principal }
/// }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn payment_refund(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            donation_id: String,
            #[serde(default)]
            amount: Option<f64>,
            #[serde(default)]
            reason: String,
            #[serde(default)]
            auth: Option<Principal>,
        }

        let p: Payload = read_payload(payload_json)?;
        let amount = p.amount.map(amount_from_f64).transpose()?;
        let auth = auth_from(p.auth)?;
        let gateway = globals::get_payment_gateway()?;

        let refund = block_on_async(async {
            gateway
                .refund(&p.donation_id, amount, &p.reason, &auth)
                .await
                .map_err(FFIError::from)
        })?;
        write_json(result, &refund)
    })
}

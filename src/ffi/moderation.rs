// src/ffi/moderation.rs
// ============================================================================
// FFI bindings for bulk admin actions.
//
// The host shows its own confirmation dialog before calling any of these, so
// the service behind them confirms automatically. Each call returns a
// `BulkActionResult`:
//   { "totalProcessed", "successCount", "failureCount", "succeeded": [id],
//     "failures": [{ "id", "reason" }], "timestamp" }
// Re-submitting `failures[].id` retries only the failed subset.
// ----------------------------------------------------------------------------

use std::os::raw::{c_char, c_int};
use serde::Deserialize;
use crate::auth::Principal;
use crate::domains::bulk::BulkActionResult;
use crate::domains::moderation::{RoleChange, VerificationChange};
use crate::ffi::error::FFIError;
use crate::ffi::{auth_from, block_on_async, handle_status_result, read_payload, write_json, FFIResult};
use crate::globals;
use crate::types::EntityId;

/// Payload shared by the bulk calls
#[derive(Deserialize)]
struct BulkPayload<T> {
    ids: Vec<EntityId>,
    #[serde(flatten)]
    args: T,
    #[serde(default)]
    auth: Option<Principal>,
}

#[derive(Deserialize)]
struct NoArgs {}

#[derive(Deserialize)]
struct ReasonArgs {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
struct RoleArgs {
    change: RoleChange,
}

#[derive(Deserialize)]
struct VerificationArgs {
    change: VerificationChange,
}

/// `None` from the service means the prompt was declined; with the
/// auto-confirming port that only happens if the port is swapped out.
fn into_result(outcome: Option<BulkActionResult>) -> BulkActionResult {
    outcome.unwrap_or_else(BulkActionResult::empty)
}

unsafe fn write_bulk(result: *mut *mut c_char, outcome: FFIResult<Option<BulkActionResult>>) -> FFIResult<()> {
    let summary = into_result(outcome?);
    unsafe { write_json(result, &summary) }
}

/// Expected JSON payload: `{ "ids": ["campaign-id", ...], "auth": { Principal } }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn moderation_bulk_approve_campaigns(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: BulkPayload<NoArgs> = read_payload(payload_json)?;
        let auth = auth_from(p.auth)?;
        let svc = globals::get_bulk_moderation_service()?;

        let outcome = block_on_async(async {
            svc.approve_campaigns(&p.ids, &auth).await.map_err(FFIError::from)
        });
        write_bulk(result, outcome)
    })
}

/// Expected JSON payload:
/// { "ids": ["campaign-id", ...], "reason": "optional", "auth": { Principal } }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn moderation_bulk_reject_campaigns(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: BulkPayload<ReasonArgs> = read_payload(payload_json)?;
        let auth = auth_from(p.auth)?;
        let svc = globals::get_bulk_moderation_service()?;
        let reason = p.args.reason.as_deref();

        let outcome = block_on_async(async {
            svc.reject_campaigns(&p.ids, reason, &auth).await.map_err(FFIError::from)
        });
        write_bulk(result, outcome)
    })
}

/// Expected JSON payload:
/// { "ids": ["user-id", ...], "change": "promote" | "demote", "auth": { Principal } }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn moderation_bulk_change_role(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: BulkPayload<RoleArgs> = read_payload(payload_json)?;
        let auth = auth_from(p.auth)?;
        let svc = globals::get_bulk_moderation_service()?;

        let outcome = block_on_async(async {
            svc.change_roles(&p.ids, p.args.change, &auth).await.map_err(FFIError::from)
        });
        write_bulk(result, outcome)
    })
}

/// Expected JSON payload:
/// { "ids": ["user-id", ...], "change": "verify" | "unverify", "auth": { Principal } }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn moderation_bulk_set_verification(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: BulkPayload<VerificationArgs> = read_payload(payload_json)?;
        let auth = auth_from(p.auth)?;
        let svc = globals::get_bulk_moderation_service()?;

        let outcome = block_on_async(async {
            svc.set_verification(&p.ids, p.args.change, &auth).await.map_err(FFIError::from)
        });
        write_bulk(result, outcome)
    })
}

/// Expected JSON payload:
/// { "ids": ["donation-id", ...], "reason": "string", "auth": { Principal } }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn moderation_bulk_refund_donations(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        ensure_ptr!(payload_json);
        ensure_ptr!(result);

        let p: BulkPayload<ReasonArgs> = read_payload(payload_json)?;
        let auth = auth_from(p.auth)?;
        let svc = globals::get_bulk_moderation_service()?;
        let reason = p.args.reason.unwrap_or_default();

        let outcome = block_on_async(async {
            svc.refund_donations(&p.ids, &reason, &auth).await.map_err(FFIError::from)
        });
        write_bulk(result, outcome)
    })
}

//! Calling convention shared by every exported function.
//!
//! Exports return an [`InteropBool`] and take a leading UTF-16 buffer of
//! `MAX_FAILURE_REASON_LENGTH + 1` units that receives the failure reason.

use std::{
    any::Any,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    ptr::copy_nonoverlapping,
    slice, thread,
};

use crate::error::DispatchError;

use log::error;

/// Boolean as understood by the managed caller.
pub type InteropBool = u8;

pub const INTEROP_TRUE: InteropBool = 0xFF;
pub const INTEROP_FALSE: InteropBool = 0x00;

/// Failure reasons longer than this many UTF-16 units are truncated.
pub const MAX_FAILURE_REASON_LENGTH: usize = 200;

const UNKNOWN_FAILURE: &str = "Unknown exception occurred.";

pub fn to_interop_bool(value: bool) -> InteropBool {
    if value {
        INTEROP_TRUE
    } else {
        INTEROP_FALSE
    }
}

/// Any non-zero value is true.
pub fn from_interop_bool(value: InteropBool) -> bool {
    value != INTEROP_FALSE
}

/// Encodes `reason` as null-terminated UTF-16 into `destination`.
///
/// # Safety
/// `destination` must be null or writable for `MAX_FAILURE_REASON_LENGTH + 1` units.
pub unsafe fn write_failure_reason(destination: *mut u16, reason: &str) {
    if destination.is_null() {
        return;
    }

    let mut units: Vec<u16> = reason
        .encode_utf16()
        .take(MAX_FAILURE_REASON_LENGTH + 1)
        .collect();
    if units.len() > MAX_FAILURE_REASON_LENGTH {
        units.truncate(MAX_FAILURE_REASON_LENGTH);
        // A dangling high surrogate would be an invalid string on the managed side.
        if let Some(0xD800..=0xDBFF) = units.last() {
            units.pop();
        }
    }
    units.push(0);

    copy_nonoverlapping(units.as_ptr(), destination, units.len());
}

/// Runs an export body, translating its outcome to the interop convention.
///
/// Errors and panics are logged, written to `failure_reason` and reported as
/// [`INTEROP_FALSE`].
///
/// # Safety
/// Same as [`write_failure_reason`].
pub unsafe fn export<E, F>(name: &str, failure_reason: *mut u16, body: F) -> InteropBool
where
    E: fmt::Display,
    F: FnOnce() -> Result<(), E>,
{
    match describe_failure(name, catch_unwind(AssertUnwindSafe(body))) {
        None => INTEROP_TRUE,
        Some((log_line, reason)) => {
            error!("{}", log_line);
            write_failure_reason(failure_reason, &reason);
            INTEROP_FALSE
        }
    }
}

/// Log line and caller-facing reason of a failed export body, if it failed.
fn describe_failure<E: fmt::Display>(
    name: &str,
    outcome: thread::Result<Result<(), E>>,
) -> Option<(String, String)> {
    match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            let reason = format!("{:#}", e);
            Some((format!("{} failed: {}", name, reason), reason))
        }
        Err(payload) => Some((
            format!("{} panicked: {}", name, panic_message(&*payload)),
            UNKNOWN_FAILURE.to_string(),
        )),
    }
}

/// Reads a null-terminated UTF-16 string passed by the caller.
///
/// # Safety
/// `source` must be null or point to a null-terminated UTF-16 sequence.
pub unsafe fn read_interop_string(source: *const u16, what: &str) -> Result<String, DispatchError> {
    if source.is_null() {
        return Err(DispatchError::invalid(format!("{} must not be null.", what)));
    }

    let mut length = 0;
    while *source.add(length) != 0 {
        length += 1;
    }
    String::from_utf16(slice::from_raw_parts(source, length))
        .map_err(|_| DispatchError::invalid(format!("{} is not valid UTF-16.", what)))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string payload>"
    }
}

//! Failure taxonomy for the dispatcher and the export surface.

use crate::command::Instruction;

use std::{borrow::Cow, fmt};

/// Errors reported by dispatch operations.
#[derive(Debug)]
pub enum DispatchError {
    /// A required pointer was null, a count was out of range,
    /// or the call was otherwise malformed. Nothing native was issued for it.
    InvalidArgument(String),

    /// A command carried a tag outside the instruction set.
    UnknownInstruction { index: usize, value: u64 },

    /// The underlying graphics call reported failure.
    NativeCallFailure(anyhow::Error),

    /// A deferred action queued between commands failed.
    DeferredAction(anyhow::Error),
}

impl DispatchError {
    /// Shorthand for `InvalidArgument`.
    pub fn invalid(message: impl Into<String>) -> DispatchError {
        DispatchError::InvalidArgument(message.into())
    }

    /// Attaches the position of the failing command.
    pub(crate) fn at(self, index: usize, instruction: Instruction) -> DispatchError {
        match self {
            DispatchError::InvalidArgument(message) => DispatchError::InvalidArgument(format!(
                "Command #{} ({}): {}",
                index, instruction, message
            )),
            DispatchError::NativeCallFailure(source) => DispatchError::NativeCallFailure(
                source.context(format!("Command #{} ({}) failed", index, instruction)),
            ),
            other => other,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::InvalidArgument(message) => write!(f, "{}", message),
            DispatchError::UnknownInstruction { index, value } => {
                write!(f, "Unknown render instruction: {} (command #{})", value, index)
            }
            DispatchError::NativeCallFailure(source) => write!(f, "{:#}", source),
            DispatchError::DeferredAction(source) => {
                write!(f, "Deferred action failed: {:#}", source)
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::NativeCallFailure(source) | DispatchError::DeferredAction(source) => {
                Some(&**source)
            }
            _ => None,
        }
    }
}

/// A failed `HRESULT`, rendered through [`describe_hresult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HresultError(pub u32);

impl fmt::Display for HresultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", describe_hresult(self.0))
    }
}

impl std::error::Error for HresultError {}

pub const E_INVALIDARG: u32 = 0x8007_0057;
pub const DXGI_ERROR_INVALID_CALL: u32 = 0x887A_0001;
pub const DXGI_ERROR_NOT_FOUND: u32 = 0x887A_0002;
pub const DXGI_ERROR_MORE_DATA: u32 = 0x887A_0003;
pub const DXGI_ERROR_UNSUPPORTED: u32 = 0x887A_0004;
pub const DXGI_ERROR_DEVICE_REMOVED: u32 = 0x887A_0005;
pub const DXGI_ERROR_DEVICE_HUNG: u32 = 0x887A_0006;
pub const DXGI_ERROR_DEVICE_RESET: u32 = 0x887A_0007;
pub const DXGI_ERROR_WAS_STILL_DRAWING: u32 = 0x887A_000A;
pub const DXGI_ERROR_DRIVER_INTERNAL_ERROR: u32 = 0x887A_0020;
pub const DXGI_ERROR_NOT_CURRENTLY_AVAILABLE: u32 = 0x887A_0022;
pub const DXGI_ERROR_GRAPHICS_VIDPN_SOURCE_IN_USE: u32 = 0x887A_0024;
pub const DXGI_ERROR_WAIT_TIMEOUT: u32 = 0x887A_0027;
pub const DXGI_ERROR_RESTRICT_TO_OUTPUT_STALE: u32 = 0x887A_0029;
pub const DXGI_ERROR_CANNOT_PROTECT_CONTENT: u32 = 0x887A_002A;
pub const DXGI_ERROR_ACCESS_DENIED: u32 = 0x887A_002B;
pub const DXGI_ERROR_NAME_ALREADY_EXISTS: u32 = 0x887A_002C;

/// Maps known hardware/driver error codes to a human-readable cause.
pub fn describe_hresult(code: u32) -> Cow<'static, str> {
    let description = match code {
        E_INVALIDARG => "The application supplied an invalid argument to an internal call. Please check that all inputs make sense and are valid at the point of the error.",
        DXGI_ERROR_DEVICE_HUNG => "Device was not started due to bad input from the application.",
        DXGI_ERROR_DEVICE_REMOVED => "Device was removed or updated.",
        DXGI_ERROR_DEVICE_RESET => "Device was reset due to bad input from the application.",
        DXGI_ERROR_DRIVER_INTERNAL_ERROR => "Device driver encountered an internal error. The device driver may be corrupt or require updating.",
        DXGI_ERROR_GRAPHICS_VIDPN_SOURCE_IN_USE => "Could not acquire sole graphics functionality. Another graphics application or game may already be using the card.",
        DXGI_ERROR_INVALID_CALL => "The application made a bad request to the video adapter.",
        DXGI_ERROR_MORE_DATA => "The application failed to provide enough memory for a call.",
        DXGI_ERROR_NOT_CURRENTLY_AVAILABLE => "The operation is not currently available.",
        DXGI_ERROR_NOT_FOUND => "The provided UUID or hardware index was not found.",
        DXGI_ERROR_WAS_STILL_DRAWING => "Request made to the device when the previous draw attempt had not finished.",
        DXGI_ERROR_UNSUPPORTED => "The installed hardware does not support the necessary operation.",
        DXGI_ERROR_WAIT_TIMEOUT => "The adapter timed out when waiting for a frame update.",
        DXGI_ERROR_RESTRICT_TO_OUTPUT_STALE => "The output chain target (monitor) was altered or disconnected.",
        DXGI_ERROR_CANNOT_PROTECT_CONTENT => "The adapter or driver is out-of-date (can not protect content).",
        DXGI_ERROR_ACCESS_DENIED => "The application could not get sufficient access (are you running as administrator?).",
        DXGI_ERROR_NAME_ALREADY_EXISTS => "The application could not instantiate or name a resource (is another copy already running?).",
        unknown => return Cow::Owned(format!("Unknown error encountered: 0x{:x}", unknown)),
    };
    Cow::Borrowed(description)
}

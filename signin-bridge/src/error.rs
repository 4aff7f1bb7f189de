//! Error types for the bridge and the status codes returned across the C ABI.

use thiserror::Error;

/// Errors raised by the Rust-facing API.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A success or error handler was absent (only possible across the C ABI).
    #[error("{0} handler is null")]
    MissingHandler(&'static str),

    /// Every identifier below the wrap boundary belongs to a pending request.
    #[error("no free request id below {max}: every id is pending")]
    IdSpaceExhausted { max: u32 },

    /// The completion payload could not be decoded.
    #[error("invalid completion payload: {0}")]
    Payload(#[source] serde_json::Error),

    /// The configuration JSON could not be parsed.
    #[error("invalid config JSON: {0}")]
    Config(#[source] serde_json::Error),

    /// The configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Another bridge is already receiving native completions.
    #[error("another bridge is already receiving native completions")]
    RouteTaken,

    /// No bridge has been installed for C ABI callers.
    #[error("bridge not installed")]
    NotInstalled,
}

/// Status codes for the C ABI surface.
///
/// Every `signin_bridge_*` function that returns `i32` uses these values.
/// Managed callers should check for `Ok` (0) and treat anything else as failure.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiResult {
    /// Success.
    Ok = 0,
    /// A required argument was null, not valid UTF-8, or not valid JSON.
    InvalidArgument = 2,
    /// `signin_bridge_install` has not been called (or the bridge was uninstalled).
    NotInstalled = 3,
    /// An internal error occurred (logged via tracing).
    Internal = 4,
}

impl From<&BridgeError> for FfiResult {
    fn from(err: &BridgeError) -> Self {
        match err {
            BridgeError::MissingHandler(_)
            | BridgeError::Config(_)
            | BridgeError::InvalidConfig(_)
            | BridgeError::Payload(_) => FfiResult::InvalidArgument,
            BridgeError::NotInstalled => FfiResult::NotInstalled,
            BridgeError::IdSpaceExhausted { .. } | BridgeError::RouteTaken => FfiResult::Internal,
        }
    }
}

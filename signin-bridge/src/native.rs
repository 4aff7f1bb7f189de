//! The native sign-in layer, seen as a capability.
//!
//! Platforms without native sign-in get [`Unavailable`]; everything else talks
//! to the platform through [`NativeAuth`]. The choice is made once, when the
//! bridge is constructed.

use std::ffi::c_char;

use crate::request::RequestId;

/// Process-wide function the native layer calls with `(request_id, payload)`.
///
/// `payload` is a NUL-terminated UTF-8 string owned by the caller for the
/// duration of the call.
pub type CompletionEntryPoint = unsafe extern "C" fn(request_id: u32, payload: *const c_char);

/// C signature the host supplies for registering the completion entry point.
pub type RegisterHandlerFn = unsafe extern "C" fn(entry: CompletionEntryPoint);

/// C signature the host supplies for starting a native sign-in.
pub type StartAuthFn = unsafe extern "C" fn(request_id: u32);

pub trait NativeAuth: Send + Sync {
    /// Whether native sign-in exists on this platform.
    fn is_available(&self) -> bool;

    /// Hand the completion entry point to the native layer. Called once.
    fn register_completion_handler(&self, entry: CompletionEntryPoint);

    /// Begin native sign-in. The result arrives later through the entry point.
    fn start_auth(&self, request_id: RequestId);
}

/// Null object for platforms without native sign-in.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl NativeAuth for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    fn register_completion_handler(&self, _entry: CompletionEntryPoint) {}

    fn start_auth(&self, request_id: RequestId) {
        tracing::debug!(%request_id, "native sign-in unavailable, ignoring start");
    }
}

/// Native layer reached through C function pointers supplied by the host.
#[derive(Debug, Clone, Copy)]
pub struct ExternNative {
    register_handler: RegisterHandlerFn,
    start_auth: StartAuthFn,
}

impl ExternNative {
    /// # Safety
    ///
    /// Both function pointers must stay valid for the life of the process and
    /// be callable from any thread.
    pub unsafe fn new(register_handler: RegisterHandlerFn, start_auth: StartAuthFn) -> Self {
        Self {
            register_handler,
            start_auth,
        }
    }
}

impl NativeAuth for ExternNative {
    fn is_available(&self) -> bool {
        true
    }

    fn register_completion_handler(&self, entry: CompletionEntryPoint) {
        // SAFETY: validity of the pointer is the contract of `ExternNative::new`.
        unsafe { (self.register_handler)(entry) }
    }

    fn start_auth(&self, request_id: RequestId) {
        // SAFETY: see `ExternNative::new`.
        unsafe { (self.start_auth)(request_id.get()) }
    }
}

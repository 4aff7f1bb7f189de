//! C ABI exports: the surface consumed by the native layer and managed hosts.
//!
//! All functions are `extern "C"` and `#[no_mangle]`. The installed bridge is
//! held in a process-wide slot; completions reach it through the route bound
//! on the first sign-in.

use std::ffi::{c_char, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::bridge::callback::{HostCallbacks, HostErrorCallback, HostSuccessCallback};
use crate::bridge::route;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, FfiResult};
use crate::facade::SignInBridge;
use crate::logging;
use crate::native::{ExternNative, NativeAuth, RegisterHandlerFn, StartAuthFn, Unavailable};
use crate::request::RequestId;

/// Bridge used by the `signin_bridge_*` host functions.
static INSTALLED: Lazy<RwLock<Option<Arc<SignInBridge>>>> = Lazy::new(|| RwLock::new(None));

fn installed() -> Option<Arc<SignInBridge>> {
    INSTALLED.read().clone()
}

/// Helper: read a C string pointer into a Rust String, returning None on null or invalid UTF-8.
unsafe fn read_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(String::from)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

// ─── Native completion entry point ──────────────────────────────────

/// Deliver the result of a native sign-in.
///
/// Registered with the native layer on the first sign-in. May be called from
/// any thread, any number of times, with any id; unknown or repeated ids are
/// ignored. Nothing raised here unwinds back into native code.
///
/// # Safety
///
/// `payload` must be null or a valid, NUL-terminated C string for the duration
/// of the call. A null payload is treated as empty; invalid UTF-8 is replaced.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn signin_bridge_on_completion(request_id: u32, payload: *const c_char) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let payload = if payload.is_null() {
            tracing::warn!(request_id, "native completion carried a null payload");
            String::new()
        } else {
            unsafe { CStr::from_ptr(payload) }.to_string_lossy().into_owned()
        };

        match route::current() {
            Some(registry) => {
                registry.resolve(RequestId::new(request_id), payload);
            }
            None => {
                tracing::warn!(request_id, "native completion arrived with no bridge bound, dropping");
            }
        }
    }));

    if let Err(panic) = outcome {
        tracing::error!(
            request_id,
            "failed to queue native completion: {}",
            panic_message(panic.as_ref())
        );
    }
}

// ─── Install / Uninstall ────────────────────────────────────────────

/// Install the process-wide bridge.
///
/// `register_handler` and `start_auth` are the native layer's entry points.
/// If either is null the platform is treated as having no native sign-in and
/// `signin_bridge_start_login` becomes a silent no-op. Installing again
/// replaces the previous bridge and drops its pending callbacks.
///
/// # Safety
///
/// `config_json` must be null or a valid, NUL-terminated UTF-8 C string.
/// Non-null function pointers must stay valid for the life of the process.
///
/// Config JSON schema (all fields optional):
/// ```json
/// {
///   "max_request_id": 4294967295,
///   "logging": { "enabled": true, "filter": "signin_bridge=info", "json": false }
/// }
/// ```
#[unsafe(no_mangle)]
pub unsafe extern "C" fn signin_bridge_install(
    config_json: *const c_char,
    register_handler: Option<RegisterHandlerFn>,
    start_auth: Option<StartAuthFn>,
) -> i32 {
    let config = if config_json.is_null() {
        BridgeConfig::default()
    } else {
        let Some(json) = (unsafe { read_c_str(config_json) }) else {
            tracing::error!("signin_bridge_install: config_json is not valid UTF-8");
            return FfiResult::InvalidArgument as i32;
        };
        match BridgeConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("signin_bridge_install: {e}");
                return FfiResult::from(&e) as i32;
            }
        }
    };

    if config.logging.enabled {
        logging::init(&config.logging);
    }

    let native: Arc<dyn NativeAuth> = match (register_handler, start_auth) {
        (Some(register_handler), Some(start_auth)) => {
            Arc::new(unsafe { ExternNative::new(register_handler, start_auth) })
        }
        _ => {
            tracing::info!("signin_bridge_install: native sign-in not provided, running unavailable");
            Arc::new(Unavailable)
        }
    };

    let bridge = match SignInBridge::new(&config, native) {
        Ok(bridge) => Arc::new(bridge),
        Err(e) => {
            tracing::error!("signin_bridge_install: {e}");
            return FfiResult::from(&e) as i32;
        }
    };

    if let Some(previous) = INSTALLED.write().replace(bridge) {
        previous.detach();
        previous.reset();
        tracing::debug!("signin_bridge_install: replaced previous bridge");
    }
    FfiResult::Ok as i32
}

/// Tear down the process-wide bridge, dropping pending callbacks unrun.
///
/// Safe to call multiple times; the second call is a no-op.
#[unsafe(no_mangle)]
pub extern "C" fn signin_bridge_uninstall() {
    if let Some(bridge) = INSTALLED.write().take() {
        bridge.detach();
        bridge.reset();
        tracing::debug!("signin_bridge_uninstall: bridge removed");
    }
}

// ─── Sign-in ────────────────────────────────────────────────────────

/// Start a native sign-in.
///
/// Exactly one of the callbacks is invoked later, from inside
/// `signin_bridge_pump`, never from this call. On platforms without native
/// sign-in this returns `Ok` and neither callback ever fires.
///
/// # Safety
///
/// Both callbacks and `user_data` must stay valid until one callback has run
/// or the bridge is uninstalled.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn signin_bridge_start_login(
    on_success: Option<HostSuccessCallback>,
    on_error: Option<HostErrorCallback>,
    user_data: *mut c_void,
) -> i32 {
    let callbacks = match HostCallbacks::from_raw(on_success, on_error, user_data) {
        Ok(callbacks) => callbacks,
        Err(e) => {
            tracing::error!("signin_bridge_start_login: {e}");
            return FfiResult::from(&e) as i32;
        }
    };
    let Some(bridge) = installed() else {
        return FfiResult::from(&BridgeError::NotInstalled) as i32;
    };

    match bridge.start_with(callbacks.into_pending()) {
        Ok(_) => FfiResult::Ok as i32,
        Err(e) => {
            tracing::error!("signin_bridge_start_login: {e}");
            FfiResult::from(&e) as i32
        }
    }
}

// ─── Pump ───────────────────────────────────────────────────────────

/// Run queued sign-in callbacks on the calling thread.
///
/// Call once per host tick from the thread where application callbacks may
/// run. Returns the number of callbacks invoked; 0 when nothing is installed.
#[unsafe(no_mangle)]
pub extern "C" fn signin_bridge_pump() -> u32 {
    match installed() {
        Some(bridge) => u32::try_from(bridge.pump()).unwrap_or(u32::MAX),
        None => 0,
    }
}

/// Number of sign-ins still waiting for a native completion.
#[unsafe(no_mangle)]
pub extern "C" fn signin_bridge_pending_count() -> u32 {
    installed()
        .map(|bridge| u32::try_from(bridge.registry().pending_count()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

// ─── Tests ───────────────────────────────────────────────────────────

//! Application callbacks supplied by a managed host as C function pointers.

use std::ffi::{c_char, c_void, CString};

use crate::continuation::PendingCallback;
use crate::error::BridgeError;

/// Success callback: authorization code and user id, both null when the
/// platform reported success without a credential.
pub type HostSuccessCallback = unsafe extern "C" fn(
    authorization_code: *const c_char,
    user_id: *const c_char,
    user_data: *mut c_void,
);

/// Error callback: platform error code, domain and user info.
pub type HostErrorCallback = unsafe extern "C" fn(
    code: i32,
    domain: *const c_char,
    user_info: *const c_char,
    user_data: *mut c_void,
);

/// A host callback pair with its user_data pointer.
///
/// The host is responsible for keeping both callbacks and user_data valid
/// until one of them has been invoked.
pub struct HostCallbacks {
    on_success: HostSuccessCallback,
    on_error: HostErrorCallback,
    user_data: UserData,
}

#[derive(Clone, Copy)]
struct UserData(*mut c_void);

// Safety: user_data is opaque to the bridge; it is only passed back to the
// host's own callbacks, on the thread that calls pump.
unsafe impl Send for UserData {}

impl HostCallbacks {
    /// Reject a pair where either callback is null.
    pub fn from_raw(
        on_success: Option<HostSuccessCallback>,
        on_error: Option<HostErrorCallback>,
        user_data: *mut c_void,
    ) -> Result<Self, BridgeError> {
        let on_success = on_success.ok_or(BridgeError::MissingHandler("success"))?;
        let on_error = on_error.ok_or(BridgeError::MissingHandler("error"))?;
        Ok(Self {
            on_success,
            on_error,
            user_data: UserData(user_data),
        })
    }

    pub fn into_pending(self) -> PendingCallback {
        let Self {
            on_success,
            on_error,
            user_data,
        } = self;
        PendingCallback::new(
            move |credential| {
                let user_data = user_data;
                match credential {
                    Some(credential) => {
                        let code = to_c_string(&credential.authorization_code);
                        let user_id = to_c_string(&credential.user_id);
                        unsafe { on_success(code.as_ptr(), user_id.as_ptr(), user_data.0) }
                    }
                    None => unsafe {
                        on_success(std::ptr::null(), std::ptr::null(), user_data.0)
                    },
                }
            },
            move |error| {
                let user_data = user_data;
                let domain = to_c_string(&error.domain);
                let user_info = to_c_string(&error.user_info);
                unsafe { on_error(error.code, domain.as_ptr(), user_info.as_ptr(), user_data.0) }
            },
        )
    }
}

/// Interior NUL bytes cannot cross the ABI; strip them rather than drop the result.
fn to_c_string(s: &str) -> CString {
    CString::new(s).unwrap_or_else(|_| {
        tracing::warn!("callback string contained interior NUL byte, stripping");
        CString::new(s.replace('\0', "")).unwrap_or_default()
    })
}

//! Native entry point registration across reinstalls.
//!
//! Runs in its own test binary so the process starts with no handler
//! registered and the count below is exact.

use std::ffi::{c_char, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};

use signin_bridge::bridge::abi::{
    signin_bridge_install, signin_bridge_pending_count, signin_bridge_start_login,
    signin_bridge_uninstall,
};
use signin_bridge::{CompletionEntryPoint, FfiResult};

static REGISTRATIONS: AtomicUsize = AtomicUsize::new(0);
static STARTS: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn count_register(_entry: CompletionEntryPoint) {
    REGISTRATIONS.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn count_start(_request_id: u32) {
    STARTS.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn ignore_success(_code: *const c_char, _user: *const c_char, _data: *mut c_void) {}

unsafe extern "C" fn ignore_error(_code: i32, _domain: *const c_char, _info: *const c_char, _data: *mut c_void) {}

#[test]
fn entry_point_registered_once_across_reinstalls() {
    for round in 1..=3 {
        let result = unsafe { signin_bridge_install(std::ptr::null(), Some(count_register), Some(count_start)) };
        assert_eq!(result, FfiResult::Ok as i32);

        for _ in 0..2 {
            let result = unsafe {
                signin_bridge_start_login(Some(ignore_success), Some(ignore_error), std::ptr::null_mut())
            };
            assert_eq!(result, FfiResult::Ok as i32);
        }
        assert_eq!(signin_bridge_pending_count(), 2);
        assert_eq!(STARTS.load(Ordering::SeqCst), round * 2);
        assert_eq!(REGISTRATIONS.load(Ordering::SeqCst), 1, "round {round}");
    }

    signin_bridge_uninstall();
    assert_eq!(signin_bridge_pending_count(), 0);
    assert_eq!(REGISTRATIONS.load(Ordering::SeqCst), 1);
}

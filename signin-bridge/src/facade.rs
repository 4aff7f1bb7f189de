//! `SignInBridge`, the entry point applications and hosts use.

use std::sync::Arc;

use crate::bridge::{abi, route};
use crate::config::BridgeConfig;
use crate::continuation::PendingCallback;
use crate::error::BridgeError;
use crate::native::NativeAuth;
use crate::payload::{AuthCredential, AuthError};
use crate::registry::Registry;
use crate::request::RequestId;

/// Starts native sign-ins and hands their results back on the host's thread.
///
/// Only one bridge at a time may receive native completions: the first to
/// start a sign-in holds the route until it is dropped, and any other bridge's
/// `start_login` fails with [`BridgeError::RouteTaken`] meanwhile. Results are only
/// delivered from [`pump`](Self::pump), never from inside
/// [`start_login`](Self::start_login).
pub struct SignInBridge {
    registry: Arc<Registry>,
    native: Arc<dyn NativeAuth>,
}

impl SignInBridge {
    pub fn new(config: &BridgeConfig, native: Arc<dyn NativeAuth>) -> Result<Self, BridgeError> {
        let registry = Arc::new(Registry::from_config(config)?);
        tracing::debug!(
            available = native.is_available(),
            max_request_id = config.max_request_id,
            "sign-in bridge created"
        );
        Ok(Self { registry, native })
    }

    /// Whether native sign-in exists on this platform.
    pub fn is_available(&self) -> bool {
        self.native.is_available()
    }

    /// Begin a native sign-in.
    ///
    /// Returns `Ok(None)` without registering anything when native sign-in is
    /// unavailable; neither handler will ever run in that case.
    pub fn start_login<S, E>(
        &self,
        on_success: S,
        on_error: E,
    ) -> Result<Option<RequestId>, BridgeError>
    where
        S: FnOnce(Option<AuthCredential>) + Send + 'static,
        E: FnOnce(AuthError) + Send + 'static,
    {
        self.start_with(PendingCallback::new(on_success, on_error))
    }

    /// [`start_login`](Self::start_login) for an already-built continuation.
    pub fn start_with(&self, callback: PendingCallback) -> Result<Option<RequestId>, BridgeError> {
        if !self.native.is_available() {
            tracing::debug!("native sign-in unavailable, start_login is a no-op");
            return Ok(None);
        }

        route::bind(&self.registry)?;
        let id = self.registry.register(callback, || {
            route::register_handler_once(|| {
                self.native
                    .register_completion_handler(abi::signin_bridge_on_completion);
            });
        })?;
        self.native.start_auth(id);
        tracing::debug!(request_id = %id, "native sign-in started");
        Ok(Some(id))
    }

    /// Run queued completions. Call once per host tick on the thread where
    /// application callbacks may run. Returns how many ran.
    pub fn pump(&self) -> usize {
        self.registry.drain_all()
    }

    /// Drop every pending and queued callback. Intended for tests.
    pub fn reset(&self) {
        self.registry.reset();
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Stop routing native completions to this bridge.
    pub(crate) fn detach(&self) {
        route::unbind(&self.registry);
    }
}

impl Drop for SignInBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{CompletionEntryPoint, Unavailable};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeNative {
        handlers: AtomicUsize,
        started: Mutex<Vec<RequestId>>,
    }

    impl NativeAuth for FakeNative {
        fn is_available(&self) -> bool {
            true
        }

        fn register_completion_handler(&self, _entry: CompletionEntryPoint) {
            self.handlers.fetch_add(1, Ordering::SeqCst);
        }

        fn start_auth(&self, request_id: RequestId) {
            self.started.lock().push(request_id);
        }
    }

    const SUCCESS: &str = r#"{"isHasCredential":true,"credential":{"authorizationCode":"c","userId":"u"}}"#;

    #[test]
    fn test_unavailable_start_is_silent_noop() {
        let bridge = SignInBridge::new(&BridgeConfig::default(), Arc::new(Unavailable)).unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let (a, b) = (Arc::clone(&fired), Arc::clone(&fired));
        let id = bridge
            .start_login(
                move |_| {
                    a.fetch_add(1, Ordering::SeqCst);
                },
                move |_| {
                    b.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();

        assert!(id.is_none());
        assert!(!bridge.is_available());
        assert_eq!(bridge.registry().pending_count(), 0);
        assert_eq!(bridge.pump(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_start_registers_then_starts_native() {
        let _serial = route::TEST_LOCK.lock();
        let native = Arc::new(FakeNative::default());
        let bridge = SignInBridge::new(&BridgeConfig::default(), native.clone()).unwrap();

        let first = bridge.start_login(|_| {}, |_| {}).unwrap().unwrap();
        let second = bridge.start_login(|_| {}, |_| {}).unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(*native.started.lock(), vec![first, second]);
        // The entry point goes to the native layer once per process, possibly
        // from an earlier test's bridge.
        assert!(native.handlers.load(Ordering::SeqCst) <= 1);
        assert!(route::handler_registered());
        assert!(bridge.registry().is_channel_initialized());
    }

    #[test]
    fn test_callbacks_fire_only_on_pump() {
        let _serial = route::TEST_LOCK.lock();
        let native = Arc::new(FakeNative::default());
        let bridge = SignInBridge::new(&BridgeConfig::default(), native).unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let id = bridge
            .start_login(
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                |_| {},
            )
            .unwrap()
            .unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        bridge.registry().resolve(id, SUCCESS);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert_eq!(bridge.pump(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.pump(), 0);
    }

    #[test]
    fn test_second_bridge_cannot_steal_completions() {
        let _serial = route::TEST_LOCK.lock();
        let first = SignInBridge::new(&BridgeConfig::default(), Arc::new(FakeNative::default())).unwrap();
        let second = SignInBridge::new(&BridgeConfig::default(), Arc::new(FakeNative::default())).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first_log = Arc::clone(&log);
        let id = first
            .start_login(
                move |credential| {
                    first_log.lock().push(format!("first:{}", credential.unwrap().authorization_code))
                },
                |_| {},
            )
            .unwrap()
            .unwrap();

        let second_log = Arc::clone(&log);
        let refused = second.start_login(move |_| second_log.lock().push("second".to_string()), |_| {});
        assert!(matches!(refused, Err(BridgeError::RouteTaken)));
        assert_eq!(second.registry().pending_count(), 0);

        let payload = std::ffi::CString::new(
            r#"{"isHasCredential":true,"credential":{"authorizationCode":"secretA","userId":"u"}}"#,
        )
        .unwrap();
        unsafe { abi::signin_bridge_on_completion(id.get(), payload.as_ptr()) };

        assert_eq!(second.pump(), 0);
        assert_eq!(first.pump(), 1);
        assert_eq!(*log.lock(), vec!["first:secretA"]);

        // Dropping the first bridge releases the route.
        drop(first);
        assert!(second.start_login(|_| {}, |_| {}).unwrap().is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BridgeConfig {
            max_request_id: 0,
            ..BridgeConfig::default()
        };
        assert!(SignInBridge::new(&config, Arc::new(Unavailable)).is_err());
    }
}

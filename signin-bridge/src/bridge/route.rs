//! Process-wide binding from the stateless completion entry point to the
//! registry that owns the pending callbacks.
//!
//! The native layer only knows a bare function pointer, so the crate keeps two
//! globals here: the slot naming the one registry completions go to, and the
//! guard ensuring the entry point is handed to the native layer only once per
//! process. Ids are only unique within a registry, so a second registry may not
//! take the slot while the first still holds it.

use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;

use crate::error::BridgeError;
use crate::registry::Registry;

static ROUTE: Lazy<RwLock<Option<Arc<Registry>>>> = Lazy::new(|| RwLock::new(None));

/// Set once the completion entry point has been registered with the native layer.
static HANDLER: OnceCell<()> = OnceCell::new();

/// Serializes unit tests that bind the process-wide route.
#[cfg(test)]
pub(crate) static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

/// Route completions to `registry`.
///
/// Succeeds if the slot is free or already points at `registry`; fails with
/// [`BridgeError::RouteTaken`] while another registry holds it.
pub fn bind(registry: &Arc<Registry>) -> Result<(), BridgeError> {
    if ROUTE
        .read()
        .as_ref()
        .is_some_and(|bound| Arc::ptr_eq(bound, registry))
    {
        return Ok(());
    }

    let mut slot = ROUTE.write();
    match slot.as_ref() {
        Some(bound) if Arc::ptr_eq(bound, registry) => Ok(()),
        Some(_) => Err(BridgeError::RouteTaken),
        None => {
            *slot = Some(Arc::clone(registry));
            tracing::debug!("completion route bound");
            Ok(())
        }
    }
}

/// Remove the binding if it still points at `registry`.
pub fn unbind(registry: &Arc<Registry>) {
    let mut slot = ROUTE.write();
    if slot.as_ref().is_some_and(|bound| Arc::ptr_eq(bound, registry)) {
        *slot = None;
        tracing::debug!("completion route released");
    }
}

/// The registry completions currently go to.
pub fn current() -> Option<Arc<Registry>> {
    ROUTE.read().clone()
}

/// Run `register` the first time it is called in this process; later calls,
/// from any bridge, do nothing.
pub fn register_handler_once(register: impl FnOnce()) {
    HANDLER.get_or_init(|| {
        tracing::debug!("registering completion entry point with native layer");
        register();
    });
}

/// Whether the entry point has been handed to the native layer.
pub fn handler_registered() -> bool {
    HANDLER.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_registry_cannot_take_route() {
        let _serial = TEST_LOCK.lock();
        let first = Arc::new(Registry::new());
        let second = Arc::new(Registry::new());

        bind(&first).unwrap();
        bind(&first).unwrap();
        assert!(matches!(bind(&second), Err(BridgeError::RouteTaken)));
        assert!(current().is_some_and(|bound| Arc::ptr_eq(&bound, &first)));

        unbind(&second);
        assert!(current().is_some_and(|bound| Arc::ptr_eq(&bound, &first)));

        unbind(&first);
        bind(&second).unwrap();
        assert!(current().is_some_and(|bound| Arc::ptr_eq(&bound, &second)));
        unbind(&second);
        assert!(current().is_none());
    }
}

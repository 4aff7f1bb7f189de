//! Registry of pending sign-in requests.
//!
//! The id counter, the pending map and the completion queue sit behind one
//! `parking_lot::Mutex`, so `register`, `resolve` and the dequeue half of
//! `drain_all` are atomic with respect to each other. Completions run outside
//! the lock.

use std::collections::{HashMap, VecDeque};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::config::BridgeConfig;
use crate::continuation::{Completion, PendingCallback};
use crate::error::BridgeError;
use crate::queue::CompletionQueue;
use crate::request::{IdAllocator, RequestId};

#[derive(Debug)]
struct State {
    ids: IdAllocator,
    pending: HashMap<RequestId, PendingCallback>,
    queue: CompletionQueue,
}

/// Owns every pending callback from registration until resolution.
#[derive(Debug)]
pub struct Registry {
    state: Mutex<State>,
    /// Set once the native completion channel has been registered.
    channel: OnceCell<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_max_id(IdAllocator::DEFAULT_MAX)
    }

    /// Registry whose ids wrap back to 1 when the counter reaches `max_id`.
    pub fn with_max_id(max_id: u32) -> Self {
        Self {
            state: Mutex::new(State {
                ids: IdAllocator::new(max_id),
                pending: HashMap::new(),
                queue: CompletionQueue::new(),
            }),
            channel: OnceCell::new(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self::with_max_id(config.max_request_id))
    }

    /// Store `callback` under a fresh id.
    ///
    /// The first registration on this registry runs `init_channel` while the
    /// lock is held; later calls never run it. `init_channel` must not call
    /// back into the registry.
    pub fn register(
        &self,
        callback: PendingCallback,
        init_channel: impl FnOnce(),
    ) -> Result<RequestId, BridgeError> {
        let mut state = self.state.lock();
        self.channel.get_or_init(|| {
            tracing::debug!("initializing native completion channel");
            init_channel();
        });

        let State { ids, pending, .. } = &mut *state;
        let id = ids.allocate(|candidate| pending.contains_key(&candidate))?;
        pending.insert(id, callback);
        tracing::debug!(request_id = %id, pending = pending.len(), "registered sign-in request");
        Ok(id)
    }

    /// Move the callback for `id` into the completion queue.
    ///
    /// Unknown or already-resolved ids are ignored. Returns whether a
    /// completion was queued.
    pub fn resolve(&self, id: RequestId, payload: impl Into<String>) -> bool {
        let mut state = self.state.lock();
        let Some(callback) = state.pending.remove(&id) else {
            tracing::trace!(request_id = %id, "ignoring completion for unknown request");
            return false;
        };
        state.queue.enqueue(Completion::new(id, callback, payload.into()));
        tracing::debug!(request_id = %id, queued = state.queue.len(), "queued sign-in completion");
        true
    }

    /// Run every completion queued so far, oldest first, on the calling thread.
    ///
    /// Completions resolved while draining wait for the next call. If a
    /// callback panics, the completions behind it go back to the head of the
    /// queue before the panic continues.
    pub fn drain_all(&self) -> usize {
        let batch = self.state.lock().queue.take_all();
        if batch.is_empty() {
            return 0;
        }

        let mut rest = Requeue {
            registry: self,
            batch,
        };
        let mut ran = 0;
        while let Some(completion) = rest.batch.pop_front() {
            completion.run();
            ran += 1;
        }
        ran
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn queued_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Ids of resolved completions in the order they will run.
    pub fn queued_ids(&self) -> Vec<RequestId> {
        self.state.lock().queue.request_ids()
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.state.lock().pending.contains_key(&id)
    }

    pub fn max_id(&self) -> u32 {
        self.state.lock().ids.max()
    }

    pub fn is_channel_initialized(&self) -> bool {
        self.channel.get().is_some()
    }

    /// Drop all pending and queued callbacks without running them and restart
    /// ids at 1. The native channel stays initialized.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let dropped = state.pending.len() + state.queue.len();
        state.pending.clear();
        state.queue.clear();
        state.ids.reset();
        tracing::debug!(dropped, "registry reset");
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns unexecuted completions to the queue if a callback unwinds.
struct Requeue<'a> {
    registry: &'a Registry,
    batch: VecDeque<Completion>,
}

impl Drop for Requeue<'_> {
    fn drop(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.batch);
        tracing::warn!(
            requeued = batch.len(),
            "sign-in callback panicked, requeueing remaining completions"
        );
        self.registry.state.lock().queue.restore_front(batch);
    }
}

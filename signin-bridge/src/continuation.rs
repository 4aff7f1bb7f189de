//! Pending callbacks and the queued units of work built from them.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::payload::{self, AuthCredential, AuthError, Outcome};
use crate::request::RequestId;

pub type SuccessHandler = Box<dyn FnOnce(Option<AuthCredential>) + Send + 'static>;
pub type ErrorHandler = Box<dyn FnOnce(AuthError) + Send + 'static>;

/// Two-branch continuation waiting for a sign-in result.
///
/// Exactly one branch runs, exactly once; running consumes the value.
pub struct PendingCallback {
    on_success: SuccessHandler,
    on_error: ErrorHandler,
}

impl PendingCallback {
    pub fn new<S, E>(on_success: S, on_error: E) -> Self
    where
        S: FnOnce(Option<AuthCredential>) + Send + 'static,
        E: FnOnce(AuthError) + Send + 'static,
    {
        Self {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        }
    }

    /// Run the branch selected by `outcome`, dropping the other.
    pub fn complete(self, outcome: Outcome) {
        match outcome {
            Outcome::Success(credential) => (self.on_success)(credential),
            Outcome::Failure(error) => (self.on_error)(error),
        }
    }
}

impl fmt::Debug for PendingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCallback").finish_non_exhaustive()
    }
}

/// A resolved request waiting in the completion queue.
///
/// The payload stays undecoded until [`run`](Self::run), so a queued unit can
/// be inspected without side effects.
#[derive(Debug)]
pub struct Completion {
    request_id: RequestId,
    callback: PendingCallback,
    payload: String,
    received_at: DateTime<Utc>,
}

impl Completion {
    pub fn new(request_id: RequestId, callback: PendingCallback, payload: String) -> Self {
        Self {
            request_id,
            callback,
            payload,
            received_at: Utc::now(),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The payload exactly as the native layer delivered it.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// When the native completion was received.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Decode the payload and invoke the matching branch.
    pub fn run(self) {
        let waited_ms = (Utc::now() - self.received_at).num_milliseconds();
        let outcome = payload::decode(&self.payload);
        tracing::debug!(
            request_id = %self.request_id,
            success = matches!(outcome, Outcome::Success(_)),
            waited_ms,
            "running sign-in completion"
        );
        self.callback.complete(outcome);
    }
}

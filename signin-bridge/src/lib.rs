//! Bridge between an asynchronous native sign-in call and application callbacks.
//!
//! The native layer can only answer through one stateless C function pointer
//! tagged with a numeric request id. This crate issues those ids, parks each
//! caller's success/error continuation until the matching completion arrives
//! on whatever thread the native layer uses, and hands it back on the host's
//! own thread when the host pumps the completion queue.
//!
//! Rust callers use [`SignInBridge`]; managed hosts use the `extern "C"`
//! functions in [`bridge::abi`].

pub mod bridge;
pub mod config;
pub mod continuation;
pub mod error;
pub mod facade;
pub mod logging;
pub mod native;
pub mod payload;
pub mod queue;
pub mod registry;
pub mod request;

pub use config::{BridgeConfig, LoggingConfig};
pub use continuation::{Completion, PendingCallback};
pub use error::{BridgeError, FfiResult};
pub use facade::SignInBridge;
pub use native::{CompletionEntryPoint, ExternNative, NativeAuth, Unavailable};
pub use payload::{AuthCredential, AuthError, AuthResponse, Outcome};
pub use registry::Registry;
pub use request::RequestId;

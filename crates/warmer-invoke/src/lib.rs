//! warmer-invoke — starting other function instances.
//!
//! The orchestrator only needs one capability from the outside world:
//! "invoke function X with payload P, either fire-and-forget or
//! wait-for-completion". That capability is the [`RemoteInvoker`] trait.
//!
//! # Adapters
//!
//! ```text
//! RemoteInvoker
//!   ├── HttpInvoker       POST /2015-03-31/functions/{name}/invocations
//!   │                     X-Amz-Invocation-Type: Event | RequestResponse
//!   └── RecordingInvoker  in-memory, records requests (tests, dry runs)
//! ```
//!
//! Failures are reported as [`InvokeError`] and never retried here; the
//! caller decides what a failed warming fan-out means.

pub mod error;
pub mod client;
pub mod recording;

use std::future::Future;
use std::pin::Pin;

use warmer_core::InvocationRequest;

pub use error::{InvokeError, InvokeResult};
pub use client::HttpInvoker;
pub use recording::RecordingInvoker;

/// Boxed future returned by [`RemoteInvoker::invoke`].
pub type InvokeFuture<'a> = Pin<Box<dyn Future<Output = InvokeResult<()>> + Send + 'a>>;

/// Capability to start another function instance.
///
/// For `RequestResponse` requests the future resolves once the invoked
/// function has finished; for `Event` requests it resolves once the
/// invocation has been accepted.
pub trait RemoteInvoker: Send + Sync {
    fn invoke<'a>(&'a self, request: &'a InvocationRequest) -> InvokeFuture<'a>;
}

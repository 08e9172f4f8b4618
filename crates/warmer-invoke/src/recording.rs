//! In-memory invoker.
//!
//! Records every request in the order `invoke` was called and answers
//! with success, or with a primed failure. Backs `--dry-run` and the
//! orchestrator tests.

use std::sync::Mutex;

use tracing::debug;

use warmer_core::InvocationRequest;

use crate::{InvokeError, InvokeFuture, RemoteInvoker};

#[derive(Debug, Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<InvocationRequest>>,
    failure: Mutex<Option<InvokeError>>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent invocation fail with `err`.
    pub fn fail_with(&self, err: InvokeError) {
        *lock(&self.failure) = Some(err);
    }

    /// Snapshot of all recorded requests, in call order.
    pub fn calls(&self) -> Vec<InvocationRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Remove and return the recorded requests.
    pub fn take(&self) -> Vec<InvocationRequest> {
        std::mem::take(&mut *lock(&self.calls))
    }
}

impl RemoteInvoker for RecordingInvoker {
    fn invoke<'a>(&'a self, request: &'a InvocationRequest) -> InvokeFuture<'a> {
        lock(&self.calls).push(request.clone());
        let outcome = match lock(&self.failure).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        };
        debug!(
            function = %request.target,
            invocation_type = %request.invocation_type,
            ok = outcome.is_ok(),
            "recorded invocation"
        );
        Box::pin(async move { outcome })
    }
}

/// Recover the guard from a poisoned lock; the data is append-only.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! Invoker error types.

use thiserror::Error;

pub type InvokeResult<T> = Result<T, InvokeError>;

/// Errors raised while invoking a remote function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("failed to encode payload for {target}: {reason}")]
    Encode { target: String, reason: String },

    #[error("transport error invoking {target}: {reason}")]
    Transport { target: String, reason: String },

    #[error("invoke of {target} returned status {status}: {body}")]
    Status {
        target: String,
        status: u16,
        body: String,
    },

    #[error("function {target} failed ({kind}): {body}")]
    Function {
        target: String,
        kind: String,
        body: String,
    },

    #[error("invoke of {target} timed out after {timeout_ms}ms")]
    Timeout { target: String, timeout_ms: u64 },

    /// Injected failure, used by [`crate::RecordingInvoker`].
    #[error("{0}")]
    Other(String),
}

impl InvokeError {
    /// The function the failed invocation was addressed to, if known.
    pub fn target(&self) -> Option<&str> {
        match self {
            InvokeError::Encode { target, .. }
            | InvokeError::Transport { target, .. }
            | InvokeError::Status { target, .. }
            | InvokeError::Function { target, .. }
            | InvokeError::Timeout { target, .. } => Some(target),
            InvokeError::Other(_) => None,
        }
    }
}

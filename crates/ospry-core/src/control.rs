//! Cancellation of in-flight transfers.
//!
//! A download checks its `AbortToken` on every received chunk; once the token
//! is set the transfer stops and the call returns `ApiError::Aborted`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag used to cancel a running transfer from another thread.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the transfer using this token stop.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

//! Retry and backoff policy for idempotent API requests.
//!
//! Classification (network failures, throttling, 5xx) and exponential backoff
//! live here so every request path shares one policy. Uploads and downloads
//! are never retried.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;

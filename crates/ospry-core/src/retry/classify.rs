//! Map API errors onto retry policy error kinds.

use super::policy::ErrorKind;
use crate::error::ApiError;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

pub fn classify(e: &ApiError) -> ErrorKind {
    match e {
        ApiError::Network(_) => ErrorKind::Network,
        ApiError::Internal { status } | ApiError::Service { status, .. } => {
            classify_http_status(*status)
        }
        _ => ErrorKind::Other,
    }
}

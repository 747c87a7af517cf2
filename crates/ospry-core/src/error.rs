//! Error types for URL formatting and API calls.

use thiserror::Error;

const DOCS_BASE: &str = "https://ospry.io/docs#error-";

/// Failure while formatting an image URL. Always raised synchronously; no
/// partial URL is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// An option value is not acceptable (e.g. unknown image format).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The image reference (or a value embedded in it) cannot be parsed.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

/// Error returned by the API façade (requests, uploads, downloads).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: DNS, connect, TLS, timeout, reset.
    #[error("network error: {0}")]
    Network(String),
    /// Download answered 404.
    #[error("not found")]
    NotFound,
    /// Download answered 403 (private image, bad or expired signature).
    #[error("forbidden")]
    NotAuthorized,
    /// Download answered some other non-200 status.
    #[error("internal error (HTTP {status})")]
    Internal { status: u32 },
    /// Error envelope returned by the service.
    #[error("{message} ({cause}, HTTP {status})")]
    Service {
        cause: String,
        message: String,
        status: u32,
        docs_url: Option<String>,
    },
    /// Transfer stopped through an abort token.
    #[error("transfer aborted")]
    Aborted,
    /// Response body was not the expected JSON envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Short machine-readable cause, matching the service's error names.
    pub fn cause(&self) -> &str {
        match self {
            ApiError::Network(_) => "network-error",
            ApiError::NotFound => "not-found",
            ApiError::NotAuthorized => "not-authorized",
            ApiError::Internal { .. } => "internal-error",
            ApiError::Service { cause, .. } => cause,
            ApiError::Aborted => "aborted",
            ApiError::InvalidResponse(_) => "invalid-response",
            ApiError::InvalidArgument(_) | ApiError::Format(_) => "invalid-argument",
            ApiError::Io(_) => "io-error",
        }
    }

    /// HTTP status associated with the error, if any.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::NotAuthorized => Some(403),
            ApiError::Internal { status } => Some(*status),
            ApiError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Link to the service documentation for this error.
    pub fn docs_url(&self) -> String {
        match self {
            ApiError::Service {
                docs_url: Some(u), ..
            } => u.clone(),
            other => format!("{}{}", DOCS_BASE, other.cause()),
        }
    }
}

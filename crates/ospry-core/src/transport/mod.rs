//! HTTP boundary used by the client.
//!
//! The client only depends on the [`Transport`] trait; [`CurlTransport`] is
//! the libcurl implementation used in production.

mod curl;

use std::io::Write;

pub use self::curl::{CurlOptions, CurlTransport};
use crate::control::AbortToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Safe to repeat after a failure.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Method::Post)
    }
}

/// Fully built request. `auth` is `(user, password)` for HTTP basic auth.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub auth: Option<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            auth: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((user.into(), password.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

/// Transport-level failure (no HTTP status was obtained, or the transfer
/// was stopped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connect, DNS, TLS, timeout, or read/write failure.
    Network(String),
    /// Download stopped because the response status was not 200.
    Status(u32),
    /// Download stopped through its abort token.
    Aborted,
    /// Writing the body to the sink failed.
    Sink(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network(e) => write!(f, "{}", e),
            TransportError::Status(code) => write!(f, "HTTP {}", code),
            TransportError::Aborted => write!(f, "aborted"),
            TransportError::Sink(e) => write!(f, "sink: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

/// Performs authenticated API calls and streaming downloads.
pub trait Transport: Send + Sync {
    /// Sends `req` and buffers the whole response body.
    fn request(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// GETs `url`, streaming the body into `sink`. Stops early with
    /// `TransportError::Status` as soon as a non-200 status is seen, or with
    /// `TransportError::Aborted` once `abort` is set. Returns bytes written.
    fn download(
        &self,
        url: &str,
        sink: &mut dyn Write,
        abort: &AbortToken,
    ) -> Result<u64, TransportError>;
}

//! Ospry API client.
//!
//! Owns the secret key and a [`Transport`]. URL formatting is pure and needs
//! no network; every other operation is one blocking HTTP exchange (run it on
//! `spawn_blocking` from async code).

mod envelope;

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

pub use envelope::ImageMetadata;

use crate::api_key::ApiKey;
use crate::config::OspryConfig;
use crate::control::AbortToken;
use crate::error::{ApiError, FormatError};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::transport::{CurlTransport, HttpRequest, Method, Transport, TransportError};
use crate::url_format::{self, FormatOptions, QueryParams};

#[derive(Clone)]
pub struct Client {
    key: ApiKey,
    server_url: Url,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("key", &self.key)
            .field("server_url", &self.server_url.as_str())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Body of a `PUT /images` patch entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Patch<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_claimed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_private: Option<bool>,
}

fn transport_err(e: TransportError) -> ApiError {
    match e {
        TransportError::Network(msg) => ApiError::Network(msg),
        TransportError::Status(404) => ApiError::NotFound,
        TransportError::Status(403) => ApiError::NotAuthorized,
        TransportError::Status(status) => ApiError::Internal { status },
        TransportError::Aborted => ApiError::Aborted,
        TransportError::Sink(msg) => ApiError::Io(std::io::Error::other(msg)),
    }
}

impl Client {
    /// Client for the default endpoint using libcurl.
    pub fn new(key: impl Into<ApiKey>) -> Result<Self, ApiError> {
        Self::with_transport(
            key,
            crate::config::DEFAULT_SERVER_URL,
            Arc::new(CurlTransport::default()),
        )
    }

    /// Client configured from `cfg` (endpoint, TLS, timeouts, retry).
    pub fn from_config(cfg: &OspryConfig, key: ApiKey) -> Result<Self, ApiError> {
        let transport = Arc::new(CurlTransport::new(cfg.curl_options()));
        Ok(Self::with_transport(key, &cfg.server_url, transport)?.with_retry(cfg.retry_policy()))
    }

    pub fn with_transport(
        key: impl Into<ApiKey>,
        server_url: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ApiError> {
        let server_url = Url::parse(server_url).map_err(|e| {
            ApiError::InvalidArgument(format!("invalid server url ({}): {}", server_url, e))
        })?;
        if server_url.host_str().is_none() {
            return Err(ApiError::InvalidArgument(format!(
                "server url has no host ({})",
                server_url
            )));
        }
        Ok(Self {
            key: key.into(),
            server_url,
            transport,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Formats `image_url` with `opts` relative to the current time.
    pub fn format_url(&self, image_url: &str, opts: &FormatOptions) -> Result<String, FormatError> {
        self.format_url_at(image_url, opts, Utc::now())
    }

    /// Formats `image_url` with `opts` as if evaluated at `now`.
    pub fn format_url_at(
        &self,
        image_url: &str,
        opts: &FormatOptions,
        now: DateTime<Utc>,
    ) -> Result<String, FormatError> {
        url_format::format_url(&self.key, &self.server_url, image_url, opts, now)
    }

    /// `<server_url>/images` plus an optional canonical query.
    fn images_url(&self, query: &QueryParams) -> String {
        format!(
            "{}/images{}",
            self.server_url.as_str().trim_end_matches('/'),
            query.to_query_string()
        )
    }

    fn authed(&self, req: HttpRequest) -> HttpRequest {
        req.basic_auth(self.key.as_str(), "")
    }

    /// Sends an API request, retrying idempotent methods per the policy.
    fn call(&self, req: HttpRequest) -> Result<Vec<ImageMetadata>, ApiError> {
        let req = self.authed(req);
        let attempt = || {
            let resp = self.transport.request(&req).map_err(transport_err)?;
            envelope::parse_images(&resp)
        };
        if req.method.is_idempotent() {
            run_with_retry(&self.retry, attempt)
        } else {
            attempt()
        }
    }

    fn ids_query(ids: &[&str]) -> Result<QueryParams, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::InvalidArgument("ids is empty".into()));
        }
        let mut q = QueryParams::new();
        for id in ids {
            q.append("ids[]", *id);
        }
        Ok(q)
    }

    fn patch(
        &self,
        ids: &[&str],
        claimed: Option<bool>,
        private: Option<bool>,
    ) -> Result<Vec<ImageMetadata>, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::InvalidArgument("ids is empty".into()));
        }
        let patches: Vec<Patch<'_>> = ids
            .iter()
            .map(|&id| Patch {
                id,
                is_claimed: claimed,
                is_private: private,
            })
            .collect();
        let body = serde_json::to_vec(&patches)
            .map_err(|e| ApiError::InvalidArgument(format!("encode patches: {}", e)))?;
        let req = HttpRequest::new(Method::Put, self.images_url(&QueryParams::new()))
            .header("Content-Type", "application/json")
            .body(body);
        tracing::debug!(count = ids.len(), ?claimed, ?private, "PUT images");
        self.call(req)
    }

    /// Uploads an image. The server detects the actual image type.
    pub fn upload(
        &self,
        filename: &str,
        is_private: bool,
        image: Vec<u8>,
    ) -> Result<ImageMetadata, ApiError> {
        if filename.is_empty() {
            return Err(ApiError::InvalidArgument("filename is empty".into()));
        }
        let mut q = QueryParams::new();
        q.set("filename", filename);
        q.set("isPrivate", is_private.to_string());
        let req = HttpRequest::new(Method::Post, self.images_url(&q))
            // image/jpeg distinguishes a raw body from multipart/form-data.
            .header("Content-Type", "image/jpeg")
            .body(image);
        tracing::info!(filename, is_private, "uploading image");
        self.call(req)?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidResponse("upload returned no image".into()))
    }

    /// Downloads `image_url` formatted with `opts`, streaming into `sink`.
    ///
    /// The transfer stops as soon as the response status is not 200
    /// (404 → `NotFound`, 403 → `NotAuthorized`, other → `Internal`) or when
    /// `abort` is set. Returns the number of bytes written.
    pub fn download(
        &self,
        image_url: &str,
        opts: &FormatOptions,
        sink: &mut dyn Write,
        abort: &AbortToken,
    ) -> Result<u64, ApiError> {
        let url = self.format_url(image_url, opts)?;
        tracing::debug!(url = %image_url, "downloading image");
        self.transport
            .download(&url, sink, abort)
            .map_err(transport_err)
    }

    pub fn get_metadata(&self, ids: &[&str]) -> Result<Vec<ImageMetadata>, ApiError> {
        let q = Self::ids_query(ids)?;
        self.call(HttpRequest::new(Method::Get, self.images_url(&q)))
    }

    /// Claims uploaded images so they survive the account's claiming window.
    pub fn claim(&self, ids: &[&str]) -> Result<Vec<ImageMetadata>, ApiError> {
        self.patch(ids, Some(true), None)
    }

    /// Private images can only be fetched with the key or a signed URL.
    pub fn make_private(&self, ids: &[&str]) -> Result<Vec<ImageMetadata>, ApiError> {
        self.patch(ids, None, Some(true))
    }

    pub fn make_public(&self, ids: &[&str]) -> Result<Vec<ImageMetadata>, ApiError> {
        self.patch(ids, None, Some(false))
    }

    pub fn delete(&self, ids: &[&str]) -> Result<(), ApiError> {
        let q = Self::ids_query(ids)?;
        tracing::info!(count = ids.len(), "deleting images");
        self.call(HttpRequest::new(Method::Delete, self.images_url(&q)))
            .map(|_| ())
    }
}

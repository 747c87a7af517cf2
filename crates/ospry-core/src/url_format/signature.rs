//! Time-limited URL signing.
//!
//! The signed payload is an external contract with the service:
//!
//! ```text
//! payload   = base_url + "?timeExpired=" + urlencode(iso8601(expire_at))
//! signature = base64(HMAC-SHA256(api_key, payload))
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use super::query::QueryParams;
use crate::api_key::ApiKey;
use crate::error::FormatError;

type HmacSha256 = Hmac<Sha256>;

/// UTC, millisecond precision, `Z` suffix (e.g. `2024-01-01T00:00:30.000Z`).
pub fn iso8601(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Exact byte sequence that gets signed.
pub fn payload(base_url: &str, expire_at: DateTime<Utc>) -> String {
    format!(
        "{}?timeExpired={}",
        base_url,
        urlencoding::encode(&iso8601(expire_at))
    )
}

/// Base64 HMAC-SHA256 of the payload for `base_url` and `expire_at`.
pub fn sign(key: &ApiKey, base_url: &str, expire_at: DateTime<Utc>) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload(base_url, expire_at).as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Builds the wrapper URL served by the service endpoint: `https`, the
/// service host, path `/`, carrying `url`, `timeExpired` and `signature`.
pub(crate) fn signed_params(
    key: &ApiKey,
    service_url: &Url,
    base: &Url,
    expire_at: DateTime<Utc>,
) -> Result<(Url, QueryParams), FormatError> {
    let host = service_url.host_str().ok_or_else(|| {
        FormatError::InvalidArgument(format!("service url has no host ({})", service_url))
    })?;
    let mut endpoint = Url::parse(&format!("https://{}/", host)).map_err(|e| {
        FormatError::InvalidArgument(format!("invalid service host ({}): {}", host, e))
    })?;
    if let Some(port) = service_url.port() {
        endpoint
            .set_port(Some(port))
            .map_err(|_| FormatError::InvalidArgument(format!("invalid service port ({})", port)))?;
    }

    let base_url = base.as_str();
    let mut params = QueryParams::new();
    params.set("signature", sign(key, base_url, expire_at));
    params.set("url", base_url);
    params.set("timeExpired", iso8601(expire_at));
    Ok((endpoint, params))
}

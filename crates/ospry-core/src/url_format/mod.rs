//! Image URL formatting and signing.
//!
//! Turns an image reference plus [`FormatOptions`] into a single stable URL:
//! options are merged with those already on the reference, the underlying
//! resource is recovered (unwrapping previously signed URLs), the result is
//! signed when an expiry applies, and the query is emitted in sorted key
//! order so identical inputs always give byte-identical output.

mod canonical;
mod options;
mod query;
mod signature;

use chrono::{DateTime, Utc};
use url::Url;

use crate::api_key::ApiKey;
use crate::error::FormatError;

pub use options::{FormatOptions, ImageFormat};
pub use query::QueryParams;
pub use signature::{iso8601, payload, sign};

/// Formats `image_url` with `opts`, evaluated at `now`.
///
/// An empty option set returns `image_url` unchanged without parsing it.
/// When an expiry resolves, the result points at the root of `service_url`'s
/// host and is signed with `key`; otherwise it stays on the resource's own
/// host.
///
/// # Examples
///
/// - `https://img.example/i/abc` with `max_height(150)` →
///   `https://img.example/i/abc?maxHeight=150`
/// - the same with `expire_after_secs(30)` at `2024-01-01T00:00:00Z` →
///   `https://api.ospry.io/?maxHeight=150&signature=...&timeExpired=2024-01-01T00%3A00%3A30.000Z&url=https%3A%2F%2Fimg.example%2Fi%2Fabc`
pub fn format_url(
    key: &ApiKey,
    service_url: &Url,
    image_url: &str,
    opts: &FormatOptions,
    now: DateTime<Utc>,
) -> Result<String, FormatError> {
    if opts.is_empty() {
        return Ok(image_url.to_string());
    }

    let canonical = canonical::canonicalize(image_url)?;
    let resolved = options::resolve(opts, &canonical.existing, now)?;

    let (endpoint, mut params) = match resolved.expire_at {
        Some(expire_at) => signature::signed_params(key, service_url, &canonical.base, expire_at)?,
        None => (canonical.base, QueryParams::new()),
    };

    match resolved.format {
        Some(f) => params.set("format", f.as_str()),
        None => params.remove("format"),
    }
    match resolved.max_width {
        Some(w) => params.set("maxWidth", w.to_string()),
        None => params.remove("maxWidth"),
    }
    match resolved.max_height {
        Some(h) => params.set("maxHeight", h.to_string()),
        None => params.remove("maxHeight"),
    }

    Ok(query::build_url(&endpoint, &params))
}

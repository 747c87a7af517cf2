//! Recovers the bare resource URL behind an image reference.

use url::Url;

use super::query::QueryParams;
use crate::error::FormatError;

/// An image reference split into its underlying resource and the
/// parameters it carried.
#[derive(Debug, Clone)]
pub(crate) struct CanonicalUrl {
    /// Resource URL with query and fragment cleared.
    pub base: Url,
    /// Parameters found on the reference as given (the outer URL).
    pub existing: QueryParams,
}

/// Parses `image_url`. A reference that wraps another one through a `url`
/// parameter (a signed URL) resolves to the wrapped resource.
pub(crate) fn canonicalize(image_url: &str) -> Result<CanonicalUrl, FormatError> {
    let outer = Url::parse(image_url).map_err(|e| {
        FormatError::MalformedInput(format!("invalid image url ({}): {}", image_url, e))
    })?;
    let existing = QueryParams::from_url(&outer);

    let mut base = match existing.get("url") {
        Some(inner) => Url::parse(inner).map_err(|e| {
            FormatError::MalformedInput(format!("invalid wrapped url ({}): {}", inner, e))
        })?,
        None => outer,
    };
    base.set_query(None);
    base.set_fragment(None);

    Ok(CanonicalUrl { base, existing })
}

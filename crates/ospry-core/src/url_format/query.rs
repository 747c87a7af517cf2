//! Canonical query string: sorted keys, individually percent-encoded pairs.

use std::collections::BTreeMap;

/// Ordered multimap of query parameters.
///
/// Keys iterate in byte order; values of a repeated key keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects decoded pairs from a parsed URL, keeping repeated keys.
    pub fn from_url(url: &url::Url) -> Self {
        let mut q = Self::new();
        for (k, v) in url.query_pairs() {
            q.append(k.into_owned(), v.into_owned());
        }
        q
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), vec![value.into()]);
    }

    /// Adds `value` after any existing values of `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.params.remove(key);
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Serializes as `?k1=v1&k2=v2...`, or an empty string when there are no
    /// parameters.
    pub fn to_query_string(&self) -> String {
        let mut out = String::new();
        for (key, values) in &self.params {
            let key = urlencoding::encode(key);
            for value in values {
                out.push(if out.is_empty() { '?' } else { '&' });
                out.push_str(&key);
                out.push('=');
                out.push_str(&urlencoding::encode(value));
            }
        }
        out
    }
}

/// Appends the canonical query of `params` to `url` (which must carry no query
/// or fragment of its own).
pub(crate) fn build_url(url: &url::Url, params: &QueryParams) -> String {
    let mut out = url.as_str().to_string();
    out.push_str(&params.to_query_string());
    out
}

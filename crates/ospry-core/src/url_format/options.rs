//! Format options and their resolution against an existing URL's query.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};

use super::query::QueryParams;
use crate::error::FormatError;

/// Image formats the service can convert to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 4] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::Bmp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = FormatError;

    /// Case-insensitive; `jpg` is accepted as `jpeg`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            "gif" => Ok(ImageFormat::Gif),
            "bmp" => Ok(ImageFormat::Bmp),
            _ => Err(FormatError::InvalidArgument(format!(
                "invalid image format ({})",
                s
            ))),
        }
    }
}

/// Caller-supplied formatting options. Every field is optional; a fully
/// empty set returns the image URL untouched.
///
/// | field        | meaning                                                  |
/// |--------------|----------------------------------------------------------|
/// | `format`     | target format; `Some("")` removes an existing one        |
/// | `max_width`  | width bound in pixels; `<= 0` removes an existing one    |
/// | `max_height` | height bound in pixels; `<= 0` removes an existing one   |
/// | `expire_at`  | absolute expiry; makes the URL signed                    |
/// | `expire_after_secs` | seconds from now; overrides `expire_at`           |
///
/// Unset fields fall back to the values already embedded in the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    pub format: Option<String>,
    pub max_width: Option<i64>,
    pub max_height: Option<i64>,
    pub expire_at: Option<DateTime<Utc>>,
    pub expire_after_secs: Option<i64>,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn max_width(mut self, width: i64) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn max_height(mut self, height: i64) -> Self {
        self.max_height = Some(height);
        self
    }

    pub fn expire_at(mut self, at: DateTime<Utc>) -> Self {
        self.expire_at = Some(at);
        self
    }

    pub fn expire_after_secs(mut self, secs: i64) -> Self {
        self.expire_after_secs = Some(secs);
        self
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.format.is_none()
            && self.max_width.is_none()
            && self.max_height.is_none()
            && self.expire_at.is_none()
            && self.expire_after_secs.is_none()
    }
}

/// Options after merging with the URL and validation.
///
/// `None` for `format`/`max_width`/`max_height` means the parameter is absent
/// from the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub format: Option<ImageFormat>,
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    pub expire_at: Option<DateTime<Utc>>,
}

/// Merges `opts` with the parameters of the URL being formatted.
pub(crate) fn resolve(
    opts: &FormatOptions,
    existing: &QueryParams,
    now: DateTime<Utc>,
) -> Result<ResolvedOptions, FormatError> {
    let format = match opts.format.as_deref().or_else(|| existing.get("format")) {
        None | Some("") => None,
        Some(f) => Some(f.parse::<ImageFormat>()?),
    };

    let max_width = match opts.max_width {
        Some(w) => positive(w),
        None => embedded_dimension(existing, "maxWidth")?,
    };
    let max_height = match opts.max_height {
        Some(h) => positive(h),
        None => embedded_dimension(existing, "maxHeight")?,
    };

    let expire_at = match (opts.expire_after_secs, opts.expire_at) {
        (Some(secs), _) => Some(signable(expire_after(now, secs)?)?),
        (None, Some(at)) => Some(signable(at)?),
        (None, None) => match existing.get("timeExpired") {
            Some(raw) => Some(parse_embedded_time(raw)?),
            None => None,
        },
    };

    Ok(ResolvedOptions {
        format,
        max_width,
        max_height,
        expire_at,
    })
}

fn expire_after(now: DateTime<Utc>, secs: i64) -> Result<DateTime<Utc>, FormatError> {
    Duration::try_seconds(secs)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| FormatError::InvalidArgument(format!("expiry out of range ({}s)", secs)))
}

/// `timeExpired` is written as RFC 3339, which only has four-digit years.
fn signable(at: DateTime<Utc>) -> Result<DateTime<Utc>, FormatError> {
    if (0..=9999).contains(&at.year()) {
        Ok(at)
    } else {
        Err(FormatError::InvalidArgument(format!(
            "expiry must be between years 0000 and 9999 ({})",
            at.year()
        )))
    }
}

fn positive(n: i64) -> Option<u64> {
    if n > 0 {
        Some(n as u64)
    } else {
        None
    }
}

/// Reads an integer size from the URL; non-positive values count as absent.
fn embedded_dimension(existing: &QueryParams, key: &str) -> Result<Option<u64>, FormatError> {
    match existing.get(key) {
        None => Ok(None),
        Some(raw) => leading_int(raw).map(positive).ok_or_else(|| {
            FormatError::MalformedInput(format!("{} should be a number ({})", key, raw))
        }),
    }
}

/// Leading `[+-]digits` of `raw` after whitespace, ignoring any trailing
/// text: `200.5` and `200px` both read as 200.
fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let digits_from = usize::from(s.starts_with(['+', '-']));
    let digits_len = s[digits_from..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    s[..digits_from + digits_len].parse().ok()
}

fn parse_embedded_time(raw: &str) -> Result<DateTime<Utc>, FormatError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| {
            FormatError::MalformedInput(format!("timeExpired is not a valid timestamp ({})", raw))
        })
}

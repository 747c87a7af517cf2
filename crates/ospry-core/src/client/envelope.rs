//! JSON envelopes returned by the API.
//!
//! Success: `{"images": [ {...metadata...}, ... ]}`.
//! Failure: `{"error": {"httpStatusCode", "cause", "message", "docsUrl"}}`.
//! An upload may also succeed at the HTTP level while its single image entry
//! is itself `{"error": {...}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;
use crate::transport::HttpResponse;

/// Metadata for one stored image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub id: String,
    /// Public URL of the image; pass it to `format_url` or `download`.
    pub url: String,
    pub time_created: DateTime<Utc>,
    #[serde(default)]
    pub is_claimed: bool,
    #[serde(default)]
    pub is_private: bool,
    /// Remaining fields (filename, format, size, dimensions...) as sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceError {
    #[serde(default, deserialize_with = "de_status")]
    http_status_code: Option<u32>,
    #[serde(default)]
    cause: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    docs_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    images: Vec<serde_json::Value>,
    #[serde(default)]
    error: Option<ServiceError>,
}

/// Status codes arrive as numbers or numeric strings.
fn de_status<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        Some(serde_json::Value::Number(n)) => n.as_u64().map(|n| n as u32),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl ServiceError {
    fn into_api_error(self, fallback_status: u32) -> ApiError {
        let status = self.http_status_code.unwrap_or(fallback_status);
        if self.cause.as_deref() == Some("network-error") {
            return ApiError::Network(self.message.unwrap_or_else(|| "Network error.".into()));
        }
        ApiError::Service {
            cause: self.cause.unwrap_or_else(|| "internal-error".into()),
            message: self
                .message
                .unwrap_or_else(|| format!("request failed with HTTP {}", status)),
            status,
            docs_url: self.docs_url,
        }
    }
}

/// Parses an API response into the image entries it carries.
pub(crate) fn parse_images(resp: &HttpResponse) -> Result<Vec<ImageMetadata>, ApiError> {
    let env: Envelope = match serde_json::from_slice(&resp.body) {
        Ok(env) => env,
        Err(e) if resp.status != 200 => {
            return Err(ApiError::Service {
                cause: "internal-error".into(),
                message: format!("HTTP {} with unreadable body: {}", resp.status, e),
                status: resp.status,
                docs_url: None,
            })
        }
        Err(e) => return Err(ApiError::InvalidResponse(e.to_string())),
    };

    if resp.status != 200 {
        return Err(match env.error {
            Some(err) => err.into_api_error(resp.status),
            None => ApiError::Service {
                cause: "internal-error".into(),
                message: format!("request failed with HTTP {}", resp.status),
                status: resp.status,
                docs_url: None,
            },
        });
    }

    env.images.into_iter().map(parse_image).collect()
}

fn parse_image(v: serde_json::Value) -> Result<ImageMetadata, ApiError> {
    if let Some(err) = v.get("error") {
        let err: ServiceError = serde_json::from_value(err.clone())
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        return Err(err.into_api_error(200));
    }
    serde_json::from_value(v).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn resp(status: u32, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn parses_images_and_dates() {
        let body = r#"{"images":[{"id":"a1","url":"https://img.example/i/a1","timeCreated":"2014-05-06T07:08:09.123Z","isClaimed":true,"isPrivate":false,"filename":"cat.jpg","width":640}]}"#;
        let images = parse_images(&resp(200, body)).unwrap();
        assert_eq!(images.len(), 1);
        let img = &images[0];
        assert_eq!(img.id, "a1");
        assert!(img.is_claimed);
        assert!(!img.is_private);
        assert_eq!(
            img.time_created,
            Utc.with_ymd_and_hms(2014, 5, 6, 7, 8, 9).unwrap() + chrono::Duration::milliseconds(123)
        );
        assert_eq!(img.extra.get("filename").and_then(|v| v.as_str()), Some("cat.jpg"));
        assert_eq!(img.extra.get("width").and_then(|v| v.as_u64()), Some(640));
    }

    #[test]
    fn error_envelope_becomes_service_error() {
        let body = r#"{"error":{"httpStatusCode":"404","cause":"not-found","message":"Not found","docsUrl":"https://ospry.io/docs#not-found"}}"#;
        match parse_images(&resp(404, body)).unwrap_err() {
            ApiError::Service {
                cause,
                message,
                status,
                docs_url,
            } => {
                assert_eq!(cause, "not-found");
                assert_eq!(message, "Not found");
                assert_eq!(status, 404);
                assert_eq!(docs_url.as_deref(), Some("https://ospry.io/docs#not-found"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_json_error_body_keeps_status() {
        let err = parse_images(&resp(502, "<html>bad gateway</html>")).unwrap_err();
        assert_eq!(err.status_code(), Some(502));
    }

    #[test]
    fn non_json_success_body_is_invalid_response() {
        assert!(matches!(
            parse_images(&resp(200, "nope")),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn per_image_error_is_surfaced() {
        let body = r#"{"images":[{"error":{"httpStatusCode":400,"cause":"invalid-image","message":"Not an image"}}]}"#;
        let err = parse_images(&resp(200, body)).unwrap_err();
        assert_eq!(err.cause(), "invalid-image");
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn empty_success_has_no_images() {
        assert!(parse_images(&resp(200, "{}")).unwrap().is_empty());
    }
}

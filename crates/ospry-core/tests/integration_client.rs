//! Integration tests: the curl transport against a local HTTP server.
//!
//! Checks what actually goes over the wire (methods, query strings, basic
//! auth, JSON bodies) and how responses map to results and errors.

mod common;

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use ospry_core::control::AbortToken;
use ospry_core::retry::RetryPolicy;
use ospry_core::transport::{CurlOptions, CurlTransport};
use ospry_core::{ApiError, Client, FormatOptions};
use std::time::Duration;

const KEY: &str = "sk-test-integration";

const ONE_IMAGE: &str = r#"{"images":[{"id":"img1","url":"https://img.example/i/img1","timeCreated":"2014-06-01T12:00:00.000Z","isClaimed":false,"isPrivate":false,"filename":"cat.jpg"}]}"#;

fn client_for(base_url: &str) -> Client {
    let transport = Arc::new(CurlTransport::new(CurlOptions {
        connect_timeout: Duration::from_secs(5),
        timeout: Duration::from_secs(10),
        strict_ssl: true,
    }));
    Client::with_transport(KEY, &format!("{}/v1", base_url), transport)
        .unwrap()
        .with_retry(RetryPolicy::none())
}

#[test]
fn metadata_request_carries_ids_and_basic_auth() {
    let server = common::api_server::fixed(200, ONE_IMAGE);
    let images = client_for(&server.base_url)
        .get_metadata(&["img1", "img2"])
        .unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, "img1");
    assert_eq!(
        images[0].extra.get("filename").and_then(|v| v.as_str()),
        Some("cat.jpg")
    );

    let reqs = server.recorded();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].method, "GET");
    assert_eq!(reqs[0].target, "/v1/images?ids%5B%5D=img1&ids%5B%5D=img2");
    let expected_auth = format!("Basic {}", STANDARD.encode(format!("{}:", KEY)));
    assert_eq!(reqs[0].header("Authorization"), Some(expected_auth.as_str()));
}

#[test]
fn privacy_change_sends_put_with_json_patches() {
    let server = common::api_server::fixed(200, ONE_IMAGE);
    client_for(&server.base_url)
        .make_private(&["img1"])
        .unwrap();

    let reqs = server.recorded();
    assert_eq!(reqs[0].method, "PUT");
    assert_eq!(reqs[0].target, "/v1/images");
    assert_eq!(reqs[0].header("Content-Type"), Some("application/json"));
    assert_eq!(
        String::from_utf8(reqs[0].body.clone()).unwrap(),
        r#"[{"id":"img1","isPrivate":true}]"#
    );
}

#[test]
fn upload_posts_image_bytes() {
    let server = common::api_server::fixed(200, ONE_IMAGE);
    let body = b"\x89PNG\r\n\x1a\nfake".to_vec();
    let img = client_for(&server.base_url)
        .upload("cat.png", false, body.clone())
        .unwrap();
    assert_eq!(img.id, "img1");

    let reqs = server.recorded();
    assert_eq!(reqs[0].method, "POST");
    assert_eq!(reqs[0].target, "/v1/images?filename=cat.png&isPrivate=false");
    assert_eq!(reqs[0].header("Content-Type"), Some("image/jpeg"));
    assert_eq!(reqs[0].body, body);
}

#[test]
fn delete_sends_delete_with_ids() {
    let server = common::api_server::fixed(200, r#"{"images":[]}"#);
    client_for(&server.base_url).delete(&["a", "b"]).unwrap();
    let reqs = server.recorded();
    assert_eq!(reqs[0].method, "DELETE");
    assert_eq!(reqs[0].target, "/v1/images?ids%5B%5D=a&ids%5B%5D=b");
}

#[test]
fn error_envelope_is_returned_as_service_error() {
    let server = common::api_server::fixed(
        403,
        r#"{"error":{"httpStatusCode":403,"cause":"not-authorized","message":"Forbidden","docsUrl":"https://ospry.io/docs#not-authorized"}}"#,
    );
    let err = client_for(&server.base_url)
        .claim(&["img1"])
        .unwrap_err();
    assert_eq!(err.cause(), "not-authorized");
    assert_eq!(err.status_code(), Some(403));
    assert_eq!(err.docs_url(), "https://ospry.io/docs#not-authorized");
}

#[test]
fn download_streams_body_into_file() {
    let pixels: Vec<u8> = (0u8..=255).cycle().take(32 * 1024).collect();
    let served = pixels.clone();
    let server = common::api_server::start(move |_| (200, served.clone()));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("img.bin");
    let mut file = std::fs::File::create(&path).unwrap();
    let image_url = format!("{}/i/img1", server.base_url);
    let n = client_for(&server.base_url)
        .download(
            &image_url,
            &FormatOptions::new().max_width(100).format("jpg"),
            &mut file,
            &AbortToken::new(),
        )
        .unwrap();
    drop(file);

    assert_eq!(n, pixels.len() as u64);
    assert_eq!(std::fs::read(&path).unwrap(), pixels);
    assert_eq!(
        server.recorded()[0].target,
        "/i/img1?format=jpeg&maxWidth=100"
    );
}

#[test]
fn download_maps_error_statuses() {
    for status in [404u16, 403, 500] {
        let server = common::api_server::fixed(status, "{\"error\":{}}");
        let mut sink = Vec::new();
        let err = client_for(&server.base_url)
            .download(
                &format!("{}/i/x", server.base_url),
                &FormatOptions::new(),
                &mut sink,
                &AbortToken::new(),
            )
            .unwrap_err();
        let expected = match &err {
            ApiError::NotFound => status == 404,
            ApiError::NotAuthorized => status == 403,
            ApiError::Internal { status: s } => *s == 500 && status == 500,
            _ => false,
        };
        assert!(expected, "status {} gave {:?}", status, err);
        assert!(sink.is_empty(), "no body bytes on error status");
    }
}

#[test]
fn aborted_download_stops() {
    let server = common::api_server::fixed(200, "some image bytes");
    let token = AbortToken::new();
    token.abort();
    let err = client_for(&server.base_url)
        .download(
            &format!("{}/i/x", server.base_url),
            &FormatOptions::new(),
            &mut Vec::new(),
            &token,
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Aborted));
}

#[test]
fn unreachable_server_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = client_for(&format!("http://127.0.0.1:{}", port))
        .get_metadata(&["x"])
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.cause(), "network-error");
}

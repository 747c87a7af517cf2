//! libcurl-backed transport.
//!
//! Runs in the current thread; call from `spawn_blocking` if used from async
//! code.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::str;
use std::time::Duration;

use curl::easy::{Auth, Easy, List};

use super::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use crate::control::AbortToken;

const USER_AGENT: &str = concat!("ospry-rust/", env!("CARGO_PKG_VERSION"));

/// Per-handle curl settings.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Upper bound for a whole transfer.
    pub timeout: Duration,
    /// Verify TLS peer and host name.
    pub strict_ssl: bool,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
            strict_ssl: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

fn net(e: curl::Error) -> TransportError {
    TransportError::Network(e.to_string())
}

/// Status code from a `HTTP/x.y NNN reason` header line.
fn parse_status_line(data: &[u8]) -> Option<u32> {
    let line = str::from_utf8(data).ok()?;
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    fn easy(&self, url: &str) -> Result<Easy, TransportError> {
        let mut easy = Easy::new();
        easy.url(url).map_err(net)?;
        easy.useragent(USER_AGENT).map_err(net)?;
        easy.follow_location(true).map_err(net)?;
        easy.max_redirections(10).map_err(net)?;
        easy.connect_timeout(self.opts.connect_timeout).map_err(net)?;
        easy.timeout(self.opts.timeout).map_err(net)?;
        easy.ssl_verify_peer(self.opts.strict_ssl).map_err(net)?;
        easy.ssl_verify_host(self.opts.strict_ssl).map_err(net)?;
        Ok(easy)
    }
}

impl Transport for CurlTransport {
    fn request(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut easy = self.easy(&req.url)?;

        match req.method {
            Method::Get => {}
            Method::Post => easy.post(true).map_err(net)?,
            Method::Put | Method::Delete => {}
        }
        if let Some(body) = &req.body {
            easy.post_fields_copy(body).map_err(net)?;
        }
        // After post_fields_copy, which would otherwise force POST.
        if matches!(req.method, Method::Put | Method::Delete) {
            easy.custom_request(req.method.as_str()).map_err(net)?;
        }

        if !req.headers.is_empty() {
            let mut list = List::new();
            for (k, v) in &req.headers {
                list.append(&format!("{}: {}", k.trim(), v.trim())).map_err(net)?;
            }
            easy.http_headers(list).map_err(net)?;
        }
        if let Some((user, password)) = &req.auth {
            let mut auth = Auth::new();
            auth.basic(true);
            easy.http_auth(&auth).map_err(net)?;
            easy.username(user).map_err(net)?;
            easy.password(password).map_err(net)?;
        }

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(net)?;
            transfer.perform().map_err(net)?;
        }

        let status = easy.response_code().map_err(net)?;
        tracing::debug!(
            method = req.method.as_str(),
            url = %req.url,
            status,
            bytes = body.len(),
            "request finished"
        );
        Ok(HttpResponse { status, body })
    }

    fn download(
        &self,
        url: &str,
        sink: &mut dyn Write,
        abort: &AbortToken,
    ) -> Result<u64, TransportError> {
        let mut easy = self.easy(url)?;
        easy.progress(true).map_err(net)?;

        let status = Cell::new(0u32);
        let written = Cell::new(0u64);
        let stop: RefCell<Option<TransportError>> = RefCell::new(None);

        {
            let mut transfer = easy.transfer();
            // Redirects produce several status lines; the last one wins.
            transfer
                .header_function(|data| {
                    if let Some(code) = parse_status_line(data) {
                        status.set(code);
                    }
                    true
                })
                .map_err(net)?;
            transfer
                .progress_function(|_, _, _, _| !abort.is_aborted())
                .map_err(net)?;
            transfer
                .write_function(|data| {
                    if abort.is_aborted() {
                        *stop.borrow_mut() = Some(TransportError::Aborted);
                        return Ok(0);
                    }
                    let code = status.get();
                    if code != 200 {
                        *stop.borrow_mut() = Some(TransportError::Status(code));
                        return Ok(0);
                    }
                    match sink.write_all(data) {
                        Ok(()) => {
                            written.set(written.get() + data.len() as u64);
                            Ok(data.len())
                        }
                        Err(e) => {
                            *stop.borrow_mut() = Some(TransportError::Sink(e.to_string()));
                            Ok(0)
                        }
                    }
                })
                .map_err(net)?;

            if let Err(e) = transfer.perform() {
                if let Some(reason) = stop.borrow_mut().take() {
                    tracing::debug!(%reason, "download stopped");
                    return Err(reason);
                }
                if abort.is_aborted() {
                    return Err(TransportError::Aborted);
                }
                return Err(net(e));
            }
        }

        let code = easy.response_code().map_err(net)?;
        if code != 200 {
            return Err(TransportError::Status(code));
        }
        sink.flush()
            .map_err(|e| TransportError::Sink(e.to_string()))?;
        Ok(written.get())
    }
}

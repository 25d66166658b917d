//! Minimal HTTP/1.1 feed API server for integration tests.
//!
//! Serves the metadata endpoints (feed type, files listing, file metadata)
//! as fixed JSON fixtures and the download endpoint as range GETs over one
//! static archive body, with 206 + Content-Range semantics. Can demand an
//! authorization header and inject transient 503s to exercise retry.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

/// Fixture documents and the archive served by the download endpoint.
#[derive(Debug, Clone)]
pub struct FeedFixture {
    /// Bytes served by `/file/{id}/download` range requests.
    pub archive: Vec<u8>,
    /// JSON for `/feed_type/{type}`.
    pub feed_type_json: String,
    /// JSON for the `/file?feed_type_id=..` listing.
    pub files_json: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedServerOptions {
    /// Reject requests without an authorization header with 401.
    pub require_auth: bool,
    /// Respond 503 to this many download requests before serving normally.
    pub fail_first_downloads: u32,
}

/// Starts the server in background threads and returns its base URL
/// (e.g. `http://127.0.0.1:12345`), suitable for `FeedConfig::base_url`.
pub fn start(fixture: FeedFixture, opts: FeedServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let fixture = Arc::new(fixture);
    let failures_left = Arc::new(AtomicU32::new(opts.fail_first_downloads));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let fixture = Arc::clone(&fixture);
            let failures_left = Arc::clone(&failures_left);
            thread::spawn(move || handle(stream, &fixture, opts, &failures_left));
        }
    });
    format!("http://127.0.0.1:{port}")
}

fn handle(
    mut stream: std::net::TcpStream,
    fixture: &FeedFixture,
    opts: FeedServerOptions,
    failures_left: &AtomicU32,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let req = parse_request(request);

    if !req.method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\n\r\n");
        return;
    }
    if opts.require_auth && !req.has_auth {
        let _ = stream.write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let path = req.target.split('?').next().unwrap_or("");
    if path.ends_with("/download") && path.starts_with("/file/") {
        // Probe requests (bytes=0-100) are never failed, so the caller can
        // always plan; injected 503s hit the chunk fetches.
        let is_probe = req.range == Some((0, 100));
        if !is_probe
            && failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
                .is_ok()
        {
            let _ = stream.write_all(
                b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n",
            );
            return;
        }
        serve_range(&mut stream, &fixture.archive, req.range);
        return;
    }
    if path == "/feed_type" || path == "/feed_type/" {
        serve_json(&mut stream, &fixture.feed_type_json);
        return;
    }
    if path.starts_with("/feed_type/") {
        serve_json(&mut stream, &fixture.feed_type_json);
        return;
    }
    if path == "/file" {
        serve_json(&mut stream, &fixture.files_json);
        return;
    }
    if let Some(id) = path.strip_prefix("/file/") {
        let metadata = format!(
            r#"{{"fileId":"{}","size":{}}}"#,
            id,
            fixture.archive.len()
        );
        serve_json(&mut stream, &metadata);
        return;
    }
    let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
}

fn serve_json(stream: &mut std::net::TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body.as_bytes());
}

fn serve_range(stream: &mut std::net::TcpStream, body: &[u8], range: Option<(u64, u64)>) {
    let total = body.len() as u64;
    if total == 0 {
        // Degenerate empty resource: report a zero total so probes see it.
        let _ = stream.write_all(
            b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nContent-Range: bytes */0\r\n\r\n",
        );
        return;
    }
    let (status, range_header, slice) = match range {
        Some((start, end_incl)) => {
            let start = start.min(total);
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start > end_incl {
                (
                    "416 Range Not Satisfiable",
                    format!("bytes */{total}"),
                    &body[0..0],
                )
            } else {
                let s = start as usize;
                let e = (end_incl + 1) as usize;
                (
                    "206 Partial Content",
                    format!("bytes {}-{}/{}", start, end_incl, total),
                    &body[s..e],
                )
            }
        }
        None => (
            "200 OK",
            format!("bytes 0-{}/{}", total.saturating_sub(1), total),
            body,
        ),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\nAccept-Ranges: bytes\r\n\r\n",
        status,
        slice.len(),
        range_header
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
}

struct ParsedRequest<'a> {
    method: &'a str,
    target: &'a str,
    range: Option<(u64, u64)>,
    has_auth: bool,
}

/// Returns method, request target, optional `Range: bytes=X-Y` bounds, and
/// whether an authorization header was present.
fn parse_request(request: &str) -> ParsedRequest<'_> {
    let mut lines = request.lines();
    let mut parts = lines.next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");
    let mut range = None;
    let mut has_auth = false;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("authorization") {
                has_auth = value.to_ascii_lowercase().starts_with("bearer ");
            }
            if name.eq_ignore_ascii_case("range") {
                if let Some(spec) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = spec.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    ParsedRequest {
        method,
        target,
        range,
        has_auth,
    }
}

//! Development server for the generated site.
//!
//! Serves the output directory over HTTP on `127.0.0.1` so a build can be
//! browsed with the same URLs it will have when deployed:
//!
//! | Request | Served file |
//! |---------|-------------|
//! | `/` | `index.html` |
//! | `/blog/hello/` | `blog/hello/index.html` |
//! | `/style.css?v=2` | `style.css` |
//! | `/missing/` | `404.html` with status 404, or a plain 404 |
//!
//! Request paths are percent-decoded, and every part that is not a plain
//! path component (`..`, `.`, a drive prefix) is skipped, so a request never
//! resolves outside the served directory. The server blocks until the
//! process is interrupted.

use crate::page::is_plain_component;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server};

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Directory '{0}' does not exist, run 'simple-press build' first")]
    MissingDir(PathBuf),
    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serve `root` on `127.0.0.1:port` until the process is stopped.
pub fn serve(root: &Path, port: u16) -> Result<(), ServeError> {
    if !root.is_dir() {
        return Err(ServeError::MissingDir(root.to_path_buf()));
    }
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let server = Server::http(addr).map_err(|source| ServeError::Bind { addr, source })?;

    println!("==> Serving {}", root.display());
    println!("    http://localhost:{port}/");
    println!("    CTRL-C to stop");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, root) {
            tracing::warn!(error = %e, "request failed");
        }
    }
    Ok(())
}

// ============================================================================
// Request handling
// ============================================================================

fn handle_request(request: Request, root: &Path) -> Result<(), ServeError> {
    let url = request.url().to_string();
    let (status, file) = match resolve_request(root, &url) {
        Some(file) => (200, Some(file)),
        None => (404, Some(root.join("404.html")).filter(|p| p.is_file())),
    };

    let (body, mime) = match &file {
        Some(path) => (fs::read(path)?, content_type(path)),
        None => (b"404 Not Found".to_vec(), "text/plain; charset=utf-8"),
    };
    let mut response = Response::from_data(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes("Content-Type", mime) {
        response = response.with_header(header);
    }

    tracing::info!(method = %request.method(), url = %url, status, "served");
    request.respond(response)?;
    Ok(())
}

/// File under `root` answering the request `url`, or `None` for a miss.
///
/// Query string and fragment are ignored. A directory answers with its
/// `index.html`.
pub fn resolve_request(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).ok()?;

    let mut local = root.to_path_buf();
    for part in decoded.split('/').filter(|p| is_plain_component(p)) {
        local.push(part);
    }

    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    index.is_file().then_some(index)
}

/// MIME type from the file extension.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================

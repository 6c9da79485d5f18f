// src/serve/mod.rs

//! Dev server: static files from the serve root plus a live-reload channel.
//!
//! The server is deliberately small: one HTTP/1.1 GET handler per
//! connection on the tokio listener. Served HTML gets a script tag injected
//! that opens a server-sent-events stream; a `reload` event makes the
//! browser refresh.

pub mod reload;

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub use reload::ReloadHub;

/// Path of the event-stream endpoint browsers subscribe to.
pub const EVENTS_PATH: &str = "/__sitepipe/events";
/// Path of the injected client script.
pub const SCRIPT_PATH: &str = "/__sitepipe/reload.js";

const RELOAD_SNIPPET: &str = r#"<script src="/__sitepipe/reload.js"></script>"#;

const RELOAD_SCRIPT: &str = r#"(() => {
  const es = new EventSource("/__sitepipe/events");
  es.addEventListener("reload", () => location.reload());
})();
"#;

/// Handle to the running dev server.
#[derive(Debug)]
pub struct ServerHandle {
    pub addr: SocketAddr,
}

/// Bind the dev server and start serving `root` on the given port.
///
/// Binding failure is fatal and propagates; everything after that is
/// per-connection and merely logged. Pass port 0 to bind an ephemeral port
/// (the chosen one is in the returned handle).
pub async fn spawn_server(root: PathBuf, port: u16, hub: ReloadHub) -> Result<ServerHandle> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("binding dev server on port {port}"))?;
    let addr = listener.local_addr()?;

    info!(%addr, root = ?root, "dev server listening");

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "connection accepted");
                    let root = root.clone();
                    let hub = hub.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, &root, hub).await {
                            debug!(error = %err, "connection handler ended with error");
                        }
                    });
                }
                Err(err) => {
                    warn!(error = %err, "failed to accept connection");
                }
            }
        }
    });

    Ok(ServerHandle { addr })
}

async fn handle_connection(mut stream: TcpStream, root: &Path, hub: ReloadHub) -> Result<()> {
    let request_path = match read_request_path(&mut stream).await? {
        Some(path) => path,
        None => {
            write_simple(&mut stream, 405, "method not allowed").await?;
            return Ok(());
        }
    };

    match request_path.as_str() {
        EVENTS_PATH => serve_events(stream, hub.subscribe()).await,
        SCRIPT_PATH => {
            write_response(
                &mut stream,
                200,
                "application/javascript",
                RELOAD_SCRIPT.as_bytes(),
            )
            .await
        }
        _ => serve_file(&mut stream, root, &request_path).await,
    }
}

/// Read the request head and return the target path for GET requests, `None`
/// for other methods.
async fn read_request_path(stream: &mut TcpStream) -> Result<Option<String>> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    // Read until the end of the request head or a sane size cap.
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() > 8 * 1024 {
            break;
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let mut parts = head.lines().next().unwrap_or("").split_whitespace();

    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("/");

    if method != "GET" {
        return Ok(None);
    }

    // Drop any query string.
    let path = target.split('?').next().unwrap_or("/").to_string();
    Ok(Some(path))
}

async fn serve_file(stream: &mut TcpStream, root: &Path, request_path: &str) -> Result<()> {
    let Some(rel) = sanitize_path(request_path) else {
        write_simple(stream, 404, "not found").await?;
        return Ok(());
    };

    let mut path = root.join(rel);
    if path.is_dir() {
        path = path.join("index.html");
    }

    let body = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(_) => {
            debug!(path = ?path, "file not found");
            write_simple(stream, 404, "not found").await?;
            return Ok(());
        }
    };

    let content_type = content_type_for(&path);
    let body = if content_type == "text/html" {
        inject_reload_snippet(body)
    } else {
        body
    };

    write_response(stream, 200, content_type, &body).await
}

/// Stream server-sent events until the client goes away.
async fn serve_events(mut stream: TcpStream, mut rx: broadcast::Receiver<()>) -> Result<()> {
    stream
        .write_all(
            b"HTTP/1.1 200 OK\r\n\
              Content-Type: text/event-stream\r\n\
              Cache-Control: no-cache\r\n\
              Connection: keep-alive\r\n\r\n",
        )
        .await?;
    stream.flush().await?;

    loop {
        match rx.recv().await {
            Ok(()) => {
                if stream.write_all(b"event: reload\ndata: now\n\n").await.is_err() {
                    break;
                }
                if stream.flush().await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    Ok(())
}

/// Map a request path to a root-relative file path, rejecting anything that
/// would escape the docroot.
fn sanitize_path(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    let candidate = PathBuf::from(trimmed);

    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            _ => return None,
        }
    }

    Some(candidate)
}

/// Inject the live-reload script tag into an HTML body, before `</body>`
/// when present, appended otherwise.
fn inject_reload_snippet(body: Vec<u8>) -> Vec<u8> {
    let text = match String::from_utf8(body) {
        Ok(text) => text,
        Err(err) => return err.into_bytes(),
    };

    let injected = match text.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(text.len() + RELOAD_SNIPPET.len());
            out.push_str(&text[..idx]);
            out.push_str(RELOAD_SNIPPET);
            out.push_str(&text[idx..]);
            out
        }
        None => {
            let mut out = text;
            out.push_str(RELOAD_SNIPPET);
            out
        }
    };

    injected.into_bytes()
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

async fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<()> {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "OK",
    };

    let head = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        body.len()
    );

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}

async fn write_simple(stream: &mut TcpStream, status: u16, message: &str) -> Result<()> {
    write_response(stream, status, "text/plain", message.as_bytes()).await
}

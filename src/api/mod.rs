//! Request/response boundary.
//!
//! A small HTTP listener over plain TCP: summary runs on the configured
//! default input, uploaded-video analysis, and the annotated-video and CSV
//! artifacts. Requests are handled sequentially on one thread; the only
//! state kept between requests is the most recent completed run.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::config::FlockConfig;
use crate::error::PipelineError;
use crate::pipeline::{self, RunResult};
use crate::report;

const MAX_HEADER_BYTES: usize = 8192;
/// Upload cap for `/analyze-video` bodies.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;
/// Content types accepted for uploaded videos.
const ACCEPTED_UPLOAD_TYPES: &[&str] = &["video/mp4", "video/mov", "video/avi"];

pub struct ApiServer {
    cfg: FlockConfig,
}

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("api server thread panicked"))?;
        }
        Ok(())
    }
}

impl ApiServer {
    pub fn new(cfg: FlockConfig) -> Self {
        Self { cfg }
    }

    pub fn spawn(self) -> Result<ApiHandle> {
        let configured_addr: SocketAddr = self.cfg.api_addr.parse()?;
        let listener = TcpListener::bind(configured_addr)?;
        let addr = listener.local_addr()?;
        if configured_addr.ip().is_loopback() && !addr.ip().is_loopback() {
            return Err(anyhow!(
                "api configured for loopback address '{}', but bound to non-loopback address '{}'",
                configured_addr,
                addr
            ));
        }
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let cfg = self.cfg;
        let join = std::thread::spawn(move || {
            if let Err(err) = run_api(listener, cfg, shutdown_thread) {
                log::error!("flock api stopped: {}", err);
            }
        });

        Ok(ApiHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_api(listener: TcpListener, cfg: FlockConfig, shutdown: Arc<AtomicBool>) -> Result<()> {
    let mut last_run: Option<RunResult> = None;
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(err) = handle_connection(stream, &cfg, &mut last_run) {
                    log::warn!("flock api request failed: {}", err);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn handle_connection(
    mut stream: TcpStream,
    cfg: &FlockConfig,
    last_run: &mut Option<RunResult>,
) -> Result<()> {
    let request = read_request(&mut stream)?;
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") => write_json_response(
            &mut stream,
            200,
            r#"{"message":"flockwatch api running"}"#,
        ),
        ("GET", "/health") => write_json_response(&mut stream, 200, r#"{"status":"ok"}"#),
        ("GET", "/process-video") => {
            let input = cfg.input_uri.clone();
            let output = cfg.output_path.clone();
            respond_with_run(&mut stream, cfg, &input, &output, last_run)
        }
        ("POST", "/analyze-video") => handle_upload(&mut stream, cfg, &request, last_run),
        ("GET", "/download-video") => serve_file(
            &mut stream,
            Path::new(&cfg.output_path),
            "video/mp4",
            "processed_birds.mp4",
            "video_not_found",
        ),
        ("GET", "/download-csv") => serve_csv(&mut stream, cfg, last_run.as_ref()),
        ("GET", _) => write_json_response(&mut stream, 404, r#"{"error":"not_found"}"#),
        _ => write_json_response(&mut stream, 405, r#"{"error":"method_not_allowed"}"#),
    }
}

/// Run one pipeline and answer with the summary. A failed run leaves the
/// last completed result untouched.
fn respond_with_run(
    stream: &mut TcpStream,
    cfg: &FlockConfig,
    input_uri: &str,
    output_path: &str,
    last_run: &mut Option<RunResult>,
) -> Result<()> {
    match pipeline::process_video(cfg, input_uri, output_path) {
        Ok(result) => {
            let summary = report::summarize(input_uri, &result);
            let payload = serde_json::to_vec(&summary)?;
            *last_run = Some(result);
            write_response(stream, 200, "application/json", None, &payload)
        }
        Err(err @ PipelineError::SourceUnavailable { .. }) => {
            log::warn!("{}", err);
            write_json_response(stream, 404, r#"{"error":"source_not_found"}"#)
        }
        Err(err) => {
            log::error!("video run failed: {}", err);
            write_json_response(stream, 500, r#"{"error":"processing_failed"}"#)
        }
    }
}

fn handle_upload(
    stream: &mut TcpStream,
    cfg: &FlockConfig,
    request: &HttpRequest,
    last_run: &mut Option<RunResult>,
) -> Result<()> {
    let content_type = request
        .headers
        .get("content-type")
        .map(String::as_str)
        .unwrap_or("");
    if !ACCEPTED_UPLOAD_TYPES
        .iter()
        .any(|accepted| content_type.starts_with(accepted))
    {
        let err = PipelineError::UnsupportedMedia(content_type.to_string());
        log::warn!("{}", err);
        return write_json_response(stream, 415, r#"{"error":"unsupported_media_type"}"#);
    }
    if request.body.is_empty() {
        return write_json_response(stream, 400, r#"{"error":"empty_upload"}"#);
    }

    let upload_path = Path::new(&cfg.upload_path);
    if let Some(parent) = upload_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(upload_path, &request.body)?;
    log::info!(
        "stored {} uploaded bytes at {}",
        request.body.len(),
        upload_path.display()
    );

    let input = cfg.upload_path.clone();
    let output = cfg.upload_output_path.clone();
    respond_with_run(stream, cfg, &input, &output, last_run)
}

fn serve_csv(
    stream: &mut TcpStream,
    cfg: &FlockConfig,
    last_run: Option<&RunResult>,
) -> Result<()> {
    let Some(result) = last_run else {
        return write_json_response(stream, 404, r#"{"error":"report_not_found"}"#);
    };
    report::write_csv_report(Path::new(&cfg.report_path), result)?;
    serve_file(
        stream,
        Path::new(&cfg.report_path),
        "text/csv",
        "bird_weight_report.csv",
        "report_not_found",
    )
}

fn serve_file(
    stream: &mut TcpStream,
    path: &Path,
    content_type: &str,
    filename: &str,
    missing: &str,
) -> Result<()> {
    match std::fs::read(path) {
        Ok(bytes) => write_response(stream, 200, content_type, Some(filename), &bytes),
        Err(_) => {
            write_json_response(stream, 404, &format!(r#"{{"error":"{missing}"}}"#))
        }
    }
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut buf = [0u8; 8192];
    let mut data = Vec::new();
    let header_end = loop {
        if let Some(pos) = find_header_end(&data) {
            break pos;
        }
        if data.len() > MAX_HEADER_BYTES {
            return Err(anyhow!("request header too large"));
        }
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed before headers completed"));
        }
        data.extend_from_slice(&buf[..n]);
    };

    let header_text = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| anyhow!("missing method"))?
        .to_string();
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    if content_length > MAX_UPLOAD_BYTES {
        return Err(anyhow!("upload larger than {} bytes", MAX_UPLOAD_BYTES));
    }
    let mut body = data[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed mid-body"));
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn write_json_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    write_response(stream, status, "application/json", None, body.as_bytes())
}

fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    attachment: Option<&str>,
    body: &[u8],
) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        415 => "HTTP/1.1 415 Unsupported Media Type",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let mut header = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nCache-Control: no-store\r\n",
        status_line = status_line,
        content_type = content_type,
        len = body.len()
    );
    if let Some(filename) = attachment {
        header.push_str(&format!(
            "Content-Disposition: attachment; filename=\"{filename}\"\r\n"
        ));
    }
    header.push_str("\r\n");
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)?;
    Ok(())
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

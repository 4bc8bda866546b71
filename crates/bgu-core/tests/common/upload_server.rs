//! Minimal HTTP/1.1 server that accepts uploads for integration tests.
//!
//! Reads each request fully (headers plus `Content-Length` body), records it,
//! and answers with a fixed status and body.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct UploadServerOptions {
    pub status: u32,
    pub response_body: String,
}

impl Default for UploadServerOptions {
    fn default() -> Self {
        Self {
            status: 201,
            response_body: r#"{"ok":true}"#.to_string(),
        }
    }
}

pub struct UploadServer {
    pub url: String,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl UploadServer {
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start() -> UploadServer {
    start_with_options(UploadServerOptions::default())
}

pub fn start_with_options(opts: UploadServerOptions) -> UploadServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let log = Arc::clone(&log);
            let opts = opts.clone();
            thread::spawn(move || handle(stream, &log, &opts));
        }
    });
    UploadServer {
        url: format!("http://127.0.0.1:{}/upload", port),
        received,
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn handle(mut stream: TcpStream, log: &Mutex<Vec<ReceivedRequest>>, opts: &UploadServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));

    let mut data = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => data.extend_from_slice(&chunk[..n]),
        }
        if let Some(end) = find_header_end(&data) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }

    let count = {
        let mut log = log.lock().unwrap();
        log.push(ReceivedRequest {
            method,
            path,
            headers,
            body,
        });
        log.len()
    };

    let response = format!(
        "HTTP/1.1 {} Status\r\nContent-Length: {}\r\nContent-Type: application/json\r\nX-Request-Count: {}\r\nConnection: close\r\n\r\n{}",
        opts.status,
        opts.response_body.len(),
        count,
        opts.response_body
    );
    let _ = stream.write_all(response.as_bytes());
}

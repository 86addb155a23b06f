//! Shared utilities for integration testing.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt as _, Full};
use hyper::body::Bytes;
use hyper::http::response::Parts;
use hyper::http::Request;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use edgefront::logs::LogStore;
use edgefront::{EmulatorConfig, FunctionRegistry, HttpServer};

/// A raw-TCP mock origin serving one canned response per connection.
pub struct MockOrigin {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicU32>,
    /// Raw request text as received, one entry per connection.
    pub requests: Arc<Mutex<Vec<String>>>,
}

/// Start a mock origin on an OS-assigned port.
pub async fn start_mock_origin(raw_response: Vec<u8>) -> MockOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let task_hits = Arc::clone(&hits);
    let task_requests = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    task_hits.fetch_add(1, Ordering::SeqCst);
                    let raw = raw_response.clone();
                    let requests = Arc::clone(&task_requests);
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 16 * 1024];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        requests
                            .lock()
                            .unwrap()
                            .push(String::from_utf8_lossy(&buf[..n]).to_string());
                        let _ = socket.write_all(&raw).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockOrigin {
        addr,
        hits,
        requests,
    }
}

/// Assemble a raw HTTP/1.1 response with Content-Length and close semantics.
pub fn http_response(status_line: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut raw = format!("HTTP/1.1 {status_line}\r\n").into_bytes();
    for (name, value) in headers {
        raw.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    raw.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    raw.extend_from_slice(b"Connection: close\r\n\r\n");
    raw.extend_from_slice(body);
    raw
}

/// Start the emulator on an OS-assigned port and return its address.
pub async fn start_emulator(
    config: EmulatorConfig,
    registry: FunctionRegistry,
    store: Arc<LogStore>,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(Arc::new(config), Arc::new(registry), store);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    addr
}

/// Issue one request against the emulator with an explicit Host header.
pub async fn send(addr: SocketAddr, host: &str, path: &str) -> (Parts, Vec<u8>) {
    send_with_headers(addr, host, path, &[]).await
}

pub async fn send_with_headers(
    addr: SocketAddr,
    host: &str,
    path: &str,
    headers: &[(&str, &str)],
) -> (Parts, Vec<u8>) {
    let client: Client<HttpConnector, Full<Bytes>> =
        Client::builder(TokioExecutor::new()).build_http();

    let mut builder = Request::builder()
        .method("GET")
        .uri(format!("http://{addr}{path}"))
        .header("host", host);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Full::default()).unwrap();

    let response = client.request(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    (parts, bytes.to_vec())
}

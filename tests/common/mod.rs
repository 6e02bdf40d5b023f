//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Programmable stand-in for the node agent running next to a database server.
#[derive(Default)]
pub struct AgentBehavior {
    /// Status returned by `/health`; 0 means 200.
    pub health_status: AtomicU16,
    /// Close connections without answering.
    pub silent: AtomicBool,
    pub in_recovery: AtomicBool,
    /// Whether `/promote` takes the server out of recovery.
    pub promote_succeeds: AtomicBool,
    pub sync_names: Mutex<String>,
    pub promote_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
}

impl AgentBehavior {
    pub fn primary(sync_names: &str) -> Arc<Self> {
        let behavior = Self::default();
        *behavior.sync_names.lock().unwrap() = sync_names.to_string();
        Arc::new(behavior)
    }

    pub fn replica() -> Arc<Self> {
        let behavior = Self::default();
        behavior.in_recovery.store(true, Ordering::SeqCst);
        behavior.promote_succeeds.store(true, Ordering::SeqCst);
        Arc::new(behavior)
    }

    pub fn fail_health(&self, status: u16) {
        self.health_status.store(status, Ordering::SeqCst);
    }

    pub fn promotions(&self) -> usize {
        self.promote_calls.load(Ordering::SeqCst)
    }

    fn respond(&self, method: &str, path: &str) -> (u16, String) {
        match (method, path) {
            ("GET", "/health") => {
                self.health_calls.fetch_add(1, Ordering::SeqCst);
                match self.health_status.load(Ordering::SeqCst) {
                    0 => (200, "ok".to_string()),
                    status => (status, "down".to_string()),
                }
            }
            ("POST", "/promote") => {
                self.promote_calls.fetch_add(1, Ordering::SeqCst);
                if self.promote_succeeds.load(Ordering::SeqCst) {
                    self.in_recovery.store(false, Ordering::SeqCst);
                }
                (200, "{}".to_string())
            }
            ("GET", "/recovery") => (
                200,
                format!("{{\"in_recovery\":{}}}", self.in_recovery.load(Ordering::SeqCst)),
            ),
            ("GET", "/replication/synchronous_standby_names") => {
                let value = self.sync_names.lock().unwrap().clone();
                (200, serde_json::json!({ "value": value }).to_string())
            }
            _ => (404, "not found".to_string()),
        }
    }
}

/// Start a mock agent on an ephemeral port and return its address.
pub async fn start_mock_agent(behavior: Arc<AgentBehavior>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let behavior = behavior.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let mut read = 0;
                        while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf[read..]).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => read += n,
                            }
                            if read == buf.len() {
                                return;
                            }
                        }

                        if behavior.silent.load(Ordering::SeqCst) {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                            return;
                        }

                        let head = String::from_utf8_lossy(&buf[..read]);
                        let mut parts = head.lines().next().unwrap_or_default().split_whitespace();
                        let method = parts.next().unwrap_or_default().to_string();
                        let path = parts.next().unwrap_or_default().to_string();

                        let (status, body) = behavior.respond(&method, &path);
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "500 Internal Server Error",
                        };
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Poll `check` until it holds or `limit` passes.
pub async fn eventually<F: Fn() -> bool>(limit: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}

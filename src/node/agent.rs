//! HTTP client for the per-host node agent.
//!
//! Agent endpoints:
//! - `GET /health` liveness query
//! - `POST /promote` promote the local server
//! - `GET /recovery` → `{"in_recovery": bool}`
//! - `GET /replication/synchronous_standby_names` → `{"value": "..."}`

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;
use url::Url;

use crate::error::{Error, Result};
use crate::node::{deadline_after, NodeClient, ProbeOutcome};

pub const HEALTH_PATH: &str = "/health";
pub const PROMOTE_PATH: &str = "/promote";
pub const RECOVERY_PATH: &str = "/recovery";
pub const SYNC_NAMES_PATH: &str = "/replication/synchronous_standby_names";

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct RecoveryStatus {
    in_recovery: bool,
}

#[derive(Debug, Deserialize)]
struct SettingValue {
    value: String,
}

/// Talks to node agents over plain HTTP/1.1, one connection per call.
#[derive(Debug, Clone)]
pub struct AgentClient {
    request_timeout: Duration,
}

impl AgentClient {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    /// Resolve a target (`host:port` or `http://host:port`) to its authority.
    pub fn authority(target: &str) -> Result<String> {
        let candidate = if target.contains("://") {
            target.to_string()
        } else {
            format!("http://{}", target)
        };
        let url = Url::parse(&candidate).map_err(|_| Error::InvalidTarget(target.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidTarget(target.to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidTarget(target.to_string()))?;
        Ok(format!("{}:{}", host, port))
    }

    /// Run one request over an already connected stream.
    async fn exchange(
        stream: TcpStream,
        authority: &str,
        method: Method,
        path: &str,
    ) -> std::result::Result<(StatusCode, Bytes), String> {
        let (mut sender, conn) = hyper::client::conn::http1::handshake::<_, Body>(TokioIo::new(stream))
            .await
            .map_err(|e| e.to_string())?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "Agent connection closed with error");
            }
        });

        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, authority)
            .header(header::USER_AGENT, "failover-keeper")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = sender.send_request(request).await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body = axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
            .await
            .map_err(|e| e.to_string())?;
        Ok((status, body))
    }

    async fn call(&self, target: &str, method: Method, path: &str) -> Result<Bytes> {
        let authority = Self::authority(target)?;
        let attempt = async {
            let stream = TcpStream::connect(authority.as_str())
                .await
                .map_err(|e| format!("connect failed: {}", e))?;
            Self::exchange(stream, &authority, method, path).await
        };

        let (status, body) = match time::timeout(self.request_timeout, attempt).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(reason)) => return Err(Error::transport(target, reason)),
            Err(_) => return Err(Error::transport(target, "timed out")),
        };

        if !status.is_success() {
            return Err(Error::transport(target, format!("{} returned {}", path, status)));
        }
        Ok(body)
    }
}

impl Default for AgentClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl NodeClient for AgentClient {
    async fn probe(&self, target: &str, timeout: Duration) -> ProbeOutcome {
        let deadline = deadline_after(timeout);

        let authority = match Self::authority(target) {
            Ok(authority) => authority,
            Err(e) => {
                tracing::debug!(target = %target, error = %e, "Probe target is not an address");
                return ProbeOutcome::Unreachable;
            }
        };

        let stream = match time::timeout_at(deadline, TcpStream::connect(authority.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::debug!(target = %target, error = %e, "Probe connect failed");
                return ProbeOutcome::Unreachable;
            }
            Err(_) => return ProbeOutcome::Unreachable,
        };

        match time::timeout_at(deadline, Self::exchange(stream, &authority, Method::GET, HEALTH_PATH)).await {
            Ok(Ok((status, _))) if status.is_success() => ProbeOutcome::Alive,
            Ok(Ok((status, _))) => {
                tracing::debug!(target = %target, status = %status, "Liveness query rejected");
                ProbeOutcome::QueryFailed
            }
            Ok(Err(reason)) => {
                tracing::debug!(target = %target, error = %reason, "Liveness query failed");
                ProbeOutcome::QueryFailed
            }
            Err(_) => ProbeOutcome::QueryFailed,
        }
    }

    async fn promote(&self, target: &str) -> Result<()> {
        self.call(target, Method::POST, PROMOTE_PATH).await?;
        Ok(())
    }

    async fn is_in_recovery(&self, target: &str) -> Result<bool> {
        let body = self.call(target, Method::GET, RECOVERY_PATH).await?;
        let status: RecoveryStatus = serde_json::from_slice(&body)?;
        Ok(status.in_recovery)
    }

    async fn synchronous_standby_names(&self, target: &str) -> Result<String> {
        let body = self.call(target, Method::GET, SYNC_NAMES_PATH).await?;
        let setting: SettingValue = serde_json::from_slice(&body)?;
        Ok(setting.value)
    }
}

//! hyper-backed engine client.
//!
//! Opens one HTTP/1.1 connection per call (the engine is local and calls
//! are rare: a handful per session start), bounded by a per-request
//! timeout.

use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::api::{EngineApi, EngineFuture};
use crate::endpoint::EngineEndpoint;
use crate::error::{EngineError, EngineResult};
use crate::wire::{ContainerConfig, ContainerSummary, CreatedContainer, EngineInfo, ErrorBody};

const USER_AGENT_VALUE: &str = "swarmspawn/0.1";

/// Client for the engine's REST API.
#[derive(Debug, Clone)]
pub struct EngineClient {
    endpoint: EngineEndpoint,
    timeout: Duration,
}

impl EngineClient {
    pub fn new(endpoint: EngineEndpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// Parse `tcp://host:port` / `unix:///path` and build a client.
    pub fn from_url(url: &str, timeout: Duration) -> EngineResult<Self> {
        Ok(Self::new(url.parse()?, timeout))
    }

    pub fn endpoint(&self) -> &EngineEndpoint {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let (status, body) = self.call(Method::GET, path, None).await?;
        check_status(status, &body, path)?;
        serde_json::from_slice(&body).map_err(|e| EngineError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Perform one request, bounded by the client timeout.
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> EngineResult<(StatusCode, Bytes)> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.exchange(method.clone(), path, body)).await;

        match result {
            Ok(Ok((status, bytes))) => {
                debug!(
                    %method,
                    path,
                    status = status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "engine request"
                );
                Ok((status, bytes))
            }
            Ok(Err(e)) => {
                debug!(%method, path, error = %e, "engine request failed");
                Err(e)
            }
            Err(_) => {
                debug!(%method, path, "engine request timed out");
                Err(EngineError::Timeout {
                    path: path.to_string(),
                    after: self.timeout,
                })
            }
        }
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> EngineResult<(StatusCode, Bytes)> {
        let req = self.build_request(method, path, body)?;

        match &self.endpoint {
            EngineEndpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr.as_str())
                    .await
                    .map_err(|e| EngineError::Connect {
                        endpoint: self.endpoint.to_string(),
                        reason: e.to_string(),
                    })?;
                send(stream, req, path).await
            }
            #[cfg(unix)]
            EngineEndpoint::Unix(socket) => {
                let stream = tokio::net::UnixStream::connect(socket)
                    .await
                    .map_err(|e| EngineError::Connect {
                        endpoint: self.endpoint.to_string(),
                        reason: e.to_string(),
                    })?;
                send(stream, req, path).await
            }
            #[cfg(not(unix))]
            EngineEndpoint::Unix(_) => Err(EngineError::InvalidEndpoint(format!(
                "{} (unix sockets unsupported on this platform)",
                self.endpoint
            ))),
        }
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> EngineResult<Request<Full<Bytes>>> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, self.endpoint.host_header())
            .header(USER_AGENT, USER_AGENT_VALUE);
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }

        builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| EngineError::Request {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Drive one request over an established stream and collect the body.
async fn send<S>(stream: S, req: Request<Full<Bytes>>, path: &str) -> EngineResult<(StatusCode, Bytes)>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let request_err = |e: hyper::Error| EngineError::Request {
        path: path.to_string(),
        reason: e.to_string(),
    };

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(request_err)?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "engine connection closed with error");
        }
    });

    let resp = sender.send_request(req).await.map_err(request_err)?;
    let status = resp.status();
    let body = resp.into_body().collect().await.map_err(request_err)?.to_bytes();
    Ok((status, body))
}

/// Map a non-2xx status to an error carrying the engine's message.
fn check_status(status: StatusCode, body: &[u8], path: &str) -> EngineResult<()> {
    if status.is_success() {
        return Ok(());
    }

    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
    let message = if message.is_empty() {
        format!("{path}: {status}")
    } else {
        message
    };

    if status == StatusCode::NOT_FOUND {
        Err(EngineError::NotFound(message))
    } else {
        Err(EngineError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Percent-encode a path segment or query value.
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

impl EngineApi for EngineClient {
    fn info(&self) -> EngineFuture<'_, EngineInfo> {
        Box::pin(self.get_json("/info"))
    }

    fn list_containers(&self) -> EngineFuture<'_, Vec<ContainerSummary>> {
        Box::pin(self.get_json("/containers/json?all=1"))
    }

    fn create_container<'a>(
        &'a self,
        name: &'a str,
        config: &'a ContainerConfig,
    ) -> EngineFuture<'a, CreatedContainer> {
        Box::pin(async move {
            let path = format!("/containers/create?name={}", encode(name));
            let body = serde_json::to_vec(config).map_err(|e| EngineError::Encode(e.to_string()))?;
            let (status, bytes) = self.call(Method::POST, &path, Some(body)).await?;
            check_status(status, &bytes, &path)?;
            serde_json::from_slice(&bytes).map_err(|e| EngineError::Decode {
                path,
                reason: e.to_string(),
            })
        })
    }

    fn start_container<'a>(&'a self, id: &'a str) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            let path = format!("/containers/{}/start", encode(id));
            let (status, bytes) = self.call(Method::POST, &path, None).await?;
            if status == StatusCode::NOT_MODIFIED {
                return Ok(());
            }
            check_status(status, &bytes, &path)
        })
    }

    fn stop_container<'a>(&'a self, id: &'a str, grace: Duration) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            let path = format!("/containers/{}/stop?t={}", encode(id), grace.as_secs());
            let (status, bytes) = self.call(Method::POST, &path, None).await?;
            if status == StatusCode::NOT_MODIFIED {
                return Ok(());
            }
            check_status(status, &bytes, &path)
        })
    }

    fn remove_container<'a>(&'a self, id: &'a str) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            let path = format!("/containers/{}?force=1", encode(id));
            let (status, bytes) = self.call(Method::DELETE, &path, None).await?;
            check_status(status, &bytes, &path)
        })
    }
}

//! Outbound transport: the shared, pooled upstream HTTP client.
//!
//! # Responsibilities
//! - Own the upstream connection pool (idle limits, idle expiry)
//! - Cap concurrent upstream exchanges at `max_connections`
//! - Issue one request and hand back status, headers and a lazy body
//! - Classify failures (connect, timeout, protocol) for the engine
//!
//! # Design Decisions
//! - `Transport` is a trait so the forwarding engine can run against a spy
//! - The request target is an `http::Uri` and goes on the wire as written
//! - Redirects are relayed, not followed; environment proxies are ignored
//! - Compressed bodies are decoded here, so the relay never forwards
//!   `content-encoding` for bytes it has already decoded
//! - A connection slot is held until the body stream ends or is dropped

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, StreamExt};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tower::ServiceExt;
use tower_http::decompression::{Decompression, DecompressionBody};

use crate::config::ProxyConfig;
use crate::resilience::timeouts::{with_deadline, Elapsed, Stage};

/// Lazily produced upstream body chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

type UpstreamClient = Decompression<Client<HttpsConnector<HttpConnector>, Body>>;

/// Transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error(transparent)]
    Timeout(#[from] Elapsed),

    #[error("request failed: {0}")]
    Request(String),

    #[error("body read failed: {0}")]
    Body(String),

    #[error("connection pool is closed")]
    PoolClosed,

    #[error("transport setup failed: {0}")]
    Build(String),
}

impl TransportError {
    /// True for failures caused by the upstream or the network, as opposed
    /// to failures in building the client or the request.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, TransportError::Build(_) | TransportError::PoolClosed)
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Connect(_) => "connect",
            TransportError::Timeout(_) => "timeout",
            TransportError::Request(_) => "request",
            TransportError::Body(_) => "body",
            TransportError::PoolClosed => "pool_closed",
            TransportError::Build(_) => "build",
        }
    }

    fn from_client(err: hyper_util::client::legacy::Error) -> Self {
        if err.is_connect() {
            TransportError::Connect(describe(&err))
        } else {
            TransportError::Request(describe(&err))
        }
    }
}

/// Flatten an error and its sources into one line, e.g.
/// `client error (Connect): tcp connect error: Connection refused`.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// A request ready to go upstream. Headers are already sanitized and the
/// body is forwarded as-is.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The upstream's answer: status and headers are complete, the body is not.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends forwarded requests upstream. Implementations must be safe to share
/// between any number of concurrently running forwards.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>>;
}

/// Pool and timeout settings for the outbound client.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Deadline for each wait (connect, pool slot, response head, body read).
    pub timeout: Duration,
    /// Maximum concurrent upstream exchanges.
    pub max_connections: usize,
    /// Maximum idle connections kept per upstream host.
    pub max_keepalive_connections: usize,
    /// How long an idle connection is kept.
    pub keepalive_expiry: Duration,
}

impl TransportConfig {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            max_connections: config.pool.max_connections,
            max_keepalive_connections: config.pool.max_keepalive_connections,
            keepalive_expiry: config.keepalive_expiry(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}

/// The production transport: a pooled hyper client speaking http and https.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: UpstreamClient,
    slots: Arc<Semaphore>,
    timeout: Duration,
}

impl HttpTransport {
    /// Build the client and its pool.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(Some(config.timeout));

        let https = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config()?)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.max_keepalive_connections)
            .pool_idle_timeout(config.keepalive_expiry)
            .pool_timer(TokioTimer::new())
            .build(https);

        let max_connections = config.max_connections.min(Semaphore::MAX_PERMITS);

        tracing::info!(
            max_connections,
            max_keepalive_connections = config.max_keepalive_connections,
            keepalive_expiry = ?config.keepalive_expiry,
            timeout = ?config.timeout,
            "Upstream client created"
        );

        Ok(Self {
            client: Decompression::new(client),
            slots: Arc::new(Semaphore::new(max_connections)),
            timeout: config.timeout,
        })
    }

    async fn exchange(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        let slot = with_deadline(Stage::Pool, self.timeout, self.slots.clone().acquire_owned())
            .await?
            .map_err(|_| TransportError::PoolClosed)?;

        let mut outbound = Request::new(Body::from(request.body));
        *outbound.method_mut() = request.method;
        *outbound.uri_mut() = request.uri;
        *outbound.headers_mut() = request.headers;

        let pending = self.client.clone().oneshot(outbound);
        let response = with_deadline(Stage::Response, self.timeout, pending)
            .await?
            .map_err(TransportError::from_client)?;

        let (parts, body) = response.into_parts();
        Ok(UpstreamResponse {
            status: parts.status,
            headers: parts.headers,
            body: read_body(body, self.timeout, slot),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
        Box::pin(self.exchange(request))
    }
}

/// Client TLS settings: ring crypto and the bundled webpki root store.
fn tls_config() -> Result<rustls::ClientConfig, TransportError> {
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| TransportError::Build(describe(&e)))?
    .with_root_certificates(roots)
    .with_no_client_auth();
    Ok(config)
}

/// Chunks of `body` as they arrive, each read bounded by `read_timeout`.
/// The connection slot lives in the stream state and is dropped with it.
fn read_body(
    body: DecompressionBody<Incoming>,
    read_timeout: Duration,
    slot: OwnedSemaphorePermit,
) -> BodyStream {
    let chunks = Body::new(body).into_data_stream().boxed();
    stream::unfold(Some((chunks, slot)), move |state| async move {
        let (mut chunks, slot) = match state {
            Some(state) => state,
            None => return None,
        };
        match with_deadline(Stage::Read, read_timeout, chunks.next()).await {
            Ok(Some(Ok(bytes))) => Some((Ok(bytes), Some((chunks, slot)))),
            Ok(Some(Err(e))) => Some((Err(TransportError::Body(describe(&e))), None)),
            Ok(None) => None,
            Err(elapsed) => Some((Err(TransportError::Timeout(elapsed)), None)),
        }
    })
    .boxed()
}

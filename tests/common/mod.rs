//! Shared utilities for integration tests: a stub upstream and a running proxy.
#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;

use httpkit_proxy::config::ProxyConfig;
use httpkit_proxy::http::HttpServer;
use httpkit_proxy::lifecycle::ProxyContext;

/// Knobs shared between a test and its stub upstream.
pub struct UpstreamState {
    /// Requests that reached `/gate`.
    pub arrivals: AtomicUsize,
    /// `/gate` answers once per permit added here.
    pub gate: Semaphore,
    /// `/stream` sends its second chunk once a permit is added here.
    pub stream_gate: Semaphore,
}

impl UpstreamState {
    fn new() -> Self {
        Self {
            arrivals: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            stream_gate: Semaphore::new(0),
        }
    }
}

pub struct Upstream {
    pub addr: SocketAddr,
    pub state: Arc<UpstreamState>,
}

impl Upstream {
    pub fn arrivals(&self) -> usize {
        self.state.arrivals.load(Ordering::SeqCst)
    }
}

/// Start a stub upstream on an ephemeral port.
///
/// Routes:
/// - `GET /health` → `{"status":"healthy"}`
/// - `POST /echo` → `{"echo": <request json>}`
/// - `GET /headers` → `{"headers": {name: value}}`
/// - `POST|PUT /raw` → request body verbatim
/// - `GET /inspect/{*rest}` → `{"path": raw path, "query": raw query}`
/// - `GET /identity` → sets `server` and `x-upstream`
/// - `GET /gate` → waits for a permit on `gate`
/// - `GET /stream` → one chunk now, one after a permit on `stream_gate`
/// - `GET /moved` → 302 to `/health`
pub async fn start_upstream() -> Upstream {
    let state = Arc::new(UpstreamState::new());
    let app = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .route("/echo", post(|Json(body): Json<Value>| async move { Json(json!({ "echo": body })) }))
        .route("/headers", get(headers))
        .route("/raw", post(raw).put(raw))
        .route("/inspect/{*rest}", get(inspect))
        .route(
            "/identity",
            get(|| async { ([("server", "stub/1.0"), ("x-upstream", "yes")], "identity") }),
        )
        .route("/gate", get(gate))
        .route("/stream", get(streamed))
        .route(
            "/moved",
            get(|| async { (StatusCode::FOUND, [("location", "/health")]) }),
        )
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Upstream { addr, state }
}

async fn headers(headers: HeaderMap) -> Json<Value> {
    let map: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    Json(json!({ "headers": map }))
}

async fn raw(body: Bytes) -> Bytes {
    body
}

async fn inspect(uri: Uri) -> Json<Value> {
    Json(json!({ "path": uri.path(), "query": uri.query() }))
}

async fn gate(State(state): State<Arc<UpstreamState>>) -> &'static str {
    state.arrivals.fetch_add(1, Ordering::SeqCst);
    state.gate.acquire().await.unwrap().forget();
    "released"
}

async fn streamed(State(state): State<Arc<UpstreamState>>) -> Body {
    let first = stream::once(async { Ok::<_, Infallible>(Bytes::from_static(b"first;")) });
    let rest = stream::once(async move {
        state.stream_gate.acquire().await.unwrap().forget();
        Ok(Bytes::from_static(b"rest"))
    });
    Body::from_stream(first.chain(rest))
}

/// A proxy running on an ephemeral port.
pub struct Proxy {
    pub addr: SocketAddr,
    pub context: Arc<ProxyContext>,
    /// Sending (or dropping) this stops the server.
    pub shutdown: oneshot::Sender<()>,
    pub handle: JoinHandle<Result<(), httpkit_proxy::http::ServerError>>,
}

impl Proxy {
    /// URL of `/proxy/{target}` on this proxy.
    pub fn url(&self, target: &str) -> String {
        format!("http://{}/proxy/{}", self.addr, target)
    }
}

/// Start the proxy with `config`, listening on 127.0.0.1 with a free port.
pub async fn start_proxy(config: ProxyConfig) -> Proxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(&config);
    let context = server.context().clone();
    let (shutdown, stopped) = oneshot::channel();
    let handle = tokio::spawn(server.run(listener, async move {
        let _ = stopped.await;
    }));

    Proxy {
        addr,
        context,
        shutdown,
        handle,
    }
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Send `GET /proxy/{target}` over a bare socket, byte for byte as written,
/// and return the status line with the JSON body. HTTP client libraries
/// normalize request targets, so this bypasses them.
pub async fn raw_get(proxy: &Proxy, target: &str) -> (String, Value) {
    let mut stream = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!(
        "GET /proxy/{target} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        proxy.addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();
    let (head, body) = text.split_once("\r\n\r\n").unwrap();

    // the relayed body is chunked; the JSON sits between the size lines
    let start = body.find('{').unwrap();
    let end = body.rfind('}').unwrap();
    let json = serde_json::from_str(&body[start..=end]).unwrap();
    (head.lines().next().unwrap().to_string(), json)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

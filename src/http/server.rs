//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `GET /` and `/proxy/{*target}`
//! - Wire up middleware (request ID, tracing, panic recovery)
//! - Bind the server to a listener and drain it on shutdown
//! - Initialize forwarding resources before accepting, detach them after

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::response::welcome;
use crate::lifecycle::context::ProxyContext;
use crate::net::transport::TransportError;
use crate::observability::metrics;
use crate::proxy::engine::{ForwardingEngine, InboundRequest};
use crate::proxy::error::ForwardError;

/// Failures that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to initialize forwarding resources: {0}")]
    Init(#[from] TransportError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: ForwardingEngine,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
    context: Arc<ProxyContext>,
}

impl HttpServer {
    /// Create a server whose forwards use the pooled HTTP transport.
    pub fn new(config: &ProxyConfig) -> Self {
        Self::with_context(Arc::new(ProxyContext::new(config)))
    }

    pub fn with_context(context: Arc<ProxyContext>) -> Self {
        let state = AppState {
            engine: ForwardingEngine::new(context.clone()),
        };
        Self {
            router: Self::build_router(state),
            context,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(welcome))
            .route(
                "/proxy/{*target}",
                get(forward_handler)
                    .post(forward_handler)
                    .put(forward_handler)
                    .delete(forward_handler)
                    .patch(forward_handler)
                    .options(forward_handler),
            )
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CatchPanicLayer::custom(handle_panic)),
            )
    }

    /// Run the server until `shutdown` resolves, then drain open requests.
    /// `main` passes the OS signal future; tests pass a channel.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        self.context.init().await?;

        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        self.context.shutdown();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn context(&self) -> &Arc<ProxyContext> {
        &self.context
    }
}

async fn forward_handler(State(state): State<AppState>, inbound: InboundRequest) -> Response {
    let start = Instant::now();
    let method = inbound.method.clone();

    let response = match state.engine.forward(inbound).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
        client = %client,
    )
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    ForwardError::Internal(detail).into_response()
}

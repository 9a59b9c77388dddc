//! The forwarding engine: one inbound request in, one streamed response out.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → Target::resolve          (400 here never touches admission or network)
//!     → sanitize request headers, read body
//!     → ProxyContext::resources  (lazy init)
//!     → AdmissionController::acquire
//!     → Transport::send          (502 / 500 on failure, permit released)
//!     → sanitize response headers
//!     → Relay                    (permit released when the body ends or drops)
//! ```

use axum::body::Body;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use std::sync::Arc;
use std::time::Instant;

use crate::lifecycle::context::ProxyContext;
use crate::net::transport::OutboundRequest;
use crate::observability::metrics;
use crate::proxy::error::ForwardError;
use crate::proxy::relay::Relay;
use crate::proxy::target::Target;
use crate::security::headers::{sanitize_request_headers, sanitize_response_headers};

/// A request as received by the proxy route.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    /// Raw path after `/proxy/`, still percent-encoded.
    pub target: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Body,
}

/// Executes forwards against a shared [`ProxyContext`].
#[derive(Clone)]
pub struct ForwardingEngine {
    context: Arc<ProxyContext>,
}

impl ForwardingEngine {
    pub fn new(context: Arc<ProxyContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<ProxyContext> {
        &self.context
    }

    /// Forward `inbound` and return the upstream status, sanitized headers
    /// and a lazily relayed body.
    pub async fn forward(&self, inbound: InboundRequest) -> Result<Response, ForwardError> {
        let target = Target::resolve(&inbound.target, inbound.query.as_deref())?;
        let headers = sanitize_request_headers(&inbound.headers);
        let body = axum::body::to_bytes(inbound.body, usize::MAX)
            .await
            .map_err(|e| ForwardError::Internal(format!("failed to read request body: {e}")))?;

        let resources = self.context.resources().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize forwarding resources");
            ForwardError::from(e)
        })?;

        let queued = Instant::now();
        let permit = resources.admission.acquire().await?;
        metrics::record_admission_wait(queued.elapsed());
        metrics::set_in_flight(resources.admission.in_flight());

        tracing::debug!(
            method = %inbound.method,
            target_url = %target.url(),
            body_bytes = body.len(),
            "Forwarding request"
        );

        let outbound = OutboundRequest {
            method: inbound.method,
            uri: target.uri().clone(),
            headers,
            body,
        };

        let upstream = match resources.transport.send(outbound).await {
            Ok(upstream) => upstream,
            Err(e) => {
                permit.release();
                metrics::set_in_flight(resources.admission.in_flight());
                metrics::record_upstream_error(e.kind());
                if e.is_upstream() {
                    tracing::warn!(target_url = %target.url(), error = %e, "Upstream request failed");
                } else {
                    tracing::error!(target_url = %target.url(), error = %e, "Forwarding failed");
                }
                return Err(e.into());
            }
        };

        let headers = sanitize_response_headers(&upstream.headers);
        let relay = Relay::new(
            upstream.body,
            permit,
            resources.admission.clone(),
            target.url(),
        );

        let mut response = Response::new(Body::from_stream(relay));
        *response.status_mut() = upstream.status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

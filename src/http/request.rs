//! Inbound request extraction.
//!
//! The target is read from the raw request path so percent-encoding and
//! repeated slashes reach the upstream untouched; axum's decoded path
//! parameter is not used for that reason.

use axum::extract::{FromRequest, Request};

use crate::proxy::engine::InboundRequest;
use crate::proxy::error::ForwardError;

/// Route prefix under which targets are addressed.
pub const PROXY_PREFIX: &str = "/proxy/";

/// Split the raw path into the target part after [`PROXY_PREFIX`].
pub fn target_from_path(path: &str) -> Result<&str, ForwardError> {
    path.strip_prefix(PROXY_PREFIX)
        .ok_or_else(|| ForwardError::invalid_target(format!("path must start with {PROXY_PREFIX}")))
}

impl<S> FromRequest<S> for InboundRequest
where
    S: Send + Sync,
{
    type Rejection = ForwardError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let target = target_from_path(parts.uri.path())?.to_string();

        Ok(InboundRequest {
            method: parts.method,
            target,
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Method;

    #[test]
    fn strips_route_prefix() {
        assert_eq!(target_from_path("/proxy/localhost:9000/health").unwrap(), "localhost:9000/health");
        assert_eq!(
            target_from_path("/proxy/https://example.com:443/a%2Fb").unwrap(),
            "https://example.com:443/a%2Fb"
        );
        assert!(target_from_path("/elsewhere").is_err());
    }

    #[tokio::test]
    async fn extracts_raw_path_and_query() {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/proxy/localhost:9000/a%20b//c?x=1&x=2&y")
            .header("x-custom-header", "test-value")
            .body(Body::from("data"))
            .unwrap();

        let inbound = InboundRequest::from_request(request, &()).await.unwrap();
        assert_eq!(inbound.method, Method::PUT);
        assert_eq!(inbound.target, "localhost:9000/a%20b//c");
        assert_eq!(inbound.query.as_deref(), Some("x=1&x=2&y"));
        assert_eq!(inbound.headers["x-custom-header"], "test-value");
    }
}

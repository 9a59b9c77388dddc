//! Target resolution: turn the path after `/proxy/` into an upstream URL.
//!
//! Accepted shapes:
//! ```text
//! host:port[/path]
//! scheme://host:port[/path]
//! ```
//! The query string of the inbound request is appended verbatim, and the
//! path is kept as written: no percent re-encoding, no dot-segment removal.
//! Nothing here touches the network.

use axum::http::Uri;
use std::fmt;

use crate::proxy::error::ForwardError;

/// Upstream scheme. Defaults to http when the path names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    /// Parse a scheme case-insensitively; anything but http/https fails.
    pub fn parse(raw: &str) -> Result<Self, ForwardError> {
        match raw.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            _ => Err(ForwardError::InvalidScheme {
                scheme: raw.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated upstream target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Always starts with `/`.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    url: String,
    uri: Uri,
}

impl Target {
    /// Resolve `raw` (everything after `/proxy/`) plus the raw inbound query.
    pub fn resolve(raw: &str, query: Option<&str>) -> Result<Self, ForwardError> {
        let (scheme, rest) = split_scheme(raw)?;

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| ForwardError::invalid_target(format!("expected host:port, got '{authority}'")))?;

        if host.is_empty() {
            return Err(ForwardError::invalid_target("host is empty"));
        }
        if host
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '@' | '/' | '\\' | '?' | '#'))
        {
            return Err(ForwardError::invalid_target(format!("invalid host '{host}'")));
        }

        let port = match port.parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => {
                return Err(ForwardError::invalid_target(format!(
                    "port must be an integer between 1 and 65535, got '{port}'"
                )))
            }
        };

        let query = query.filter(|q| !q.is_empty()).map(str::to_string);

        let mut url = format!("{scheme}://{host}:{port}{path}");
        if let Some(query) = &query {
            url.push('?');
            url.push_str(query);
        }

        let uri = match Uri::try_from(url.as_str()) {
            Ok(uri) if uri.host().is_some() => uri,
            _ => return Err(ForwardError::invalid_target(format!("'{url}' is not a valid URL"))),
        };

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            path: path.to_string(),
            query,
            url,
            uri,
        })
    }

    /// Fully qualified upstream URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The same URL as a request target, exactly as it goes on the wire.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

/// Split an explicit `scheme://` prefix off `raw`. A `://` that appears after
/// the first `/` belongs to the path, not to a scheme.
fn split_scheme(raw: &str) -> Result<(Scheme, &str), ForwardError> {
    match raw.split_once("://") {
        Some((scheme, rest)) if !scheme.contains('/') => Ok((Scheme::parse(scheme)?, rest)),
        _ => Ok((Scheme::default(), raw)),
    }
}

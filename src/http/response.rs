//! Responses the proxy produces itself.

use axum::Json;
use serde::Serialize;

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: &'static str,
    pub version: &'static str,
    pub usage: [&'static str; 2],
}

impl Default for Welcome {
    fn default() -> Self {
        Self {
            message: "Welcome to HTTPKit Proxy",
            version: env!("CARGO_PKG_VERSION"),
            usage: [
                "/proxy/{target_host}:{target_port}/{path}",
                "/proxy/{scheme}://{target_host}:{target_port}/{path}",
            ],
        }
    }
}

pub async fn welcome() -> Json<Welcome> {
    Json(Welcome::default())
}

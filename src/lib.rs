//! HTTPKit forwarding proxy library.
//!
//! `/proxy/{host}:{port}/{path}` relays a request to the named upstream and
//! streams the answer back, with a bounded number of forwards in flight.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::ProxyContext;
pub use proxy::{ForwardError, ForwardingEngine};

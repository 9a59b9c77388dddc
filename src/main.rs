use clap::Parser;
use tokio::net::TcpListener;

use httpkit_proxy::config::args::CliArgs;
use httpkit_proxy::lifecycle::signals::shutdown_signal;
use httpkit_proxy::lifecycle::startup::resolve_config;
use httpkit_proxy::observability::{logging, metrics};
use httpkit_proxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config = resolve_config(&args)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("httpkit-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        max_concurrent_requests = config.forwarding.max_concurrent_requests,
        request_timeout_secs = config.forwarding.request_timeout_secs,
        max_connections = config.pool.max_connections,
        max_keepalive_connections = config.pool.max_keepalive_connections,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(&config).run(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Process-lifetime forwarding resources.
//!
//! # Responsibilities
//! - Own the shared transport and the admission controller
//! - Create them once at startup, detach them at shutdown
//! - Lazily create them when a forward arrives first
//!
//! # Design Decisions
//! - Readers take a lock-free snapshot (`ArcSwapOption`); only creation is
//!   serialized, so concurrent cold starts build exactly one transport
//! - Shutdown detaches rather than destroys: in-flight forwards keep their
//!   own `Arc` and finish normally
//! - Settings are captured at construction and never re-read

use arc_swap::ArcSwapOption;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::ProxyConfig;
use crate::net::transport::{HttpTransport, Transport, TransportConfig, TransportError};
use crate::security::limits::AdmissionController;

/// Builds the shared transport from its settings.
pub type TransportFactory =
    Arc<dyn Fn(&TransportConfig) -> Result<Arc<dyn Transport>, TransportError> + Send + Sync>;

/// The resources one forwarding operation runs against.
pub struct Resources {
    pub transport: Arc<dyn Transport>,
    pub admission: AdmissionController,
}

pub struct ProxyContext {
    transport_config: TransportConfig,
    capacity: NonZeroUsize,
    factory: TransportFactory,
    current: ArcSwapOption<Resources>,
    init_lock: Mutex<()>,
    initializations: AtomicUsize,
}

impl ProxyContext {
    /// A context backed by the pooled HTTP transport.
    pub fn new(config: &ProxyConfig) -> Self {
        Self::with_factory(
            config,
            Arc::new(
                |settings: &TransportConfig| -> Result<Arc<dyn Transport>, TransportError> {
                    Ok(Arc::new(HttpTransport::new(settings)?))
                },
            ),
        )
    }

    pub fn with_factory(config: &ProxyConfig, factory: TransportFactory) -> Self {
        Self {
            transport_config: TransportConfig::from_config(config),
            capacity: NonZeroUsize::new(config.forwarding.max_concurrent_requests)
                .unwrap_or(NonZeroUsize::MIN),
            factory,
            current: ArcSwapOption::empty(),
            init_lock: Mutex::new(()),
            initializations: AtomicUsize::new(0),
        }
    }

    /// Create the resources unless they already exist. Safe to call from
    /// any number of tasks at once.
    pub async fn init(&self) -> Result<Arc<Resources>, TransportError> {
        let _guard = self.init_lock.lock().await;
        if let Some(resources) = self.current.load_full() {
            return Ok(resources);
        }

        let transport = (self.factory)(&self.transport_config)?;
        let resources = Arc::new(Resources {
            transport,
            admission: AdmissionController::new(self.capacity),
        });
        self.current.store(Some(resources.clone()));
        self.initializations.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            max_concurrent_requests = resources.admission.capacity(),
            max_connections = self.transport_config.max_connections,
            "Forwarding resources initialized"
        );
        Ok(resources)
    }

    /// Current resources, initializing them first if needed.
    pub async fn resources(&self) -> Result<Arc<Resources>, TransportError> {
        if let Some(resources) = self.current.load_full() {
            return Ok(resources);
        }
        tracing::warn!("Forward arrived before initialization; initializing lazily");
        self.init().await
    }

    /// Detach the resources and stop admitting. Forwards already holding a
    /// permit run to completion; queued ones fail.
    pub fn shutdown(&self) {
        if let Some(resources) = self.current.swap(None) {
            resources.admission.close();
            tracing::info!(
                in_flight = resources.admission.in_flight(),
                "Forwarding resources shut down"
            );
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.current.load().is_some()
    }

    /// How many times resources have been created.
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::Relaxed)
    }
}

//! TLS-terminating server.
//!
//! # Responsibilities
//! - Build the listener, default certificate, SNI adapter and rustls config
//! - Dispatch accepted connections to one handshake task each
//! - Close every session once its handshake ends
//!
//! # Design Decisions
//! - Setup fails fast: any error is returned before a socket accepts traffic
//! - Unbounded handshake fan-out; the queue in front of it is bounded
//! - `stop` closes the listener only; in-flight handshakes drain on their own

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use crate::config::ServerConfig;
use crate::net::connection::{Connection, ConnectionGuard, ConnectionTracker};
use crate::net::listener::{Listener, ListenerError, LocalAddr, QUEUE_CAPACITY};
use crate::sni::{AdapterError, AdapterRegistry, SniAdapter};
use crate::tls::{self, Certificate, CertificateError, SniResolver};

/// Error type for server setup.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to load default certificate: {0}")]
    DefaultCertificate(#[source] CertificateError),

    #[error("failed to set up SNI adapter `{name}`: {source}")]
    Adapter {
        name: String,
        #[source]
        source: AdapterError,
    },

    #[error("failed to build TLS configuration: {0}")]
    Tls(#[from] rustls::Error),
}

/// A listener whose connections are terminated with TLS.
pub struct Server {
    listener: Listener,
    connections: Mutex<Option<mpsc::Receiver<Connection>>>,
    acceptor: TlsAcceptor,
    default_certificate: Certificate,
    adapter: Option<Arc<dyn SniAdapter>>,
    tracker: ConnectionTracker,
}

impl Server {
    /// Bind the listener and load every certificate the server will present.
    ///
    /// An empty `sni_adapter` runs without an adapter: every handshake uses
    /// the default certificate.
    pub async fn new(config: &ServerConfig, registry: &AdapterRegistry) -> Result<Self, ServerError> {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let listener = Listener::bind(config.transport, &config.address, tx).await?;

        let default_certificate = tls::load_key_pair(&config.certificate, &config.key)
            .map_err(ServerError::DefaultCertificate)?;
        tracing::info!(
            certificate = %config.certificate.display(),
            "Default certificate loaded"
        );

        let adapter = if config.sni_adapter.is_empty() {
            tracing::info!("No SNI adapter configured, default certificate only");
            None
        } else {
            let adapter = registry
                .resolve(&config.sni_adapter, &config.sni_adapter_settings)
                .map_err(|source| ServerError::Adapter {
                    name: config.sni_adapter.clone(),
                    source,
                })?;
            tracing::info!(adapter = %config.sni_adapter, "SNI adapter ready");
            Some(adapter)
        };

        let resolver = SniResolver::new(default_certificate.clone(), adapter.clone());
        let acceptor = TlsAcceptor::from(tls::server_config(resolver)?);

        Ok(Self {
            listener,
            connections: Mutex::new(Some(rx)),
            acceptor,
            default_certificate,
            adapter,
            tracker: ConnectionTracker::new(),
        })
    }

    /// Accept and terminate connections until the listener ends.
    ///
    /// A listener fault is logged, not propagated. Only the first call
    /// serves; later calls log and return.
    pub async fn run(&self) {
        let Some(connections) = self.take_connections() else {
            tracing::error!("Server is already running");
            return;
        };

        tokio::spawn(dispatch(
            connections,
            self.acceptor.clone(),
            self.tracker.clone(),
        ));

        if let Err(e) = self.listener.run().await {
            tracing::error!(address = %self.listener.local_addr(), error = %e, "Listener failed");
        }
    }

    /// Run the server on a background task.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let server = Arc::clone(self);
        tokio::spawn(async move { server.run().await })
    }

    /// Stop accepting new connections.
    pub fn stop(&self) {
        self.listener.stop();
    }

    pub fn local_addr(&self) -> &LocalAddr {
        self.listener.local_addr()
    }

    pub fn default_certificate(&self) -> &Certificate {
        &self.default_certificate
    }

    pub fn adapter(&self) -> Option<&Arc<dyn SniAdapter>> {
        self.adapter.as_ref()
    }

    /// Handshake tasks currently in flight.
    pub fn active_handshakes(&self) -> u64 {
        self.tracker.active_count()
    }

    fn take_connections(&self) -> Option<mpsc::Receiver<Connection>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", self.listener.local_addr())
            .field("default_certificate", &self.default_certificate)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

/// Spawn one handshake per queued connection, in arrival order.
///
/// Ends when the listener, and with it the queue's sender, is dropped.
async fn dispatch(
    mut connections: mpsc::Receiver<Connection>,
    acceptor: TlsAcceptor,
    tracker: ConnectionTracker,
) {
    while let Some(conn) = connections.recv().await {
        let guard = tracker.track(conn.id());
        tokio::spawn(handshake(acceptor.clone(), conn, guard));
    }
    tracing::debug!("Dispatch loop finished");
}

async fn handshake(acceptor: TlsAcceptor, conn: Connection, guard: ConnectionGuard) {
    let peer = conn.peer().clone();

    match acceptor.accept(conn.into_stream()).await {
        Ok(mut stream) => {
            let (server_name, protocol) = {
                let (_, session) = stream.get_ref();
                (
                    session.server_name().map(str::to_owned),
                    session.protocol_version(),
                )
            };
            tracing::debug!(
                connection_id = %guard.id(),
                peer = %peer,
                server_name = server_name.as_deref().unwrap_or("-"),
                protocol = ?protocol,
                "Handshake complete"
            );
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(connection_id = %guard.id(), error = %e, "TLS close failed");
            }
        }
        Err(e) => {
            tracing::debug!(connection_id = %guard.id(), peer = %peer, error = %e, "Handshake failed");
        }
    }
}

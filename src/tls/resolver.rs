//! Per-handshake certificate selection.

use std::fmt;
use std::sync::Arc;

use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;

use crate::sni::SniAdapter;
use crate::tls::Certificate;

/// Resolves the certificate for a ClientHello.
///
/// The adapter is asked first when the client sent a server name. When there
/// is no adapter, no server name, or the adapter has no opinion, the default
/// certificate is presented.
pub struct SniResolver {
    default: Certificate,
    adapter: Option<Arc<dyn SniAdapter>>,
}

impl SniResolver {
    pub fn new(default: Certificate, adapter: Option<Arc<dyn SniAdapter>>) -> Self {
        Self { default, adapter }
    }

    /// Pick the certificate for an optional requested hostname.
    pub fn select(&self, server_name: Option<&str>) -> Certificate {
        let chosen = match (server_name, &self.adapter) {
            (Some(name), Some(adapter)) => adapter.callback(name),
            _ => None,
        };

        match chosen {
            Some(certificate) => {
                tracing::debug!(server_name = ?server_name, "Adapter certificate selected");
                certificate
            }
            None => {
                tracing::debug!(server_name = ?server_name, "Default certificate selected");
                self.default.clone()
            }
        }
    }
}

impl fmt::Debug for SniResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SniResolver")
            .field("default", &self.default)
            .field("adapter", &self.adapter)
            .finish()
    }
}

impl ResolvesServerCert for SniResolver {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(self.select(client_hello.server_name()).certified_key())
    }
}

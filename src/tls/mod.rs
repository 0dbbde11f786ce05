//! TLS subsystem.
//!
//! # Data Flow
//! ```text
//! PEM files (glob patterns)
//!     → certificate.rs (classify blocks, build CertifiedKey)
//!     → Certificate (immutable, Arc-shared)
//!
//! ClientHello
//!     → resolver.rs (SNI → adapter → certificate, else default)
//!     → rustls handshake continues with the chosen certificate
//! ```
//!
//! # Design Decisions
//! - The ring crypto provider is selected explicitly, no process default
//! - Certificates are loaded once and never mutated

pub mod certificate;
pub mod resolver;

#[cfg(test)]
pub(crate) mod fixtures;

use std::sync::Arc;

pub use certificate::{load_certificate, load_key_pair, Certificate, CertificateError};
pub use resolver::SniResolver;

/// Build the server-side rustls configuration around a resolver.
pub fn server_config(resolver: SniResolver) -> Result<Arc<rustls::ServerConfig>, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(resolver));
    Ok(Arc::new(config))
}

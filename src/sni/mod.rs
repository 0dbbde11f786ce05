//! SNI adapter subsystem.
//!
//! # Data Flow
//! ```text
//! [server] sni_adapter = "inmemory" + [adapters.inmemory] settings
//!     → registry.rs (name → factory)
//!     → factory(settings) → Arc<dyn SniAdapter>
//!     → tls::SniResolver asks the adapter on every handshake
//! ```
//!
//! # Design Decisions
//! - The registry is an explicit value, built at startup and passed by
//!   reference; there is no process-wide table
//! - Adapters are queried synchronously from the handshake, so `callback`
//!   must not do anything slower than a map lookup

pub mod in_memory;
pub mod registry;

use std::fmt;

use crate::tls::Certificate;

pub use in_memory::InMemoryAdapter;
pub use registry::{AdapterError, AdapterFactory, AdapterRegistry, AdapterSettings};

/// A backend that maps a requested hostname to a certificate.
pub trait SniAdapter: fmt::Debug + Send + Sync {
    /// Return the certificate for `server_name`, or `None` to fall back to
    /// the default certificate.
    fn callback(&self, server_name: &str) -> Option<Certificate>;
}

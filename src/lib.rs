//! TLS-terminating listener with per-connection certificate selection.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──TCP/Unix──▶ net::Listener ──queue──▶ server dispatch ──spawn──▶ handshake task
//!                           │                                                   │
//!                    stop / classify                                   tls::SniResolver
//!                                                                               │
//!                                                         sni::SniAdapter (e.g. InMemoryAdapter)
//!                                                                     or the default certificate
//! ```
//!
//! The handshake is the end of the pipeline: once it completes, or fails,
//! the session is closed.

// Core subsystems
pub mod net;
pub mod server;
pub mod sni;
pub mod tls;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use lifecycle::Shutdown;
pub use server::{Server, ServerError};
pub use sni::{AdapterRegistry, InMemoryAdapter, SniAdapter};
pub use tls::Certificate;

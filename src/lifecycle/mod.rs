//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (server.rs):
//!     Load config → Init logging → Server::new (listener, certs, adapter) → run
//!
//! Shutdown (shutdown.rs):
//!     Stop requested → stopping flag set → signal → accept loop exits → socket closed
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Server::stop
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Stop ends acceptance only; handshakes already dispatched finish

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;

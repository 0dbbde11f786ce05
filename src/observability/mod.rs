//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (listener, dispatch, handshake, setup)
//!     → logging.rs (subscriber bound to the configured target)
//!
//! Consumers:
//!     → stdout, or an append-only log file
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber; the binary does
//! - Connection IDs flow through listener and handshake events

pub mod logging;

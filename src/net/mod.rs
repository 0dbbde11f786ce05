//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP / Unix connection
//!     → listener.rs (accept loop, stop classification)
//!     → bounded queue (FIFO, QUEUE_CAPACITY)
//!     → server.rs dispatch (one handshake task per connection)
//!
//! Listener States:
//!     Created → Running → Stopped
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue absorbs bursts without stalling the accept loop
//! - Each connection tracked while its handshake runs
//! - Transport is erased once accepted; TLS sees a plain byte stream

pub mod connection;
pub mod listener;

pub use connection::{Connection, ConnectionId, PeerAddr};
pub use listener::{classify_accept_error, AcceptOutcome, Listener, ListenerError, LocalAddr};

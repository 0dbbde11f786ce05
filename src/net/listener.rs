//! Stream listener with an explicit stop protocol.
//!
//! # Responsibilities
//! - Bind TCP (any family, IPv4-only, IPv6-only) or Unix-domain sockets
//! - Accept connections and forward them, in order, into a bounded queue
//! - Tell an operator-requested stop apart from a genuine accept failure
//!
//! # Design Decisions
//! - `stop` sets the `stopping` flag before signalling the accept loop, so
//!   any accept error observed afterwards is classified as shutdown
//! - A transient accept error ends the loop; there is no retry
//! - Unix socket files are removed when the socket closes

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::net::{TcpListener, UnixListener};
use tokio::sync::mpsc;

use crate::config::Transport;
use crate::lifecycle::Shutdown;
use crate::net::connection::{Connection, PeerAddr};

/// Capacity of the queue between the accept loop and the dispatch loop.
pub const QUEUE_CAPACITY: usize = 1024;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The address could not be resolved.
    Resolve { address: String, source: io::Error },
    /// The address resolved, but not to the transport's address family.
    NoAddress { address: String, transport: Transport },
    /// The transport cannot carry a TLS stream.
    Unsupported(Transport),
    /// Failed to bind to address.
    Bind { address: String, source: io::Error },
    /// Failed to accept connection.
    Accept(io::Error),
    /// `run` was called while another `run` owns the socket.
    AlreadyRunning,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Resolve { address, source } => {
                write!(f, "Failed to resolve {}: {}", address, source)
            }
            ListenerError::NoAddress { address, transport } => {
                write!(f, "No {} address for {}", transport, address)
            }
            ListenerError::Unsupported(transport) => {
                write!(f, "Unsupported transport type: {}", transport)
            }
            ListenerError::Bind { address, source } => {
                write!(f, "Failed to bind {}: {}", address, source)
            }
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
            ListenerError::AlreadyRunning => write!(f, "Listener is already running"),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Resolve { source, .. } | ListenerError::Bind { source, .. } => {
                Some(source)
            }
            ListenerError::Accept(e) => Some(e),
            _ => None,
        }
    }
}

/// What an accept error means for the accept loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The socket was closed on purpose; end the loop without error.
    Shutdown,
    /// A real failure; end the loop and report it.
    Fault,
}

/// Classify an accept error against the `stopping` flag.
///
/// `EINVAL` is what accept returns on a socket closed underneath it: it is a
/// shutdown only when a stop was requested. Temporary errors are faults even
/// while stopping. Anything else is a shutdown when stopping, else a fault.
pub fn classify_accept_error(err: &io::Error, stopping: bool) -> AcceptOutcome {
    let closed_socket = err.kind() == io::ErrorKind::InvalidInput;

    if stopping && (closed_socket || !is_temporary(err)) {
        AcceptOutcome::Shutdown
    } else {
        AcceptOutcome::Fault
    }
}

fn is_temporary(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

/// Address a listener is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAddr {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl std::fmt::Display for LocalAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalAddr::Tcp(addr) => write!(f, "{}", addr),
            LocalAddr::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Unix listener that unlinks its socket file when closed.
struct UnixSocket {
    inner: UnixListener,
    path: PathBuf,
}

impl Drop for UnixSocket {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "Socket file not removed");
        }
    }
}

enum Socket {
    Tcp(TcpListener),
    Unix(UnixSocket),
}

impl Socket {
    async fn accept(&self) -> io::Result<Connection> {
        match self {
            Socket::Tcp(listener) => {
                let (stream, addr) = listener.accept().await?;
                Ok(Connection::new(stream, PeerAddr::Tcp(addr)))
            }
            Socket::Unix(socket) => {
                let (stream, addr) = socket.inner.accept().await?;
                let peer = PeerAddr::Unix(addr.as_pathname().map(Path::to_path_buf));
                Ok(Connection::new(stream, peer))
            }
        }
    }
}

/// A listening socket feeding accepted connections into a bounded queue.
///
/// Lifecycle: bound by [`Listener::bind`], accepting inside [`Listener::run`],
/// closed after [`Listener::stop`] or a fault.
pub struct Listener {
    socket: Mutex<Option<Socket>>,
    local_addr: LocalAddr,
    transport: Transport,
    stopping: AtomicBool,
    shutdown: Shutdown,
    incoming: mpsc::Sender<Connection>,
}

impl Listener {
    /// Bind `address` using `transport`; accepted connections go to `incoming`.
    pub async fn bind(
        transport: Transport,
        address: &str,
        incoming: mpsc::Sender<Connection>,
    ) -> Result<Self, ListenerError> {
        let (socket, local_addr) = match transport {
            Transport::Tcp | Transport::Tcp4 | Transport::Tcp6 => {
                let candidates = resolve(transport, address).await?;
                let listener = TcpListener::bind(candidates.as_slice())
                    .await
                    .map_err(|source| ListenerError::Bind {
                        address: address.to_string(),
                        source,
                    })?;
                let local = listener.local_addr().map_err(|source| ListenerError::Bind {
                    address: address.to_string(),
                    source,
                })?;
                (Socket::Tcp(listener), LocalAddr::Tcp(local))
            }
            Transport::Unix => {
                let path = PathBuf::from(address);
                let inner = UnixListener::bind(&path).map_err(|source| ListenerError::Bind {
                    address: address.to_string(),
                    source,
                })?;
                let socket = UnixSocket {
                    inner,
                    path: path.clone(),
                };
                (Socket::Unix(socket), LocalAddr::Unix(path))
            }
            Transport::Unixpacket | Transport::Unixgram => {
                return Err(ListenerError::Unsupported(transport))
            }
        };

        tracing::info!(address = %local_addr, transport = %transport, "Listener bound");

        Ok(Self {
            socket: Mutex::new(Some(socket)),
            local_addr,
            transport,
            stopping: AtomicBool::new(false),
            shutdown: Shutdown::new(),
            incoming,
        })
    }

    /// Accept connections until stopped or a fault occurs.
    ///
    /// Returns `Ok(())` after [`Listener::stop`] or when the queue's receiver
    /// is gone; returns the error for any fault. The socket is closed either way.
    pub async fn run(&self) -> Result<(), ListenerError> {
        let socket = match self.take_socket() {
            Some(socket) => socket,
            None if self.is_stopping() => return Ok(()),
            None => return Err(ListenerError::AlreadyRunning),
        };

        tracing::info!(address = %self.local_addr, transport = %self.transport, "Accepting connections");

        let result = loop {
            let accepted = tokio::select! {
                biased;
                _ = self.shutdown.triggered() => break Ok(()),
                accepted = socket.accept() => accepted,
            };

            let conn = match accepted {
                Ok(conn) => conn,
                Err(e) => match classify_accept_error(&e, self.is_stopping()) {
                    AcceptOutcome::Shutdown => break Ok(()),
                    AcceptOutcome::Fault => break Err(ListenerError::Accept(e)),
                },
            };

            tracing::debug!(connection_id = %conn.id(), peer = %conn.peer(), "Connection accepted");

            tokio::select! {
                biased;
                _ = self.shutdown.triggered() => break Ok(()),
                sent = self.incoming.send(conn) => {
                    if sent.is_err() {
                        tracing::debug!("Connection queue closed");
                        break Ok(());
                    }
                }
            }
        };

        drop(socket);
        tracing::info!(address = %self.local_addr, "Listener closed");
        result
    }

    /// Stop accepting. Safe to call from any task, and more than once.
    pub fn stop(&self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(address = %self.local_addr, "Listener stopping");

        self.shutdown.trigger();
        // Not running yet: close the socket here. Otherwise `run` owns it.
        drop(self.take_socket());
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub fn local_addr(&self) -> &LocalAddr {
        &self.local_addr
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    fn take_socket(&self) -> Option<Socket> {
        self.socket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Candidate bind addresses for a `host:port` string, in preference order.
///
/// An empty host means every local interface of the transport's family.
async fn resolve(transport: Transport, address: &str) -> Result<Vec<SocketAddr>, ListenerError> {
    if let Some(port) = address.strip_prefix(':') {
        let port = port.parse::<u16>().map_err(|e| ListenerError::Resolve {
            address: address.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, e),
        })?;
        return Ok(unspecified(transport, port));
    }

    let candidates: Vec<SocketAddr> = tokio::net::lookup_host(address)
        .await
        .map_err(|source| ListenerError::Resolve {
            address: address.to_string(),
            source,
        })?
        .filter(|addr| transport.accepts(addr))
        .collect();

    if candidates.is_empty() {
        return Err(ListenerError::NoAddress {
            address: address.to_string(),
            transport,
        });
    }
    Ok(candidates)
}

fn unspecified(transport: Transport, port: u16) -> Vec<SocketAddr> {
    let v4 = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let v6 = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
    match transport {
        Transport::Tcp4 => vec![v4],
        Transport::Tcp6 => vec![v6],
        // Dual-stack where the host has IPv6, IPv4 otherwise.
        _ => vec![v6, v4],
    }
}

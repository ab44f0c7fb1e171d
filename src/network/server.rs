//! TCP Server
//!
//! Accepts connections and dispatches them to a fixed pool of workers.
//!
//! The accept loop hands streams to workers through a bounded queue. When
//! every worker is busy and the queue is full the accept loop blocks, and
//! further clients wait in the kernel's listen backlog.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver};

use crate::config::Config;
use crate::error::{ErrorKind, Result, ShareError};
use crate::store::FileStore;

use super::Connection;

/// TCP server for a shared folder
pub struct Server {
    config: Config,
    store: Arc<FileStore>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    served: Arc<AtomicU64>,
}

/// Stops a running [`Server`] from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting and wind down
    pub fn shutdown(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }
        // Wake the blocking accept; the loop sees the flag and drops this
        if let Err(e) = TcpStream::connect(self.addr) {
            tracing::debug!("Wake-up connect to {} failed: {}", self.addr, e);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Server {
    /// Validate the config, open the shared folder and bind the listener
    pub fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let store = FileStore::open(&config.shared_dir)?;
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            ShareError::Config(format!("cannot listen on {}: {}", config.listen_addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            "Sharing {} on {}",
            store.path().display(),
            local_addr
        );

        Ok(Self {
            config,
            store: Arc::new(store),
            listener,
            local_addr,
            shutdown: Arc::new(AtomicBool::new(false)),
            served: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for stopping the server
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            addr: wake_addr(self.local_addr),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown_handle().shutdown();
    }

    /// Connections fully handled so far
    pub fn connections_served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    /// Start the server (blocking)
    ///
    /// Returns once shutdown has been signalled and every queued
    /// connection has been served.
    pub fn run(&self) -> Result<()> {
        let (tx, rx) = channel::bounded::<TcpStream>(self.config.pending_connections);

        let workers = (0..self.config.max_connections)
            .map(|id| self.spawn_worker(id, rx.clone()))
            .collect::<std::io::Result<Vec<_>>>()?;
        drop(rx);

        tracing::info!(
            "Accepting connections with {} workers",
            self.config.max_connections
        );

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    // Per-connection failures (e.g. reset before accept) don't stop the loop
                    tracing::warn!("Accept failed: {}", e);
                    continue;
                }
            };

            if tx.send(stream).is_err() {
                tracing::error!("All workers have exited; stopping accept loop");
                break;
            }
        }

        // Closing the queue lets workers drain it and exit
        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked outside a connection");
            }
        }

        tracing::info!(
            "Server stopped after {} connections",
            self.connections_served()
        );
        Ok(())
    }

    fn spawn_worker(&self, id: usize, rx: Receiver<TcpStream>) -> std::io::Result<JoinHandle<()>> {
        let store = Arc::clone(&self.store);
        let served = Arc::clone(&self.served);
        let config = self.config.clone();

        thread::Builder::new()
            .name(format!("fileshare-worker-{}", id))
            .spawn(move || {
                for stream in rx.iter() {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        serve_stream(stream, Arc::clone(&store), &config)
                    }));

                    if outcome.is_err() {
                        tracing::error!("Connection handler panicked");
                    }
                    served.fetch_add(1, Ordering::Relaxed);
                }
                tracing::trace!("Worker {} exiting", id);
            })
    }
}

fn serve_stream(stream: TcpStream, store: Arc<FileStore>, config: &Config) {
    let mut connection = match Connection::new(stream, store, config.max_command_len) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::debug!("Dropping connection during setup: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms) {
        tracing::warn!("Cannot set timeouts for {}: {}", connection.peer_addr(), e);
        return;
    }

    if let Err(e) = connection.handle() {
        log_failure(connection.peer_addr(), &e);
    }
}

fn log_failure(peer: &str, err: &ShareError) {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::InvalidName => {
            tracing::info!("Rejected request from {}: {}", peer, err)
        }
        ErrorKind::ConnectionFailure => tracing::debug!("Client {} went away: {}", peer, err),
        _ => tracing::warn!("Error serving {}: {}", peer, err),
    }
}

/// Address to connect to when waking our own accept loop
fn wake_addr(addr: SocketAddr) -> SocketAddr {
    let mut addr = addr;
    if addr.ip().is_unspecified() {
        match addr {
            SocketAddr::V4(_) => addr.set_ip(std::net::Ipv4Addr::LOCALHOST.into()),
            SocketAddr::V6(_) => addr.set_ip(std::net::Ipv6Addr::LOCALHOST.into()),
        }
    }
    addr
}

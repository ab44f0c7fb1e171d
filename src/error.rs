//! Error types for fileshare
//!
//! Provides a unified error type for all operations, plus the coarse
//! [`ErrorKind`] taxonomy a front end can switch on.

use thiserror::Error;

/// Result type alias using ShareError
pub type Result<T> = std::result::Result<T, ShareError>;

/// Unified error type for fileshare operations
#[derive(Debug, Error)]
pub enum ShareError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server reported a filesystem failure on its side
    #[error("Remote IO error: {0}")]
    RemoteIo(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Transfer truncated: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Socket could not be opened or dropped mid-exchange
    ConnectionFailure,
    /// Local or remote filesystem error
    IoFailure,
    /// Requested file absent
    NotFound,
    /// Path traversal or malformed filename
    InvalidName,
    /// Unparseable command line or bad framing
    ProtocolError,
    /// Bad folder or settings handed to the core
    Config,
}

impl ShareError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShareError::Io(e) if is_disconnect(e) || is_timeout(e) => {
                ErrorKind::ConnectionFailure
            }
            ShareError::Io(_) | ShareError::RemoteIo(_) => ErrorKind::IoFailure,
            ShareError::Connection(_) | ShareError::Truncated { .. } => {
                ErrorKind::ConnectionFailure
            }
            ShareError::Protocol(_) => ErrorKind::ProtocolError,
            ShareError::NotFound(_) => ErrorKind::NotFound,
            ShareError::InvalidName(_) => ErrorKind::InvalidName,
            ShareError::Config(_) => ErrorKind::Config,
        }
    }

    /// Map an error raised while talking to a peer.
    ///
    /// Resets, aborts, broken pipes, early EOFs and timeouts mean the peer
    /// went away or stalled.
    pub(crate) fn from_wire(err: std::io::Error) -> Self {
        if is_disconnect(&err) || is_timeout(&err) {
            ShareError::Connection(err.to_string())
        } else {
            ShareError::Io(err)
        }
    }
}

/// True for I/O errors that mean the other end of a socket is gone
pub(crate) fn is_disconnect(err: &std::io::Error) -> bool {
    use std::io::ErrorKind::*;
    matches!(
        err.kind(),
        ConnectionReset | ConnectionAborted | BrokenPipe | UnexpectedEof | NotConnected
    )
}

/// True for socket timeouts (Unix reports WouldBlock, Windows TimedOut)
pub(crate) fn is_timeout(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

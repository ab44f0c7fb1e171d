//! Connection Handler
//!
//! Handles individual client connections: one command, one reply, close.

use std::io::{BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{is_disconnect, is_timeout, Result, ShareError};
use crate::protocol::{
    copy_exact, encode_listing, read_command, read_length, write_error, write_length, write_ok,
    Command, Status,
};
use crate::store::FileStore;

/// Where a connection is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingCommand,
    Dispatching,
    StreamingResponse,
    Closed,
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared folder
    store: Arc<FileStore>,

    /// Peer address for logging
    peer_addr: String,

    /// Longest accepted command line
    max_command_len: usize,

    state: ConnectionState,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, store: Arc<FileStore>, max_command_len: usize) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Replies are small frames followed by bulk data; don't delay the frame
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            peer_addr,
            max_command_len,
            state: ConnectionState::AwaitingCommand,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads one command, replies, and closes. A client that disconnects or
    /// stalls is not an error. Anything else is returned after the client
    /// has been sent an error reply where one was still possible.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let result = self.serve();
        self.close();

        match result {
            Ok(()) => Ok(()),
            Err(ShareError::Io(ref e)) if is_disconnect(e) => {
                tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                Ok(())
            }
            Err(ShareError::Io(ref e)) if is_timeout(e) => {
                tracing::debug!("Timeout for client {}", self.peer_addr);
                Ok(())
            }
            Err(ShareError::Connection(ref msg)) => {
                tracing::debug!("Client {} went away: {}", self.peer_addr, msg);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn serve(&mut self) -> Result<()> {
        self.state = ConnectionState::AwaitingCommand;

        let command = match read_command(&mut self.reader, self.max_command_len) {
            Ok(Some(command)) => command,
            Ok(None) => {
                tracing::debug!("Client {} closed without a command", self.peer_addr);
                return Ok(());
            }
            Err(e @ ShareError::Protocol(_)) => {
                self.reject(&e);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        tracing::trace!("Received command from {}: {}", self.peer_addr, command);

        self.state = ConnectionState::Dispatching;
        if let Err(e) = self.dispatch(command) {
            // Once the OK status is out, the only signal left is closing
            if self.state == ConnectionState::Dispatching {
                self.reject(&e);
            }
            return Err(e);
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Execute a command and stream its reply
    fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::ListDirectory => {
                let entries = self.store.list()?;
                let payload = encode_listing(&entries);

                self.state = ConnectionState::StreamingResponse;
                write_ok(&mut self.writer)?;
                self.writer.write_all(&payload)?;

                tracing::debug!("Sent {} entries to {}", entries.len(), self.peer_addr);
            }

            Command::Upload { filename } => {
                // Header first, then refuse bad names before accepting a body
                let size = read_length(&mut self.reader)?;
                self.store.resolve(&filename)?;

                let written = self.store.write(&filename, &mut self.reader, size)?;

                self.state = ConnectionState::StreamingResponse;
                write_ok(&mut self.writer)?;

                tracing::info!("{} uploaded {} ({} bytes)", self.peer_addr, filename, written);
            }

            Command::Download { filename } => {
                let mut file = self.store.read(&filename)?;
                let len = file.len();

                self.state = ConnectionState::StreamingResponse;
                write_ok(&mut self.writer)?;
                write_length(&mut self.writer, len)?;
                copy_exact(&mut file, &mut self.writer, len)?;

                tracing::info!("{} downloaded {} ({} bytes)", self.peer_addr, filename, len);
            }
        }

        Ok(())
    }

    /// Best effort error reply
    fn reject(&mut self, err: &ShareError) {
        let status = Status::for_error(err);
        if let Err(e) = write_error(&mut self.writer, status, &err.to_string()) {
            tracing::debug!("Could not send error reply to {}: {}", self.peer_addr, e);
        }
    }

    /// Flush whatever is buffered; the streams close when dropped
    fn close(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::trace!("Flush on close failed for {}: {}", self.peer_addr, e);
        }
        self.state = ConnectionState::Closed;
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

//! Request Driver
//!
//! Client side of the protocol. Every remote operation opens one
//! connection, sends one command, consumes the whole reply and closes.
//!
//! The local folder sits behind a lock so a front end can share one
//! `Client` between a UI thread and a worker thread, and switch folders
//! while no transfer holds it.

use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;

use crate::config::ClientConfig;
use crate::error::{Result, ShareError};
use crate::protocol::{
    copy_exact, read_length, read_listing, read_status, write_command, write_length, Command,
};
use crate::store::{self, validate_name, FileEntry, FileStore};

/// Both listings after a refresh
///
/// Each side fails independently.
#[derive(Debug)]
pub struct Listing {
    pub local: Result<Vec<FileEntry>>,
    pub remote: Result<Vec<FileEntry>>,
}

/// Client for a fileshare server
pub struct Client {
    config: ClientConfig,
    local: RwLock<FileStore>,
}

impl Client {
    /// Create a client; the local folder must already exist
    pub fn new(config: ClientConfig) -> Result<Self> {
        let local = FileStore::open(&config.local_dir)?;
        Ok(Self {
            config,
            local: RwLock::new(local),
        })
    }

    /// Server address this client talks to
    pub fn server_addr(&self) -> &str {
        &self.config.server_addr
    }

    /// Current local folder
    pub fn local_folder(&self) -> PathBuf {
        self.local.read().path().to_path_buf()
    }

    /// Switch to another local folder and refresh both listings
    ///
    /// If `path` is not a directory the current folder is kept.
    pub fn set_local_folder(&self, path: impl Into<PathBuf>) -> Result<Listing> {
        let store = FileStore::open(path)?;
        tracing::info!("Local folder set to {}", store.path().display());
        *self.local.write() = store;
        Ok(self.refresh())
    }

    /// List both folders
    pub fn refresh(&self) -> Listing {
        Listing {
            local: self.list_local_files(),
            remote: self.list_remote_files(),
        }
    }

    /// List the local folder
    pub fn list_local_files(&self) -> Result<Vec<FileEntry>> {
        self.store().list()
    }

    /// List the server's shared folder
    pub fn list_remote_files(&self) -> Result<Vec<FileEntry>> {
        let mut exchange = self.connect()?;
        exchange.send(&Command::ListDirectory)?;

        read_status(&mut exchange.reader)?;
        let entries = read_listing(&mut exchange.reader, self.config.max_line_len)?;

        tracing::debug!("Server lists {} files", entries.len());
        Ok(entries)
    }

    /// Upload a file from the local folder
    ///
    /// Returns the number of bytes sent. Success means the server has
    /// committed the file; re-list to observe it.
    pub fn upload(&self, name: &str) -> Result<u64> {
        let mut file = self.store().read(name)?;
        let len = file.len();

        let mut exchange = self.connect()?;
        let sent = exchange.send_upload(name, &mut file, len);

        if let Err(e) = sent {
            // The server may already have refused the upload; its reason beats ours
            exchange.finish_writing();
            return match read_status(&mut exchange.reader) {
                Err(remote) if is_remote_verdict(&remote) => Err(remote),
                _ => Err(e),
            };
        }

        read_status(&mut exchange.reader)?;
        tracing::info!("Uploaded {} ({} bytes)", name, len);
        Ok(len)
    }

    /// Download a file into the local folder under the same name
    pub fn download(&self, name: &str) -> Result<u64> {
        validate_name(name)?;
        let store = self.store();

        let mut exchange = self.connect()?;
        let len = exchange.request_download(name)?;
        let received = store.write(name, &mut exchange.reader, len)?;

        tracing::info!("Downloaded {} ({} bytes)", name, received);
        Ok(received)
    }

    /// Download a file to an arbitrary path, replacing it if present
    ///
    /// The file only appears once it is complete. A missing remote file
    /// fails with [`ShareError::NotFound`] and leaves `destination` alone.
    pub fn download_to(&self, name: &str, destination: impl AsRef<Path>) -> Result<u64> {
        validate_name(name)?;
        let destination = destination.as_ref();

        let mut exchange = self.connect()?;
        let len = exchange.request_download(name)?;

        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = store::temp_file_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            copy_exact(&mut exchange.reader, &mut writer, len)?;
            writer.flush()?;
        }
        store::commit(temp, destination)?;

        tracing::info!(
            "Downloaded {} to {} ({} bytes)",
            name,
            destination.display(),
            len
        );
        Ok(len)
    }

    /// Snapshot of the local store so no lock is held during transfers
    fn store(&self) -> FileStore {
        self.local.read().clone()
    }

    fn connect(&self) -> Result<Exchange> {
        let addr = &self.config.server_addr;
        let stream = connect_stream(addr, self.config.connect_timeout_ms)
            .map_err(|e| ShareError::Connection(format!("cannot connect to {}: {}", addr, e)))?;

        if self.config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(self.config.read_timeout_ms)))?;
        }
        if self.config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(self.config.write_timeout_ms)))?;
        }
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Exchange {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }
}

/// One request/reply over a fresh connection
struct Exchange {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Exchange {
    fn send(&mut self, command: &Command) -> Result<()> {
        write_command(&mut self.writer, command)?;
        self.writer.flush()?;
        Ok(())
    }

    fn send_upload<R: Read>(&mut self, name: &str, body: &mut R, len: u64) -> Result<()> {
        write_command(
            &mut self.writer,
            &Command::Upload {
                filename: name.to_string(),
            },
        )?;
        write_length(&mut self.writer, len)?;
        copy_exact(body, &mut self.writer, len)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Send DOWNLOAD and read up to the body; returns the body length
    fn request_download(&mut self, name: &str) -> Result<u64> {
        self.send(&Command::Download {
            filename: name.to_string(),
        })?;
        read_status(&mut self.reader)?;
        read_length(&mut self.reader)
    }

    /// Tell the server no more bytes are coming
    fn finish_writing(&mut self) {
        let _ = self.writer.flush();
        let _ = self.writer.get_ref().shutdown(Shutdown::Write);
    }
}

/// Errors that carry the server's own judgement of a request
fn is_remote_verdict(err: &ShareError) -> bool {
    matches!(
        err,
        ShareError::NotFound(_) | ShareError::InvalidName(_) | ShareError::RemoteIo(_)
    )
}

fn connect_stream(addr: &str, timeout_ms: u64) -> std::io::Result<TcpStream> {
    if timeout_ms == 0 {
        return TcpStream::connect(addr);
    }

    let timeout = Duration::from_millis(timeout_ms);
    let mut last_err = None;
    for socket_addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "address resolved to nothing",
        )
    }))
}

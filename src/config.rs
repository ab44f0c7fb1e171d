//! Configuration for fileshare
//!
//! Centralized configuration with sensible defaults, one struct per side.

use std::path::PathBuf;

use crate::error::{Result, ShareError};

/// Default TCP port for the protocol
pub const DEFAULT_PORT: u16 = 1234;

/// Default upper bound on a command line, in bytes (newline excluded)
pub const DEFAULT_MAX_COMMAND_LEN: usize = 4096;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Folder exposed to clients. Fixed for the lifetime of the server.
    pub shared_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Worker threads, i.e. connections served at the same time
    pub max_connections: usize,

    /// Accepted connections allowed to wait for a free worker
    pub pending_connections: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Longest accepted command line
    pub max_command_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shared_dir: PathBuf::from("./shared"),
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_connections: 64,
            pending_connections: 128,
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
            max_command_len: DEFAULT_MAX_COMMAND_LEN,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the settings before the server starts
    pub fn validate(&self) -> Result<()> {
        if !self.shared_dir.is_dir() {
            return Err(ShareError::Config(format!(
                "shared folder {} is not a directory",
                self.shared_dir.display()
            )));
        }
        if self.max_connections == 0 {
            return Err(ShareError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.max_command_len == 0 {
            return Err(ShareError::Config(
                "max_command_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the shared folder
    pub fn shared_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.shared_dir = path.into();
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the depth of the accepted-connection queue
    pub fn pending_connections(mut self, count: usize) -> Self {
        self.config.pending_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the longest accepted command line
    pub fn max_command_len(mut self, len: usize) -> Self {
        self.config.max_command_len = len;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address (host:port)
    pub server_addr: String,

    /// Folder uploads are read from and downloads are saved into
    pub local_dir: PathBuf,

    /// Connect timeout (milliseconds, 0 uses the OS default)
    pub connect_timeout_ms: u64,

    /// Socket read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// Longest accepted line in a listing reply
    pub max_line_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            local_dir: PathBuf::from("."),
            connect_timeout_ms: 5000,
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
            max_line_len: DEFAULT_MAX_COMMAND_LEN,
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server address
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the local folder
    pub fn local_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.local_dir = path.into();
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the longest accepted listing line
    pub fn max_line_len(mut self, len: usize) -> Self {
        self.config.max_line_len = len;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

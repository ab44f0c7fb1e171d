//! # fileshare
//!
//! Share one folder over TCP. Clients can:
//! - List the files in the shared folder
//! - Upload a file from their local folder
//! - Download a file into their local folder (or any path)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐             ┌──────────────────────────────┐
//! │        Client        │  one TCP    │          Server              │
//! │   (Request Driver)   │ connection  │  accept loop → bounded queue │
//! │                      │ per command │  → worker pool               │
//! └──────────┬───────────┘ ──────────▶ └──────────────┬───────────────┘
//!            │                                        │
//!            ▼                                        ▼
//!   ┌─────────────────┐                      ┌─────────────────┐
//!   │    FileStore    │                      │   Connection    │
//!   │ (local folder)  │                      │ (one command)   │
//!   └─────────────────┘                      └────────┬────────┘
//!                                                     │
//!                                                     ▼
//!                                            ┌─────────────────┐
//!                                            │    FileStore    │
//!                                            │ (shared folder) │
//!                                            └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, Result, ShareError};
pub use config::{ClientConfig, Config};
pub use store::{FileEntry, FileStore};
pub use network::Server;
pub use client::{Client, Listing};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fileshare
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

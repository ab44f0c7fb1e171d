//! Network Module
//!
//! TCP server and per-connection handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Fixed worker thread pool behind a bounded queue
//! - One command per connection, executed against the FileStore

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::{Connection, ConnectionState};

//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (line command + framed reply)
//!
//! One connection carries exactly one command and one reply.
//!
//! ### Commands
//! - `DIR\n`              - list the shared folder
//! - `UPLOAD <name>\n`    - followed by size (8) + raw bytes
//! - `DOWNLOAD <name>\n`  - fetch a file
//!
//! The verb is split from the argument on the first space only, so names
//! may contain spaces. Names never contain newlines.
//!
//! ### Response Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │Status(1) │         Payload             │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: INVALID_NAME
//! - 0x03: PROTOCOL_ERROR
//! - 0x04: IO_ERROR

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::Status;
pub use codec::{
    copy_exact, decode_command, encode_command, encode_listing, read_command,
    read_command_line, read_length, read_listing, read_status, write_command, write_error,
    write_length, write_ok, COUNT_SIZE, LENGTH_SIZE, MAX_LISTING_ENTRIES, MAX_MESSAGE_LEN,
};

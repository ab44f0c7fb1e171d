//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────────────────────────┬─────────────────────────────────┐
//! │ VERB [ARGUMENT] \n           │ UPLOAD only: size (8) + bytes   │
//! └──────────────────────────────┴─────────────────────────────────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────────────────────────────────────────────────┐
//! │Status(1) │ OK: command payload / else: len (4) + UTF-8 message  │
//! └──────────┴──────────────────────────────────────────────────────┘
//! ```
//!
//! ### OK Payload by Command Type
//! - DIR:      count (4) + count × `name\n`
//! - UPLOAD:   empty
//! - DOWNLOAD: size (8) + raw bytes
//!
//! All integers are big-endian.

use std::io::{self, BufRead, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::{Command, CommandType, Status};
use crate::error::{Result, ShareError};
use crate::store::FileEntry;

/// Size of a count prefix (listing entries, error message length)
pub const COUNT_SIZE: usize = 4;

/// Size of a byte length prefix (upload and download bodies)
pub const LENGTH_SIZE: usize = 8;

/// Maximum error message size (64 KB)
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;

/// Maximum number of entries accepted in one listing
pub const MAX_LISTING_ENTRIES: u32 = 1 << 20;

// =============================================================================
// Line Reading
// =============================================================================

/// Outcome of reading one bounded line
enum LineRead {
    /// A complete line, newline stripped
    Line(Bytes),
    /// End of stream before any byte
    Eof,
    /// End of stream after this many bytes, no newline
    Partial(usize),
    /// More than the allowed bytes arrived without a newline
    TooLong,
}

/// Read up to the next `\n`, never buffering more than `max_len` bytes
fn read_bounded_line<R: BufRead + ?Sized>(reader: &mut R, max_len: usize) -> io::Result<LineRead> {
    let mut line = BytesMut::new();

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        if available.is_empty() {
            return Ok(if line.is_empty() {
                LineRead::Eof
            } else {
                LineRead::Partial(line.len())
            });
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                if line.len() + pos > max_len {
                    return Ok(LineRead::TooLong);
                }
                line.extend_from_slice(&available[..pos]);
                reader.consume(pos + 1);
                return Ok(LineRead::Line(line.freeze()));
            }
            None => {
                let n = available.len();
                if line.len() + n > max_len {
                    return Ok(LineRead::TooLong);
                }
                line.extend_from_slice(available);
                reader.consume(n);
            }
        }
    }
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command line, newline included
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    if let Some(name) = command.filename() {
        if name.is_empty() || name.contains('\n') {
            return Err(ShareError::InvalidName(format!(
                "{:?} cannot be sent in a command line",
                name
            )));
        }
    }

    let mut line = command.to_string().into_bytes();
    line.push(b'\n');
    Ok(line)
}

/// Decode a command line (without its trailing newline)
///
/// The line is split on the first space only; everything after it is the
/// filename, spaces included.
pub fn decode_command(line: &[u8]) -> Result<Command> {
    let line = std::str::from_utf8(line)
        .map_err(|_| ShareError::Protocol("command line is not valid UTF-8".to_string()))?;

    if line.is_empty() {
        return Err(ShareError::Protocol("empty command line".to_string()));
    }

    let (verb, argument) = match line.split_once(' ') {
        Some((verb, argument)) => (verb, Some(argument)),
        None => (line, None),
    };

    let command_type = CommandType::from_verb(verb)
        .ok_or_else(|| ShareError::Protocol(format!("unknown command: {:?}", verb)))?;

    match (command_type, argument) {
        (CommandType::Dir, None) => Ok(Command::ListDirectory),
        (CommandType::Dir, Some(_)) => Err(ShareError::Protocol(
            "DIR takes no argument".to_string(),
        )),
        (command_type, Some(filename)) if !filename.is_empty() => {
            let filename = filename.to_string();
            Ok(match command_type {
                CommandType::Upload => Command::Upload { filename },
                _ => Command::Download { filename },
            })
        }
        (command_type, _) => Err(ShareError::Protocol(format!(
            "{} requires a filename",
            command_type.verb()
        ))),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one raw command line
///
/// Returns `Ok(None)` if the stream ended before any byte arrived.
pub fn read_command_line<R: BufRead + ?Sized>(
    reader: &mut R,
    max_len: usize,
) -> Result<Option<Bytes>> {
    match read_bounded_line(reader, max_len)? {
        LineRead::Line(line) => Ok(Some(line)),
        LineRead::Eof => Ok(None),
        LineRead::Partial(n) => Err(ShareError::Protocol(format!(
            "connection closed after {} bytes of an unterminated command line",
            n
        ))),
        LineRead::TooLong => Err(ShareError::Protocol(format!(
            "command line longer than {} bytes",
            max_len
        ))),
    }
}

/// Read and decode one command
///
/// Returns `Ok(None)` if the peer closed without sending anything.
pub fn read_command<R: BufRead + ?Sized>(reader: &mut R, max_len: usize) -> Result<Option<Command>> {
    match read_command_line(reader, max_len)? {
        Some(line) => decode_command(&line).map(Some),
        None => Ok(None),
    }
}

/// Write a command line to a stream
pub fn write_command<W: Write + ?Sized>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Write an OK status byte
pub fn write_ok<W: Write + ?Sized>(writer: &mut W) -> Result<()> {
    writer.write_all(&[Status::Ok as u8])?;
    Ok(())
}

/// Write an error reply: status + message length + message
pub fn write_error<W: Write + ?Sized>(writer: &mut W, status: Status, message: &str) -> Result<()> {
    let message = truncate_message(message);

    let mut frame = BytesMut::with_capacity(1 + COUNT_SIZE + message.len());
    frame.put_u8(status as u8);
    frame.put_u32(message.len() as u32);
    frame.put_slice(message.as_bytes());

    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Read a reply status
///
/// `Ok(())` for an OK status; otherwise reads the message and returns the
/// matching error.
pub fn read_status<R: Read + ?Sized>(reader: &mut R) -> Result<()> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            ShareError::Connection("connection closed before a reply arrived".to_string())
        } else {
            ShareError::from_wire(e)
        }
    })?;

    let status = Status::from_byte(byte[0]).ok_or_else(|| {
        ShareError::Protocol(format!("Unknown response status: 0x{:02x}", byte[0]))
    })?;

    if status == Status::Ok {
        return Ok(());
    }

    let len = read_u32(reader)? as usize;
    if len > MAX_MESSAGE_LEN {
        return Err(ShareError::Protocol(format!(
            "Error message too large: {} bytes (max {})",
            len, MAX_MESSAGE_LEN
        )));
    }

    let mut message = vec![0u8; len];
    reader.read_exact(&mut message).map_err(ShareError::from_wire)?;

    Err(status.into_error(String::from_utf8_lossy(&message).into_owned()))
}

/// Encode a listing payload: count + one `name\n` per entry
pub fn encode_listing(entries: &[FileEntry]) -> Vec<u8> {
    let body_len: usize = entries.iter().map(|e| e.name.len() + 1).sum();

    let mut payload = BytesMut::with_capacity(COUNT_SIZE + body_len);
    payload.put_u32(entries.len() as u32);
    for entry in entries {
        payload.put_slice(entry.name.as_bytes());
        payload.put_u8(b'\n');
    }

    payload.to_vec()
}

/// Read a listing payload
///
/// Nothing is returned unless every announced entry arrived.
pub fn read_listing<R: BufRead + ?Sized>(reader: &mut R, max_line_len: usize) -> Result<Vec<FileEntry>> {
    let count = read_u32(reader)?;
    if count > MAX_LISTING_ENTRIES {
        return Err(ShareError::Protocol(format!(
            "Listing too large: {} entries (max {})",
            count, MAX_LISTING_ENTRIES
        )));
    }

    let mut entries = Vec::with_capacity(count.min(1024) as usize);
    for index in 0..count {
        let line = match read_bounded_line(reader, max_line_len).map_err(ShareError::from_wire)? {
            LineRead::Line(line) => line,
            LineRead::Eof | LineRead::Partial(_) => {
                return Err(ShareError::Connection(format!(
                    "listing ended after {} of {} entries",
                    index, count
                )));
            }
            LineRead::TooLong => {
                return Err(ShareError::Protocol(format!(
                    "listing entry longer than {} bytes",
                    max_line_len
                )));
            }
        };

        let name = String::from_utf8(line.to_vec())
            .map_err(|_| ShareError::Protocol("listing entry is not valid UTF-8".to_string()))?;
        if name.is_empty() {
            return Err(ShareError::Protocol("empty listing entry".to_string()));
        }
        entries.push(FileEntry { name });
    }

    Ok(entries)
}

/// Write a body length prefix
pub fn write_length<W: Write + ?Sized>(writer: &mut W, len: u64) -> Result<()> {
    writer.write_all(&len.to_be_bytes())?;
    Ok(())
}

/// Read a body length prefix
pub fn read_length<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; LENGTH_SIZE];
    reader.read_exact(&mut buf).map_err(ShareError::from_wire)?;
    Ok(u64::from_be_bytes(buf))
}

/// Copy exactly `len` bytes from `reader` to `writer`
///
/// Fails with [`ShareError::Truncated`] if the reader runs dry first.
pub fn copy_exact<R, W>(reader: &mut R, writer: &mut W, len: u64) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let copied = io::copy(&mut reader.take(len), writer).map_err(ShareError::from_wire)?;
    if copied != len {
        return Err(ShareError::Truncated {
            expected: len,
            received: copied,
        });
    }
    Ok(copied)
}

fn read_u32<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; COUNT_SIZE];
    reader.read_exact(&mut buf).map_err(ShareError::from_wire)?;
    Ok(u32::from_be_bytes(buf))
}

/// Cut a message to the size limit on a char boundary
fn truncate_message(message: &str) -> &str {
    if message.len() <= MAX_MESSAGE_LEN {
        return message;
    }
    let mut end = MAX_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

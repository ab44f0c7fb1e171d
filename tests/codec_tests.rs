//! Codec Tests
//!
//! Tests for command parsing, line framing and reply envelopes.

use std::io::Cursor;

use fileshare::protocol::{
    copy_exact, decode_command, encode_command, encode_listing, read_command,
    read_command_line, read_length, read_listing, read_status, write_command, write_error,
    write_length, write_ok, Command, Status,
};
use fileshare::{ErrorKind, FileEntry, ShareError};

const MAX: usize = 4096;

// =============================================================================
// Helper Functions
// =============================================================================

fn decode_err(line: &[u8]) -> ShareError {
    decode_command(line).expect_err("line should be rejected")
}

fn entries(names: &[&str]) -> Vec<FileEntry> {
    names.iter().map(|n| FileEntry::new(*n)).collect()
}

// =============================================================================
// Command Decoding Tests
// =============================================================================

#[test]
fn test_decode_dir() {
    assert_eq!(decode_command(b"DIR").unwrap(), Command::ListDirectory);
}

#[test]
fn test_decode_upload_and_download() {
    assert_eq!(
        decode_command(b"UPLOAD report.pdf").unwrap(),
        Command::Upload {
            filename: "report.pdf".to_string()
        }
    );
    assert_eq!(
        decode_command(b"DOWNLOAD report.pdf").unwrap(),
        Command::Download {
            filename: "report.pdf".to_string()
        }
    );
}

#[test]
fn test_decode_keeps_spaces_in_filename() {
    let cmd = decode_command(b"UPLOAD my holiday  photo.jpg ").unwrap();
    assert_eq!(
        cmd,
        Command::Upload {
            filename: "my holiday  photo.jpg ".to_string()
        }
    );
}

#[test]
fn test_decode_rejects_empty_line() {
    assert!(matches!(decode_err(b""), ShareError::Protocol(_)));
}

#[test]
fn test_decode_rejects_unknown_verb() {
    assert!(matches!(decode_err(b"DELETE a.txt"), ShareError::Protocol(_)));
    // Verbs are case sensitive
    assert!(matches!(decode_err(b"dir"), ShareError::Protocol(_)));
}

#[test]
fn test_decode_rejects_missing_filename() {
    assert!(matches!(decode_err(b"UPLOAD"), ShareError::Protocol(_)));
    assert!(matches!(decode_err(b"UPLOAD "), ShareError::Protocol(_)));
    assert!(matches!(decode_err(b"DOWNLOAD"), ShareError::Protocol(_)));
}

#[test]
fn test_decode_rejects_dir_argument() {
    assert!(matches!(decode_err(b"DIR extra"), ShareError::Protocol(_)));
}

#[test]
fn test_decode_rejects_invalid_utf8() {
    let err = decode_err(b"UPLOAD \xff\xfe");
    assert_eq!(err.kind(), ErrorKind::ProtocolError);
}

// =============================================================================
// Command Encoding Tests
// =============================================================================

#[test]
fn test_encode_command_lines() {
    assert_eq!(encode_command(&Command::ListDirectory).unwrap(), b"DIR\n");
    assert_eq!(
        encode_command(&Command::Download {
            filename: "a b.txt".to_string()
        })
        .unwrap(),
        b"DOWNLOAD a b.txt\n"
    );
}

#[test]
fn test_encode_rejects_unframeable_names() {
    let newline = Command::Upload {
        filename: "a\nb".to_string(),
    };
    let empty = Command::Download {
        filename: String::new(),
    };
    assert!(matches!(encode_command(&newline), Err(ShareError::InvalidName(_))));
    assert!(matches!(encode_command(&empty), Err(ShareError::InvalidName(_))));
}

#[test]
fn test_write_then_read_command() {
    let mut wire = Vec::new();
    let cmd = Command::Upload {
        filename: "notes.md".to_string(),
    };
    write_command(&mut wire, &cmd).unwrap();
    wire.extend_from_slice(b"body bytes");

    let mut reader = Cursor::new(wire);
    assert_eq!(read_command(&mut reader, MAX).unwrap(), Some(cmd));

    // The newline is consumed, the body is left untouched
    let pos = reader.position() as usize;
    assert_eq!(&reader.get_ref()[pos..], b"body bytes");
}

// =============================================================================
// Line Framing Tests
// =============================================================================

#[test]
fn test_read_line_stops_at_newline() {
    let mut reader = Cursor::new(b"DIR\nleftover".to_vec());
    let line = read_command_line(&mut reader, MAX).unwrap().unwrap();
    assert_eq!(&line[..], b"DIR");
    assert_eq!(reader.position(), 4);
}

#[test]
fn test_read_line_eof_before_any_byte() {
    let mut reader = Cursor::new(Vec::<u8>::new());
    assert!(read_command_line(&mut reader, MAX).unwrap().is_none());
    assert!(read_command(&mut Cursor::new(Vec::<u8>::new()), MAX)
        .unwrap()
        .is_none());
}

#[test]
fn test_read_line_eof_mid_line() {
    let mut reader = Cursor::new(b"DOWNLOAD a.t".to_vec());
    let err = read_command_line(&mut reader, MAX).unwrap_err();
    assert!(matches!(err, ShareError::Protocol(_)));
}

#[test]
fn test_read_line_empty_line_is_invalid_command() {
    let mut reader = Cursor::new(b"\nDIR\n".to_vec());
    let err = read_command(&mut reader, MAX).unwrap_err();
    assert!(matches!(err, ShareError::Protocol(_)));
}

#[test]
fn test_read_line_bounded() {
    let mut exact = vec![b'A'; 16];
    exact.push(b'\n');
    let line = read_command_line(&mut Cursor::new(exact), 16).unwrap().unwrap();
    assert_eq!(line.len(), 16);

    // Over the limit, with or without a newline in sight
    let mut long = vec![b'A'; 17];
    long.push(b'\n');
    assert!(matches!(
        read_command_line(&mut Cursor::new(long), 16),
        Err(ShareError::Protocol(_))
    ));
    assert!(matches!(
        read_command_line(&mut Cursor::new(vec![b'A'; 10_000]), 16),
        Err(ShareError::Protocol(_))
    ));
}

#[test]
fn test_read_line_across_small_buffers() {
    // BufReader with a tiny capacity forces several fill_buf rounds
    let data = b"DOWNLOAD a fairly long file name.txt\n".to_vec();
    let mut reader = std::io::BufReader::with_capacity(4, Cursor::new(data));
    let cmd = read_command(&mut reader, MAX).unwrap().unwrap();
    assert_eq!(
        cmd,
        Command::Download {
            filename: "a fairly long file name.txt".to_string()
        }
    );
}

// =============================================================================
// Reply Envelope Tests
// =============================================================================

#[test]
fn test_ok_status() {
    let mut wire = Vec::new();
    write_ok(&mut wire).unwrap();
    assert_eq!(wire, vec![0x00]);
    read_status(&mut Cursor::new(wire)).unwrap();
}

#[test]
fn test_error_statuses_map_to_errors() {
    let cases = [
        (Status::NotFound, ErrorKind::NotFound),
        (Status::InvalidName, ErrorKind::InvalidName),
        (Status::ProtocolError, ErrorKind::ProtocolError),
        (Status::IoError, ErrorKind::IoFailure),
    ];

    for (status, kind) in cases {
        let mut wire = Vec::new();
        write_error(&mut wire, status, "went wrong").unwrap();
        assert_eq!(wire[0], status as u8);

        let err = read_status(&mut Cursor::new(wire)).unwrap_err();
        assert_eq!(err.kind(), kind);
        assert!(err.to_string().contains("went wrong"));
    }
}

#[test]
fn test_status_unknown_byte() {
    let err = read_status(&mut Cursor::new(vec![0x7f])).unwrap_err();
    assert!(matches!(err, ShareError::Protocol(_)));
}

#[test]
fn test_status_missing_is_connection_failure() {
    let err = read_status(&mut Cursor::new(Vec::<u8>::new())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
}

#[test]
fn test_status_for_error() {
    assert_eq!(
        Status::for_error(&ShareError::NotFound("x".into())),
        Status::NotFound
    );
    assert_eq!(
        Status::for_error(&ShareError::Truncated {
            expected: 10,
            received: 3
        }),
        Status::ProtocolError
    );
    assert_eq!(
        Status::for_error(&ShareError::Io(std::io::Error::other("disk"))),
        Status::IoError
    );
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_listing_layout() {
    let payload = encode_listing(&entries(&["a.txt", "b c"]));
    assert_eq!(&payload[..4], &2u32.to_be_bytes());
    assert_eq!(&payload[4..], b"a.txt\nb c\n");
}

#[test]
fn test_listing_read() {
    let names = entries(&["one", "two words", "three.bin"]);
    let mut reader = Cursor::new(encode_listing(&names));
    assert_eq!(read_listing(&mut reader, MAX).unwrap(), names);
}

#[test]
fn test_listing_empty() {
    let mut reader = Cursor::new(encode_listing(&[]));
    assert!(read_listing(&mut reader, MAX).unwrap().is_empty());
}

#[test]
fn test_listing_truncated_discards_partial() {
    let mut payload = encode_listing(&entries(&["a", "b", "c"]));
    payload.truncate(payload.len() - 3); // drop "c\n" and the tail of "b\n"

    let err = read_listing(&mut Cursor::new(payload), MAX).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
}

#[test]
fn test_listing_rejects_absurd_count() {
    let payload = u32::MAX.to_be_bytes().to_vec();
    let err = read_listing(&mut Cursor::new(payload), MAX).unwrap_err();
    assert!(matches!(err, ShareError::Protocol(_)));
}

// =============================================================================
// Body Framing Tests
// =============================================================================

#[test]
fn test_length_prefix() {
    let mut wire = Vec::new();
    write_length(&mut wire, 1_234_567).unwrap();
    assert_eq!(wire.len(), 8);
    assert_eq!(read_length(&mut Cursor::new(wire)).unwrap(), 1_234_567);
}

#[test]
fn test_copy_exact_stops_at_length() {
    let mut source = Cursor::new(b"0123456789".to_vec());
    let mut sink = Vec::new();
    assert_eq!(copy_exact(&mut source, &mut sink, 4).unwrap(), 4);
    assert_eq!(sink, b"0123");
    assert_eq!(source.position(), 4);
}

#[test]
fn test_copy_exact_short_source() {
    let mut source = Cursor::new(b"abc".to_vec());
    let mut sink = Vec::new();
    match copy_exact(&mut source, &mut sink, 10) {
        Err(ShareError::Truncated { expected, received }) => {
            assert_eq!(expected, 10);
            assert_eq!(received, 3);
        }
        other => panic!("expected truncation, got {:?}", other),
    }
}

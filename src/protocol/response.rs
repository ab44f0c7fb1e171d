//! Response definitions
//!
//! Every reply starts with a status byte.

use crate::error::ShareError;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    InvalidName = 0x02,
    ProtocolError = 0x03,
    IoError = 0x04,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::NotFound),
            0x02 => Some(Status::InvalidName),
            0x03 => Some(Status::ProtocolError),
            0x04 => Some(Status::IoError),
            _ => None,
        }
    }

    /// Status a server reports for a failed operation
    pub fn for_error(err: &ShareError) -> Self {
        match err {
            ShareError::NotFound(_) => Status::NotFound,
            ShareError::InvalidName(_) => Status::InvalidName,
            ShareError::Protocol(_) | ShareError::Truncated { .. } => Status::ProtocolError,
            _ => Status::IoError,
        }
    }

    /// Error a client raises for a non-OK status
    pub fn into_error(self, message: String) -> ShareError {
        match self {
            Status::Ok => ShareError::Protocol("OK status is not an error".to_string()),
            Status::NotFound => ShareError::NotFound(message),
            Status::InvalidName => ShareError::InvalidName(message),
            Status::ProtocolError => ShareError::Protocol(message),
            Status::IoError => ShareError::RemoteIo(message),
        }
    }
}

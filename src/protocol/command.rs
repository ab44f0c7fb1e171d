//! Command definitions
//!
//! Represents commands from clients.

use std::fmt;

/// Command verbs as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Dir,
    Upload,
    Download,
}

impl CommandType {
    pub fn verb(&self) -> &'static str {
        match self {
            CommandType::Dir => "DIR",
            CommandType::Upload => "UPLOAD",
            CommandType::Download => "DOWNLOAD",
        }
    }

    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "DIR" => Some(CommandType::Dir),
            "UPLOAD" => Some(CommandType::Upload),
            "DOWNLOAD" => Some(CommandType::Download),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the shared folder
    ListDirectory,

    /// Store a file; the body follows the command line
    Upload { filename: String },

    /// Fetch a file
    Download { filename: String },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::ListDirectory => CommandType::Dir,
            Command::Upload { .. } => CommandType::Upload,
            Command::Download { .. } => CommandType::Download,
        }
    }

    /// The filename argument, if the command takes one
    pub fn filename(&self) -> Option<&str> {
        match self {
            Command::ListDirectory => None,
            Command::Upload { filename } | Command::Download { filename } => {
                Some(filename.as_str())
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.filename() {
            Some(name) => write!(f, "{} {}", self.command_type().verb(), name),
            None => f.write_str(self.command_type().verb()),
        }
    }
}

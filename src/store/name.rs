//! File name validation
//!
//! A name must denote a direct child of a folder. Anything that could
//! escape the folder is refused before the filesystem is touched.

use std::path::{Component, Path};

use crate::error::{Result, ShareError};

/// Prefix reserved for in-flight temporary files
pub const TEMP_PREFIX: &str = ".fileshare-";

/// Check that `name` is a plain entry name
///
/// Rejects empty names, `.` and `..`, separators (both `/` and `\`),
/// NUL and newline characters, absolute paths, and the reserved
/// temporary prefix.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ShareError::InvalidName("empty name".to_string()));
    }

    if name.contains(['/', '\\', '\0', '\n']) {
        return Err(ShareError::InvalidName(format!(
            "{:?} contains a separator or control character",
            name
        )));
    }

    if is_temp_name(name) {
        return Err(ShareError::InvalidName(format!(
            "{:?} uses a reserved prefix",
            name
        )));
    }

    // Catches ".", "..", drive prefixes and anything else that is not a
    // single normal component on this platform.
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(ShareError::InvalidName(format!(
            "{:?} is not a plain file name",
            name
        ))),
    }
}

/// True for temporary files created by an in-flight write
fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX)
}

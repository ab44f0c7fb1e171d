//! Store Module
//!
//! Wraps one folder on disk. Used by the server for the shared folder and
//! by the client for its local folder.
//!
//! ## Guarantees
//! - Every operation validates the file name before any I/O
//! - Writes go to a temporary file in the same folder and are renamed
//!   into place, so readers see either the old or the new content
//! - Temporary files are hidden from listings

mod name;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, ShareError};

pub use name::{validate_name, TEMP_PREFIX};

/// A name visible in a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileEntry {
    pub name: String,
}

impl FileEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lazy byte source for a stored file
///
/// The length is captured when the file is opened. A concurrent replace
/// renames a new file over the name and leaves this handle on the old one.
#[derive(Debug)]
pub struct FileReader {
    file: File,
    len: u64,
}

impl FileReader {
    /// Length of the file when it was opened
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// A folder of plain files
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Wrap an existing directory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        if !root.is_dir() {
            return Err(ShareError::Config(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Folder root
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a name to a path directly inside the folder
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// List the regular files directly inside the folder
    ///
    /// Order is whatever the filesystem yields. Directories, temporary
    /// files and names that [`validate_name`] refuses are skipped.
    pub fn list(&self) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;

            // Follows symlinks, same as a later read would
            let is_file = match fs::metadata(entry.path()) {
                Ok(meta) => meta.is_file(),
                Err(_) => false,
            };
            if !is_file {
                continue;
            }

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::debug!("Skipping non UTF-8 name {:?}", raw);
                    continue;
                }
            };

            // Temporary files and names a client could not ask for again
            if validate_name(&name).is_err() {
                continue;
            }

            entries.push(FileEntry { name });
        }

        Ok(entries)
    }

    /// Open a file for streaming
    ///
    /// Anything that is not a regular file is [`ShareError::NotFound`].
    /// The type is checked before opening: opening a FIFO blocks until a
    /// writer shows up.
    pub fn read(&self, name: &str) -> Result<FileReader> {
        let path = self.resolve(name)?;

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ShareError::NotFound(name.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ShareError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ShareError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(ShareError::NotFound(name.to_string()));
        }

        Ok(FileReader {
            file,
            len: meta.len(),
        })
    }

    /// Replace `name` with exactly `size` bytes taken from `source`
    ///
    /// If the source ends early the write is abandoned with
    /// [`ShareError::Truncated`] and the old content stays in place.
    pub fn write<R: Read>(&self, name: &str, source: R, size: u64) -> Result<u64> {
        let path = self.resolve(name)?;
        let mut temp = self.temp_file()?;

        let received = copy_into(&mut source.take(size), temp.as_file_mut())?;
        if received != size {
            return Err(ShareError::Truncated {
                expected: size,
                received,
            });
        }

        commit(temp, &path)?;
        tracing::debug!("Stored {} ({} bytes)", path.display(), received);
        Ok(received)
    }

    fn temp_file(&self) -> Result<NamedTempFile> {
        Ok(temp_file_in(&self.root)?)
    }
}

/// Create a hidden temporary file in `dir`
///
/// Dropping it without [`commit`] removes it from disk.
pub(crate) fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".part")
        .tempfile_in(dir)
}

/// Flush, sync and rename a temporary file over `path`
pub(crate) fn commit(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| ShareError::Io(e.error))?;
    Ok(())
}

/// Copy through a buffered writer, returning the byte count
fn copy_into<R: Read + ?Sized>(source: &mut R, file: &mut File) -> Result<u64> {
    let mut writer = BufWriter::new(file);
    let copied = io::copy(source, &mut writer)?;
    writer.flush()?;
    Ok(copied)
}

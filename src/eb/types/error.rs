//! Custom error types for the epwing-reader crate.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum EbError {
    /// A file or directory does not exist.
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A file or directory exists but cannot be read.
    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// The underlying stream ended before the requested number of bytes was read.
    #[error("Truncated read from {}: expected {expected} bytes, but found {found}", path.display())]
    TruncatedRead {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// The text stream ended in the middle of an escape sequence or character.
    #[error("Unexpected end of file at logical position {position:#x}")]
    UnexpectedEndOfFile { position: u64 },

    /// The underlying medium rejected a seek.
    #[error("Seek to {position:#x} failed in {}: {source}", path.display())]
    SeekFailure {
        path: PathBuf,
        position: u64,
        #[source]
        source: io::Error,
    },

    /// The archive is structurally invalid (header, index, tree or bitstream).
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// A checksum validation failed, indicating data corruption.
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Any other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl EbError {
    /// Maps an error from opening `path` onto the not-found / permission kinds.
    pub(crate) fn from_open(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => EbError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => EbError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => EbError::Io(err),
        }
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        EbError::CorruptArchive(msg.into())
    }
}

/// A convenience `Result` type alias using the crate's `EbError` type.
pub type Result<T> = std::result::Result<T, EbError>;

impl From<EbError> for io::Error {
    fn from(err: EbError) -> Self {
        match err {
            EbError::Io(e) => e,
            EbError::NotFound { .. } => io::Error::new(io::ErrorKind::NotFound, err),
            EbError::PermissionDenied { .. } => io::Error::new(io::ErrorKind::PermissionDenied, err),
            EbError::TruncatedRead { .. } | EbError::UnexpectedEndOfFile { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, err)
            }
            EbError::CorruptArchive(_) | EbError::ChecksumMismatch { .. } => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
            other => io::Error::other(other),
        }
    }
}

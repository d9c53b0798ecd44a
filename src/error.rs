//! Error types for the archive library boundary and the extraction pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by an archive library.
///
/// Each variant maps onto a numeric [`code`](LibraryError::code) in the
/// minizip convention so callers that only care about a status number can
/// still get one.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("no more entries in archive")]
    EndOfList,

    #[error("invalid call for the current archive state")]
    Param,

    #[error("bad zip file: {0}")]
    BadArchive(String),

    #[error("unsupported compression method {0}")]
    UnsupportedMethod(u16),

    #[error("encrypted entries are not supported")]
    Encrypted,

    #[error("crc mismatch: expected {expected:08x}, got {actual:08x}")]
    Crc { expected: u32, actual: u32 },

    #[error("internal archive library error")]
    Internal,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LibraryError {
    pub fn code(&self) -> i32 {
        match self {
            LibraryError::Io(_) => -1,
            LibraryError::EndOfList => -100,
            LibraryError::Param => -102,
            LibraryError::BadArchive(_)
            | LibraryError::UnsupportedMethod(_)
            | LibraryError::Encrypted => -103,
            LibraryError::Internal => -104,
            LibraryError::Crc { .. } => -105,
        }
    }
}

/// Coarse classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Open,
    Metadata,
    Allocation,
    Archive,
    Advance,
    Io,
}

/// Why an archive (or one of its entries) could not be extracted.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open archive '{path}': {source}")]
    Open {
        path: PathBuf,
        source: LibraryError,
    },

    #[error("failed to read archive metadata: {0}")]
    Metadata(#[source] LibraryError),

    #[error("failed to allocate a {size} byte transfer buffer")]
    Allocation { size: usize },

    #[error("archive error {code}: {0}", code = .0.code())]
    Archive(#[source] LibraryError),

    #[error("failed to advance to the next entry: {0}")]
    Advance(#[source] LibraryError),

    #[error("failed to write '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Open { .. } => ErrorKind::Open,
            ExtractError::Metadata(_) => ErrorKind::Metadata,
            ExtractError::Allocation { .. } => ErrorKind::Allocation,
            ExtractError::Archive(_) => ErrorKind::Archive,
            ExtractError::Advance(_) => ErrorKind::Advance,
            ExtractError::Io { .. } => ErrorKind::Io,
        }
    }
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_codes_follow_minizip() {
        assert_eq!(LibraryError::EndOfList.code(), -100);
        assert_eq!(LibraryError::Crc { expected: 1, actual: 2 }.code(), -105);
        assert_eq!(LibraryError::Io(io::Error::other("disk")).code(), -1);
    }

    #[test]
    fn archive_error_message_carries_code() {
        let err = ExtractError::Archive(LibraryError::Internal);
        assert_eq!(err.kind(), ErrorKind::Archive);
        assert!(err.to_string().starts_with("archive error -104"));
    }
}

//! Archive library boundary and the scoped handles built on top of it.
//!
//! An archive library exposes a sequential cursor: one "current entry" at a
//! time, which can be opened, read in chunks and closed, then advanced. The
//! raw calls live on the [`Archive`] trait. Extraction code never calls them
//! directly; it goes through the guards in this module instead:
//!
//! - [`OpenArchive`] owns the handle and closes it exactly once.
//! - [`Entries`] is a one-shot sequence that advances the cursor.
//! - [`CurrentEntry`] is the entry under the cursor.
//! - [`EntrySession`] is an open read-session on that entry.
//!
//! Each guard mutably borrows the one above it, so the cursor cannot move
//! while an entry or its session is still alive.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ExtractError, LibraryError, Result};

/// Archive-wide information read once after open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalInfo {
    /// Number of entries in the archive
    pub entry_count: u64,
    /// Length of the archive comment in bytes
    pub comment_len: u16,
}

/// Opens archives of one particular kind.
pub trait ArchiveSource {
    type Archive: Archive;

    fn open(&self, path: &Path) -> Result<Self::Archive, LibraryError>;
}

/// Raw sequential access to an opened archive.
///
/// Implementations position the cursor on the first entry when opened.
/// Reads are only valid between [`open_current_entry`](Archive::open_current_entry)
/// and [`close_current_entry`](Archive::close_current_entry).
pub trait Archive {
    fn global_info(&mut self) -> Result<GlobalInfo, LibraryError>;

    /// Name of the entry under the cursor.
    fn current_entry_name(&mut self) -> Result<String, LibraryError>;

    fn open_current_entry(&mut self) -> Result<(), LibraryError>;

    /// Read decompressed bytes of the open entry into `buf`.
    ///
    /// Returns at most `buf.len()`, and `Ok(0)` once the entry is exhausted.
    fn read_current_entry(&mut self, buf: &mut [u8]) -> Result<usize, LibraryError>;

    fn close_current_entry(&mut self) -> Result<(), LibraryError>;

    /// Move the cursor to the next entry.
    fn goto_next_entry(&mut self) -> Result<(), LibraryError>;

    /// Release the archive. Called exactly once per opened archive.
    fn close(&mut self) -> Result<(), LibraryError>;
}

/// An opened archive that is closed exactly once, on every exit path.
pub struct OpenArchive<A: Archive> {
    inner: A,
    closed: bool,
}

impl<A: Archive> OpenArchive<A> {
    pub fn open<S>(source: &S, path: &Path) -> Result<Self>
    where
        S: ArchiveSource<Archive = A>,
    {
        let inner = source.open(path).map_err(|source| ExtractError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            inner,
            closed: false,
        })
    }

    /// Read the entry count and start walking the archive.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Metadata`] if the global info is unavailable.
    pub fn entries(&mut self) -> Result<Entries<'_, A>> {
        let info = self.inner.global_info().map_err(ExtractError::Metadata)?;
        debug!(
            entries = info.entry_count,
            comment_len = info.comment_len,
            "read archive info"
        );
        Ok(Entries {
            archive: &mut self.inner,
            count: info.entry_count,
            next: 0,
        })
    }

    /// Close the archive now and report the library's verdict.
    pub fn close(mut self) -> Result<(), LibraryError> {
        self.closed = true;
        self.inner.close()
    }
}

impl<A: Archive> Drop for OpenArchive<A> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(err) = self.inner.close() {
                warn!("error {} closing archive: {}", err.code(), err);
            }
        }
    }
}

/// One-shot walk over the entries of an archive, in archive order.
///
/// The cursor is advanced lazily: asking for entry `i + 1` moves it, so a
/// caller that stops after entry `i` never advances at all.
pub struct Entries<'a, A: Archive> {
    archive: &'a mut A,
    count: u64,
    next: u64,
}

impl<A: Archive> Entries<'_, A> {
    /// Total number of entries reported by the archive.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Yield the next entry, or `None` once `count` entries were produced.
    ///
    /// A failed advance is reported once as [`ExtractError::Advance`] and
    /// ends the sequence.
    pub fn next_entry(&mut self) -> Option<Result<CurrentEntry<'_, A>>> {
        if self.next >= self.count {
            return None;
        }

        if self.next > 0 {
            if let Err(err) = self.archive.goto_next_entry() {
                self.next = self.count;
                return Some(Err(ExtractError::Advance(err)));
            }
        }

        let index = self.next;
        self.next += 1;
        Some(Ok(CurrentEntry {
            archive: &mut *self.archive,
            index,
        }))
    }
}

/// The entry currently under the archive cursor.
pub struct CurrentEntry<'a, A: Archive> {
    archive: &'a mut A,
    index: u64,
}

impl<A: Archive> CurrentEntry<'_, A> {
    /// Zero-based position of this entry in the archive.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn name(&mut self) -> Result<String> {
        self.archive
            .current_entry_name()
            .map_err(ExtractError::Metadata)
    }

    /// Open a read-session on this entry.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Archive`] if the library refuses to open it.
    pub fn open(&mut self) -> Result<EntrySession<'_, A>> {
        self.archive
            .open_current_entry()
            .map_err(ExtractError::Archive)?;
        Ok(EntrySession {
            archive: &mut *self.archive,
            open: true,
        })
    }
}

/// An open read-session on the current entry.
///
/// Dropping the session closes it and discards any close error; call
/// [`close`](EntrySession::close) to observe that error instead.
pub struct EntrySession<'a, A: Archive> {
    archive: &'a mut A,
    open: bool,
}

impl<A: Archive> EntrySession<'_, A> {
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, LibraryError> {
        self.archive.read_current_entry(buf)
    }

    pub fn close(mut self) -> Result<(), LibraryError> {
        self.open = false;
        self.archive.close_current_entry()
    }
}

impl<A: Archive> Drop for EntrySession<'_, A> {
    fn drop(&mut self) {
        if self.open {
            self.open = false;
            if let Err(err) = self.archive.close_current_entry() {
                debug!("ignoring error {} closing entry: {}", err.code(), err);
            }
        }
    }
}

//! Fail-fast extraction of every entry of an archive.
//!
//! [`Extractor::extract_archive`] walks an archive in order and hands each
//! entry to [`Extractor::extract_current_entry`], which streams the entry
//! through a fixed-size [`TransferBuffer`] into its destination file. The
//! first failing entry stops the walk; files written before it are kept.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::archive::{Archive, ArchiveSource, CurrentEntry, EntrySession, OpenArchive};
use crate::error::{ExtractError, LibraryError, Result};
use crate::platform::{Destination, DestinationMap};
use crate::zip::ZipSource;

/// Default transfer buffer capacity (512 KiB).
pub const TRANSFER_BUFFER_SIZE: usize = 512 * 1024;

/// Fixed-capacity scratch space for moving decompressed bytes to disk.
pub struct TransferBuffer {
    data: Vec<u8>,
}

impl TransferBuffer {
    /// Allocate a zeroed buffer of exactly `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Allocation`] if the memory cannot be reserved.
    pub fn allocate(capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ExtractError::Allocation { size: capacity })?;
        data.resize(capacity, 0);
        Ok(Self { data })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Extracts archives opened by `S` to paths chosen by `D`.
pub struct Extractor<S, D> {
    source: S,
    destination: D,
    buffer_size: usize,
}

impl<S, D> Extractor<S, D>
where
    S: ArchiveSource,
    D: DestinationMap,
{
    pub fn new(source: S, destination: D) -> Self {
        Self {
            source,
            destination,
            buffer_size: TRANSFER_BUFFER_SIZE,
        }
    }

    /// Use a transfer buffer of `size` bytes (at least one) per entry.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Extract every entry of the archive at `path`.
    ///
    /// Entries are processed in archive order. Extraction stops at the first
    /// entry that fails and that entry's error is returned; entries after it
    /// are never touched and files already written are left in place.
    ///
    /// # Arguments
    ///
    /// * `path` - Filesystem path of the archive
    ///
    /// # Returns
    ///
    /// `Ok(())` only if every entry was extracted.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Open`] if the archive cannot be opened
    /// - [`ExtractError::Metadata`] if the entry count is unavailable
    /// - [`ExtractError::Advance`] if the cursor cannot move to the next entry
    /// - any error from [`extract_current_entry`](Self::extract_current_entry)
    pub fn extract_archive(&self, path: &Path) -> Result<()> {
        let mut archive = OpenArchive::open(&self.source, path)?;

        let extracted = {
            let mut entries = archive.entries()?;
            let total = entries.count();
            let mut extracted = 0u64;

            while let Some(entry) = entries.next_entry() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        error!("entry {}/{}: {}", extracted + 1, total, err);
                        return Err(err);
                    }
                };
                let index = entry.index();
                if let Err(err) = self.extract_current_entry(entry) {
                    error!("entry {}/{}: {}", index + 1, total, err);
                    return Err(err);
                }
                extracted += 1;
            }
            extracted
        };

        if let Err(err) = archive.close() {
            warn!("error {} closing {}: {}", err.code(), path.display(), err);
        }

        info!("extracted {} entries from {}", extracted, path.display());
        Ok(())
    }

    /// Extract the entry under the archive cursor to its destination.
    ///
    /// The entry's read-session is opened before the output file, and the
    /// output file is closed before the session. When several steps fail,
    /// the earliest failure is the one reported.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Metadata`] if the entry name is unavailable
    /// - [`ExtractError::Allocation`] if the transfer buffer cannot be allocated
    /// - [`ExtractError::Archive`] if the entry cannot be opened, read or closed
    /// - [`ExtractError::Io`] if the output file cannot be created or written
    pub fn extract_current_entry<A: Archive>(&self, mut entry: CurrentEntry<'_, A>) -> Result<()> {
        let name = entry.name()?;
        let mut buffer = TransferBuffer::allocate(self.buffer_size)?;
        let output_path = self.destination.map(&name);

        // Locals drop in reverse order: output file, then session, then buffer.
        let mut session = entry.open()?;
        let mut output = File::create(&output_path).map_err(|source| ExtractError::Io {
            path: output_path.clone(),
            source,
        })?;

        info!("extracting: {}", output_path.display());

        let transferred = transfer(&mut session, &mut output, &mut buffer, &output_path);
        drop(output);

        match transferred {
            Ok(()) => session.close().map_err(ExtractError::Archive),
            // The session guard still closes the entry; its result is discarded.
            Err(err) => Err(err),
        }
    }
}

impl<D: DestinationMap> Extractor<ZipSource, D> {
    /// Extractor for local ZIP files.
    pub fn zip(destination: D) -> Self {
        Self::new(ZipSource, destination)
    }
}

/// Extract every entry of the ZIP file at `zip_path` below `root`.
pub fn extract_zipfile(zip_path: &Path, root: impl Into<PathBuf>) -> Result<()> {
    Extractor::zip(Destination::Directory(root.into())).extract_archive(zip_path)
}

/// Pump decompressed chunks from `session` into `output` until the entry ends.
fn transfer<A: Archive>(
    session: &mut EntrySession<'_, A>,
    output: &mut File,
    buffer: &mut TransferBuffer,
    output_path: &Path,
) -> Result<()> {
    let buf = buffer.as_mut_slice();
    loop {
        let n = session.read(buf).map_err(ExtractError::Archive)?;
        if n == 0 {
            return Ok(());
        }

        // A library claiming more bytes than fit is a broken read, not a panic
        let chunk = buf
            .get(..n)
            .ok_or(ExtractError::Archive(LibraryError::Param))?;
        output
            .write_all(chunk)
            .map_err(|source| ExtractError::Io {
                path: output_path.to_path_buf(),
                source,
            })?;
    }
}

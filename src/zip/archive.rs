use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::archive::{Archive, ArchiveSource, GlobalInfo};
use crate::error::LibraryError;
use crate::io::{LocalFileReader, ReadAt};

use super::parser::ZipParser;
use super::structures::{CentralDirectory, CompressionMethod, ZipFileEntry};

type Result<T> = std::result::Result<T, LibraryError>;

/// Opens ZIP files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipSource;

impl ArchiveSource for ZipSource {
    type Archive = ZipArchive<LocalFileReader>;

    fn open(&self, path: &Path) -> Result<Self::Archive> {
        let reader = LocalFileReader::new(path)?;
        ZipArchive::new(reader)
    }
}

/// Sequential cursor over the entries of a ZIP archive.
///
/// Only the Central Directory header under the cursor is kept in memory;
/// advancing parses the next one.
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    directory: CentralDirectory,
    index: u64,
    /// Header under the cursor and the offset of the one after it
    current: Option<(ZipFileEntry, u64)>,
    open: Option<OpenEntry<R>>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Parse the Central Directory location and move to the first entry.
    pub fn new(reader: R) -> Result<Self> {
        let parser = ZipParser::new(Arc::new(reader));
        let directory = parser.central_directory()?;
        let current = if directory.total_entries > 0 {
            Some(parser.read_cdfh(directory.offset)?)
        } else {
            None
        };

        Ok(Self {
            parser,
            directory,
            index: 0,
            current,
            open: None,
        })
    }

    fn current(&self) -> Result<&ZipFileEntry> {
        self.current
            .as_ref()
            .map(|(entry, _)| entry)
            .ok_or(LibraryError::EndOfList)
    }
}

impl<R: ReadAt> Archive for ZipArchive<R> {
    fn global_info(&mut self) -> Result<GlobalInfo> {
        Ok(GlobalInfo {
            entry_count: self.directory.total_entries,
            comment_len: self.directory.comment_len,
        })
    }

    fn current_entry_name(&mut self) -> Result<String> {
        Ok(self.current()?.file_name.clone())
    }

    fn open_current_entry(&mut self) -> Result<()> {
        // Reopening restarts the entry from its first byte
        self.open = None;

        let entry = self.current()?;
        if entry.is_encrypted() {
            return Err(LibraryError::Encrypted);
        }

        let data_offset = self.parser.get_data_offset(entry)?;
        let region = Region {
            reader: Arc::clone(self.parser.reader()),
            offset: data_offset,
            remaining: entry.compressed_size,
        };
        let stream = match entry.compression_method {
            CompressionMethod::Stored => EntryStream::Stored(region),
            CompressionMethod::Deflate => EntryStream::Deflate(DeflateDecoder::new(region)),
            CompressionMethod::Unknown(method) => {
                return Err(LibraryError::UnsupportedMethod(method));
            }
        };

        debug!(
            name = %entry.file_name,
            method = entry.compression_method.as_u16(),
            size = entry.uncompressed_size,
            "opened entry"
        );

        self.open = Some(OpenEntry {
            stream,
            crc: Crc::new(),
            produced: 0,
            expected_crc: entry.crc32,
            expected_size: entry.uncompressed_size,
        });
        Ok(())
    }

    fn read_current_entry(&mut self, buf: &mut [u8]) -> Result<usize> {
        let open = self.open.as_mut().ok_or(LibraryError::Param)?;
        open.read(buf)
    }

    fn close_current_entry(&mut self) -> Result<()> {
        let open = self.open.take().ok_or(LibraryError::Param)?;
        open.verify()
    }

    fn goto_next_entry(&mut self) -> Result<()> {
        self.open = None;

        let next_offset = match &self.current {
            Some((_, next)) if self.index + 1 < self.directory.total_entries => *next,
            _ => return Err(LibraryError::EndOfList),
        };

        if next_offset >= self.directory.offset + self.directory.size {
            return Err(LibraryError::BadArchive(
                "central directory ends before its last entry".to_string(),
            ));
        }

        self.current = Some(self.parser.read_cdfh(next_offset)?);
        self.index += 1;
        trace!(index = self.index, "advanced to next entry");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = None;
        self.current = None;
        Ok(())
    }
}

/// Decompression state of the entry being read.
struct OpenEntry<R: ReadAt> {
    stream: EntryStream<R>,
    crc: Crc,
    produced: u64,
    expected_crc: u32,
    expected_size: u64,
}

impl<R: ReadAt> OpenEntry<R> {
    /// Never hands out more than the declared uncompressed size.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.expected_size - self.produced;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(remaining) as usize;
        let n = self.stream.read(&mut buf[..want]).map_err(data_error)?;
        if n == 0 {
            return Err(LibraryError::BadArchive(format!(
                "entry truncated after {} of {} bytes",
                self.produced, self.expected_size
            )));
        }

        self.crc.update(&buf[..n]);
        self.produced += n as u64;
        Ok(n)
    }

    /// CRC is only checked once the whole entry has been read.
    fn verify(self) -> Result<()> {
        if self.produced == self.expected_size && self.crc.sum() != self.expected_crc {
            return Err(LibraryError::Crc {
                expected: self.expected_crc,
                actual: self.crc.sum(),
            });
        }
        Ok(())
    }
}

fn data_error(err: io::Error) -> LibraryError {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
            LibraryError::BadArchive(err.to_string())
        }
        _ => LibraryError::Io(err),
    }
}

enum EntryStream<R: ReadAt> {
    Stored(Region<R>),
    Deflate(DeflateDecoder<Region<R>>),
}

impl<R: ReadAt> Read for EntryStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryStream::Stored(region) => region.read(buf),
            EntryStream::Deflate(decoder) => decoder.read(buf),
        }
    }
}

/// Compressed bytes of one entry, read sequentially from a [`ReadAt`] source.
struct Region<R: ReadAt> {
    reader: Arc<R>,
    offset: u64,
    remaining: u64,
}

impl<R: ReadAt> Read for Region<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let len = (buf.len() as u64).min(self.remaining) as usize;
        let n = self.reader.read_at(self.offset, &mut buf[..len])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive ended inside entry data",
            ));
        }

        self.offset += n as u64;
        self.remaining -= n as u64;
        Ok(n)
    }
}

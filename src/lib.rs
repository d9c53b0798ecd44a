//! # consolezip
//!
//! Fail-fast extraction of ROM archives to console storage, plus the
//! per-core lookup tables an emulator frontend needs around it.
//!
//! Extraction walks an archive strictly in order. Each entry is streamed
//! through a fixed-size transfer buffer into a destination chosen by a
//! [`DestinationMap`]; the first entry that fails stops the walk and its
//! error is returned. Files written before the failure are left in place.
//!
//! ## Features
//!
//! - Sequential, lazily parsed ZIP reader (STORED and DEFLATE, ZIP64)
//! - CRC-32 verification of every extracted entry
//! - Console destinations (PS3 internal drive, Xbox 360 cache partition)
//!   or any host directory
//! - ROM extension and keybind name tables keyed by core identity
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use consolezip::{Destination, Extractor};
//!
//! fn main() -> anyhow::Result<()> {
//!     let extractor = Extractor::zip(Destination::Directory("roms".into()));
//!     extractor.extract_archive(Path::new("pack.zip"))?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod extract;
pub mod io;
pub mod platform;
pub mod profile;
pub mod zip;

pub use archive::{Archive, ArchiveSource, GlobalInfo};
pub use cli::Cli;
pub use error::{ErrorKind, ExtractError, LibraryError};
pub use extract::{Extractor, TRANSFER_BUFFER_SIZE, extract_zipfile};
pub use io::{LocalFileReader, ReadAt};
pub use platform::{Destination, DestinationMap};
pub use zip::{ZipArchive, ZipSource};

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Crc;
use flate2::Compression;
use flate2::write::DeflateEncoder;

use consolezip::{Archive, ArchiveSource, GlobalInfo, LibraryError};

/// Counters shared between a [`StubSource`] and the archives it opens.
#[derive(Debug, Default)]
pub struct Counters {
    pub archives_opened: usize,
    pub archives_closed: usize,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub advances: usize,
    /// Byte count returned by every read call, in order
    pub reads: Vec<usize>,
}

impl Counters {
    pub fn live_sessions(&self) -> usize {
        self.sessions_opened - self.sessions_closed
    }
}

#[derive(Debug, Clone, Default)]
pub struct StubEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub fail_name: bool,
    pub fail_open: bool,
    pub fail_read: bool,
    pub fail_close: bool,
    /// Report one byte more than the buffer holds on the first read
    pub overreport_read: bool,
}

impl StubEntry {
    pub fn new(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            data: data.to_vec(),
            ..Self::default()
        }
    }
}

/// In-memory archive library with failure injection.
#[derive(Default)]
pub struct StubSource {
    pub entries: Vec<StubEntry>,
    pub fail_open: bool,
    pub fail_info: bool,
    /// Fail the advance that would move onto this index
    pub fail_advance_to: Option<usize>,
    pub counters: Rc<RefCell<Counters>>,
}

impl StubSource {
    pub fn new(entries: Vec<StubEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn counters(&self) -> std::cell::Ref<'_, Counters> {
        self.counters.borrow()
    }
}

impl ArchiveSource for StubSource {
    type Archive = StubArchive;

    fn open(&self, _path: &Path) -> Result<StubArchive, LibraryError> {
        if self.fail_open {
            return Err(LibraryError::BadArchive("stub refused to open".to_string()));
        }
        self.counters.borrow_mut().archives_opened += 1;
        Ok(StubArchive {
            entries: self.entries.clone(),
            fail_info: self.fail_info,
            fail_advance_to: self.fail_advance_to,
            cursor: 0,
            position: None,
            counters: Rc::clone(&self.counters),
        })
    }
}

pub struct StubArchive {
    entries: Vec<StubEntry>,
    fail_info: bool,
    fail_advance_to: Option<usize>,
    cursor: usize,
    /// Read offset into the current entry while a session is open
    position: Option<usize>,
    counters: Rc<RefCell<Counters>>,
}

impl StubArchive {
    fn entry(&self) -> Result<&StubEntry, LibraryError> {
        self.entries.get(self.cursor).ok_or(LibraryError::EndOfList)
    }
}

impl Archive for StubArchive {
    fn global_info(&mut self) -> Result<GlobalInfo, LibraryError> {
        if self.fail_info {
            return Err(LibraryError::Internal);
        }
        Ok(GlobalInfo {
            entry_count: self.entries.len() as u64,
            comment_len: 0,
        })
    }

    fn current_entry_name(&mut self) -> Result<String, LibraryError> {
        let entry = self.entry()?;
        if entry.fail_name {
            return Err(LibraryError::Internal);
        }
        Ok(entry.name.clone())
    }

    fn open_current_entry(&mut self) -> Result<(), LibraryError> {
        if self.position.is_some() {
            return Err(LibraryError::Param);
        }
        if self.entry()?.fail_open {
            return Err(LibraryError::BadArchive("stub entry refused to open".to_string()));
        }
        self.position = Some(0);
        self.counters.borrow_mut().sessions_opened += 1;
        Ok(())
    }

    fn read_current_entry(&mut self, buf: &mut [u8]) -> Result<usize, LibraryError> {
        let position = self.position.ok_or(LibraryError::Param)?;
        let entry = self.entry()?;
        if entry.fail_read {
            return Err(LibraryError::Internal);
        }
        if entry.overreport_read && position == 0 {
            self.counters.borrow_mut().reads.push(buf.len() + 1);
            return Ok(buf.len() + 1);
        }

        let n = buf.len().min(entry.data.len() - position);
        buf[..n].copy_from_slice(&entry.data[position..position + n]);
        self.position = Some(position + n);
        self.counters.borrow_mut().reads.push(n);
        Ok(n)
    }

    fn close_current_entry(&mut self) -> Result<(), LibraryError> {
        self.position.take().ok_or(LibraryError::Param)?;
        self.counters.borrow_mut().sessions_closed += 1;
        if self.entry()?.fail_close {
            return Err(LibraryError::Crc {
                expected: 0,
                actual: 1,
            });
        }
        Ok(())
    }

    fn goto_next_entry(&mut self) -> Result<(), LibraryError> {
        if self.position.is_some() {
            return Err(LibraryError::Param);
        }
        let next = self.cursor + 1;
        if next >= self.entries.len() {
            return Err(LibraryError::EndOfList);
        }
        if self.fail_advance_to == Some(next) {
            return Err(LibraryError::BadArchive("stub advance failure".to_string()));
        }
        self.cursor = next;
        self.counters.borrow_mut().advances += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LibraryError> {
        self.counters.borrow_mut().archives_closed += 1;
        Ok(())
    }
}

/// Builds ZIP archives byte by byte.
#[derive(Default)]
pub struct ZipFixture {
    body: Vec<u8>,
    central: Vec<u8>,
    count: u16,
    comment: Vec<u8>,
}

impl ZipFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        let crc = crc32(data);
        self.raw(name, 0, data, crc, data.len() as u32)
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let payload = encoder.finish().unwrap();
        let crc = crc32(data);
        self.raw(name, 8, &payload, crc, data.len() as u32)
    }

    /// Stored entry whose recorded CRC does not match its data.
    pub fn stored_bad_crc(self, name: &str, data: &[u8]) -> Self {
        let crc = crc32(data) ^ 0xFFFF_FFFF;
        self.raw(name, 0, data, crc, data.len() as u32)
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    pub fn raw(mut self, name: &str, method: u16, payload: &[u8], crc: u32, size: u32) -> Self {
        let offset = self.body.len() as u32;

        let lfh = &mut self.body;
        lfh.write_u32::<LittleEndian>(0x04034b50).unwrap();
        lfh.write_u16::<LittleEndian>(20).unwrap();
        lfh.write_u16::<LittleEndian>(0).unwrap();
        lfh.write_u16::<LittleEndian>(method).unwrap();
        lfh.write_u16::<LittleEndian>(0).unwrap();
        lfh.write_u16::<LittleEndian>(0x21).unwrap();
        lfh.write_u32::<LittleEndian>(crc).unwrap();
        lfh.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        lfh.write_u32::<LittleEndian>(size).unwrap();
        lfh.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        lfh.write_u16::<LittleEndian>(0).unwrap();
        lfh.extend_from_slice(name.as_bytes());
        lfh.extend_from_slice(payload);

        let cd = &mut self.central;
        cd.write_u32::<LittleEndian>(0x02014b50).unwrap();
        cd.write_u16::<LittleEndian>(20).unwrap();
        cd.write_u16::<LittleEndian>(20).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(method).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(0x21).unwrap();
        cd.write_u32::<LittleEndian>(crc).unwrap();
        cd.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        cd.write_u32::<LittleEndian>(size).unwrap();
        cd.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap();
        cd.write_u32::<LittleEndian>(0).unwrap();
        cd.write_u32::<LittleEndian>(offset).unwrap();
        cd.extend_from_slice(name.as_bytes());

        self.count += 1;
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.body;
        let cd_offset = out.len() as u32;
        out.extend_from_slice(&self.central);

        out.write_u32::<LittleEndian>(0x06054b50).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.count).unwrap();
        out.write_u16::<LittleEndian>(self.count).unwrap();
        out.write_u32::<LittleEndian>(self.central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out
    }

    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.finish()).unwrap();
    }
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// Deterministic, poorly compressible test payload.
pub fn payload(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

//! Random-access reading over the logical (decoded) byte stream.
//!
//! A [`BookStream`] owns one file handle and one decoded chunk. Reads are
//! served from the chunk; on a miss the container-specific
//! [`SliceDecoder`] decodes the chunk covering the requested position.
//!
//! ```text
//! logical pos ──► cache hit? ──yes──► copy out
//!                     │no
//!                     ▼
//!               SliceDecoder::fill (plain page / EBZip slice /
//!                                   EPWING page / S-EBXA slice)
//! ```

mod ebzip;
mod epwing;
mod plain;
mod sebxa;

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, trace};

use crate::eb::types::error::{EbError, Result};
use crate::eb::types::models::{ContainerKind, FileInfo, FormatParams};
use crate::eb::utils::{self, PAGE_SIZE};

/// Logical span decoded into the cache by one fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub start: u64,
    pub len: usize,
}

/// Container-specific strategy for decoding the chunk covering a position.
pub(crate) trait SliceDecoder: fmt::Debug + Send {
    /// Decodes the chunk holding logical `pos` into `cache`.
    ///
    /// `pos` is always below the logical size. The returned chunk must
    /// contain `pos`.
    fn fill(&mut self, raw: &mut RawFile, pos: u64, cache: &mut [u8]) -> Result<Chunk>;
}

/// The physical file behind a stream, with errors tagged by path.
#[derive(Debug)]
pub(crate) struct RawFile {
    file: File,
    path: PathBuf,
}

impl RawFile {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EbError::from_open(path, e))?;
        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(position))
            .map(|_| ())
            .map_err(|source| EbError::SeekFailure {
                path: self.path.clone(),
                position,
                source,
            })
    }

    /// Reads until `buf` is full.
    ///
    /// # Errors
    /// Returns `TruncatedRead` if the file ends first.
    pub fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut found = 0;
        while found < buf.len() {
            match self.file.read(&mut buf[found..]) {
                Ok(0) => {
                    return Err(EbError::TruncatedRead {
                        path: self.path.clone(),
                        expected: buf.len(),
                        found,
                    })
                }
                Ok(n) => found += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(EbError::Io(e)),
            }
        }
        Ok(())
    }
}

impl Read for RawFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for RawFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

/// Buffered random-access reader over one file's logical stream.
///
/// Not meant to be shared between threads; open one stream per thread over
/// the same `Arc<FileInfo>` instead.
#[derive(Debug)]
pub struct BookStream {
    info: Arc<FileInfo>,
    raw: Option<RawFile>,
    decoder: Box<dyn SliceDecoder>,
    cache: Vec<u8>,
    cache_start: u64,
    cache_len: usize,
    pos: u64,
}

impl BookStream {
    /// Opens a new stream over the file described by `info`.
    ///
    /// # Errors
    /// Returns `NotFound` or `PermissionDenied` if the file cannot be opened.
    pub fn open(info: Arc<FileInfo>) -> Result<Self> {
        let raw = RawFile::open(&info.path)?;
        let decoder: Box<dyn SliceDecoder> = match &info.params {
            FormatParams::Plain => Box::new(plain::PlainDecoder::new(info.logical_size)),
            FormatParams::DeflateSliced(p) => Box::new(ebzip::EbzipDecoder::new(p.clone(), info.slice_size, info.logical_size)),
            FormatParams::HuffmanPaged(p) => Box::new(epwing::EpwingDecoder::new(p.clone())),
            FormatParams::LzSliced(p) => Box::new(sebxa::SebxaDecoder::new(*p)),
        };
        debug!("Opened {:?} stream over {}", info.kind(), info.path.display());
        Ok(Self {
            cache: vec![0; info.slice_size],
            info,
            raw: Some(raw),
            decoder,
            cache_start: 0,
            cache_len: 0,
            pos: 0,
        })
    }

    pub fn info(&self) -> &Arc<FileInfo> {
        &self.info
    }

    pub fn kind(&self) -> ContainerKind {
        self.info.kind()
    }

    pub fn logical_size(&self) -> u64 {
        self.info.logical_size
    }

    pub fn physical_size(&self) -> u64 {
        self.info.physical_size
    }

    pub fn slice_size(&self) -> usize {
        self.info.slice_size
    }

    /// Current logical position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Moves to `pos`, clamped to `[0, logical_size]`. No I/O happens.
    pub fn seek(&mut self, pos: u64) {
        self.pos = pos.min(self.info.logical_size);
    }

    /// Moves to `offset` within the 1-based `page`.
    pub fn seek_page(&mut self, page: u64, offset: u64) {
        self.seek(utils::position(page, offset));
    }

    /// Reads up to `buf.len()` bytes from the current position.
    ///
    /// Returns `Ok(None)` at the end of the stream, otherwise the number of
    /// bytes copied, which is only short when the stream ends.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let size = self.info.logical_size;
        if self.pos >= size {
            return Ok(None);
        }
        let mut done = 0;
        while done < buf.len() && self.pos < size {
            if !self.cached(self.pos) {
                self.fill()?;
            }
            let off = (self.pos - self.cache_start) as usize;
            let n = (self.cache_len - off)
                .min(buf.len() - done)
                .min((size - self.pos) as usize);
            buf[done..done + n].copy_from_slice(&self.cache[off..off + n]);
            done += n;
            self.pos += n as u64;
        }
        Ok(Some(done))
    }

    /// Fills `buf` completely.
    ///
    /// # Errors
    /// Returns `TruncatedRead` if the stream ends before `buf` is full.
    pub fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut done = 0;
        while done < buf.len() {
            match self.read(&mut buf[done..])? {
                Some(n) => done += n,
                None => {
                    return Err(EbError::TruncatedRead {
                        path: self.info.path.clone(),
                        expected: buf.len(),
                        found: done,
                    })
                }
            }
        }
        Ok(())
    }

    /// Releases the file handle. Safe to call more than once.
    pub fn close(&mut self) {
        if self.raw.take().is_some() {
            trace!("Closed stream over {}", self.info.path.display());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.raw.is_none()
    }

    /// Checks the stored content checksum of an EBZip file.
    ///
    /// Streams the whole logical content through Adler-32 and restores the
    /// current position afterwards. Other container kinds carry no checksum
    /// and always pass.
    ///
    /// # Errors
    /// Returns `ChecksumMismatch` if the computed value differs from the header.
    pub fn verify_checksum(&mut self) -> Result<()> {
        let expected = match &self.info.params {
            FormatParams::DeflateSliced(p) => p.checksum,
            _ => return Ok(()),
        };
        let saved = self.pos;
        self.seek(0);
        let mut adler = adler2::Adler32::new();
        let mut buf = vec![0u8; self.info.slice_size];
        let result = loop {
            match self.read(&mut buf) {
                Ok(Some(n)) => adler.write_slice(&buf[..n]),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.seek(saved);
        result?;

        let actual = adler.checksum();
        debug!("EBZip checksum: expected={:#010x}, actual={:#010x}", expected, actual);
        if actual != expected {
            return Err(EbError::ChecksumMismatch { expected, actual });
        }
        Ok(())
    }

    fn cached(&self, pos: u64) -> bool {
        self.cache_len > 0 && pos >= self.cache_start && pos < self.cache_start + self.cache_len as u64
    }

    fn fill(&mut self) -> Result<()> {
        let raw = self.raw.as_mut().ok_or_else(|| {
            EbError::Io(io::Error::other(format!("stream over {} is closed", self.info.path.display())))
        })?;
        self.cache_len = 0;
        let chunk = self.decoder.fill(raw, self.pos, &mut self.cache)?;
        if chunk.len == 0 || self.pos < chunk.start || self.pos >= chunk.start + chunk.len as u64 {
            return Err(EbError::CorruptArchive(format!(
                "No data decoded for logical position {:#x}",
                self.pos
            )));
        }
        trace!(
            "Cache fill: page {} offset {} -> chunk {:#x}+{}",
            utils::page_of(self.pos),
            utils::offset_of(self.pos),
            chunk.start,
            chunk.len
        );
        self.cache_start = chunk.start;
        self.cache_len = chunk.len;
        Ok(())
    }
}

impl Read for BookStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match BookStream::read(self, buf)? {
            Some(n) => Ok(n),
            None => Ok(0),
        }
    }
}

impl Seek for BookStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(d) => self.info.logical_size.checked_add_signed(d),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
        };
        match target {
            Some(n) => {
                BookStream::seek(self, n);
                Ok(self.pos)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

/// Start of the page holding `pos`.
pub(crate) fn page_start(pos: u64) -> u64 {
    pos - pos % PAGE_SIZE
}

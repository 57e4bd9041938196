//! Core data structures for EB/EPWING container files.
//!
//! This module defines the fundamental types used throughout the library:
//! - Per-file metadata (`FileInfo`) and the per-format decode parameters
//! - Container kind and on-disk format selectors
//! - Typed media and decoration codes surfaced by the text parser

use std::path::PathBuf;
use std::sync::Arc;

use crate::eb::codec::huffman::HuffmanTree;

/// Physical encoding backing a logical byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Uncompressed, logical position equals physical position.
    Plain,
    /// EBZip: independently deflated slices behind an offset index.
    DeflateSliced,
    /// EPWING: Huffman-coded 2048-byte pages behind a page index.
    HuffmanPaged,
    /// S-EBXA: a pass-through prefix followed by LZ-coded 4096-byte slices.
    LzSliced,
}

/// On-disk format requested when opening a file.
///
/// The catalog layer knows which format a file uses (from the subbook
/// directory, the file suffix, or the catalog record). S-EBXA positions are
/// not stored in the file itself, so they travel with the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Plain,
    Ebzip,
    /// EPWING with the 32-byte header.
    Epwing,
    /// EPWING V6 with the 48-byte header, 32-bit leaves and raw pages.
    Epwing6,
    Sebxa {
        index_position: u64,
        base_position: u64,
        article_start: u64,
        article_end: u64,
    },
}

impl FileFormat {
    /// Container kind produced by this format.
    pub fn kind(&self) -> ContainerKind {
        match self {
            FileFormat::Plain => ContainerKind::Plain,
            FileFormat::Ebzip => ContainerKind::DeflateSliced,
            FileFormat::Epwing | FileFormat::Epwing6 => ContainerKind::HuffmanPaged,
            FileFormat::Sebxa { .. } => ContainerKind::LzSliced,
        }
    }
}

/// Parameters of an EBZip file, taken from its 22-byte header.
#[derive(Debug, Clone)]
pub struct EbzipParams {
    /// Compression mode nibble (1 or 2).
    pub mode: u8,
    /// Compression level (0..=5); slice size is `2048 << level`.
    pub level: u8,
    /// Width in bytes of each slice index entry (2..=5).
    pub index_width: usize,
    /// Adler-32 of the full uncompressed stream.
    pub checksum: u32,
    pub timestamp: u32,
}

/// EPWING header revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpwingVersion {
    /// Header of 32 bytes, 16-bit and 8-bit leaves only.
    V4,
    /// Header of 48 bytes, adds 32-bit leaves and stored-raw pages.
    V6,
}

impl EpwingVersion {
    /// Size of the file header in bytes.
    pub fn header_size(&self) -> usize {
        match self {
            EpwingVersion::V4 => 32,
            EpwingVersion::V6 => 48,
        }
    }
}

/// Parameters of an EPWING file.
#[derive(Debug, Clone)]
pub struct EpwingParams {
    pub version: EpwingVersion,
    pub index_position: u64,
    pub index_size: u64,
    pub frequency_position: u64,
    pub frequency_size: u64,
    /// Decoding tree built once from the frequency table and shared by every stream.
    pub tree: Arc<HuffmanTree>,
}

/// Parameters of an S-EBXA file, supplied by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SebxaParams {
    /// Physical position of the slice offset table.
    pub index_position: u64,
    /// Physical position of slice 0; other slice offsets are relative to it.
    pub base_position: u64,
    /// First logical byte of the compressed zone.
    pub article_start: u64,
    /// First logical byte after the compressed zone; also the logical size.
    pub article_end: u64,
}

/// Kind-specific decode parameters.
#[derive(Debug, Clone)]
pub enum FormatParams {
    Plain,
    DeflateSliced(EbzipParams),
    HuffmanPaged(EpwingParams),
    LzSliced(SebxaParams),
}

/// Immutable metadata describing one physical file.
///
/// Built once by [`FileInfo::open`](crate::eb::format) and then shared
/// read-only (behind an `Arc`) by every [`BookStream`](crate::eb::stream::BookStream)
/// opened over the same file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    /// Size of the decoded stream in bytes.
    pub logical_size: u64,
    /// Size of the file on disk in bytes.
    pub physical_size: u64,
    /// Size of one cached decode unit.
    pub slice_size: usize,
    pub params: FormatParams,
}

impl FileInfo {
    pub fn kind(&self) -> ContainerKind {
        match self.params {
            FormatParams::Plain => ContainerKind::Plain,
            FormatParams::DeflateSliced(_) => ContainerKind::DeflateSliced,
            FormatParams::HuffmanPaged(_) => ContainerKind::HuffmanPaged,
            FormatParams::LzSliced(_) => ContainerKind::LzSliced,
        }
    }
}

/// Image encoding named by a color graphic escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicFormat {
    Dib,
    Jpeg,
    Other(u8),
}

impl From<u8> for GraphicFormat {
    fn from(v: u8) -> Self {
        match v {
            0 => GraphicFormat::Dib,
            1 => GraphicFormat::Jpeg,
            n => GraphicFormat::Other(n),
        }
    }
}

/// Audio encoding named by a sound escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    Wave,
    Midi,
    Other(u8),
}

impl From<u8> for SoundFormat {
    fn from(v: u8) -> Self {
        match v {
            1 => SoundFormat::Wave,
            2 => SoundFormat::Midi,
            n => SoundFormat::Other(n),
        }
    }
}

/// Video encoding named by a movie escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieFormat {
    Mpeg,
    Other(u8),
}

impl From<u8> for MovieFormat {
    fn from(v: u8) -> Self {
        match v {
            1 => MovieFormat::Mpeg,
            n => MovieFormat::Other(n),
        }
    }
}

/// Text decoration style carried by the 0x1fe0 escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Italic,
    Bold,
    Other(u16),
}

impl From<u16> for Decoration {
    fn from(v: u16) -> Self {
        match v {
            1 => Decoration::Italic,
            3 => Decoration::Bold,
            n => Decoration::Other(n),
        }
    }
}

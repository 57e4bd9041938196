//! EPWING header, page index and frequency table parsing.
//!
//! # Layout
//! - Header: index position, index size, frequency position, frequency size
//!   as big-endian `u32` at offsets 0, 4, 8 and 12 (32 bytes, 48 for V6).
//! - Page index: 36-byte records. Each covers 16 logical pages with a `u32`
//!   base followed by sixteen `u16` offsets relative to that base.
//! - Frequency table (V6 only): 32-bit leaves, 6 bytes each.
//! - Frequency table: 16-bit leaves, 4 bytes each (1024 of them on V6).
//! - Frequency table: 256 `u16` frequencies for the 8-bit leaves.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::{debug, warn};

use super::read_block;
use crate::eb::codec::huffman::{HuffmanTree, Leaf, LeafKind};
use crate::eb::types::error::{EbError, Result};
use crate::eb::types::models::EpwingVersion;
use crate::eb::utils::PAGE_SIZE;

pub const INDEX_RECORD_SIZE: u64 = 36;
pub const PAGES_PER_RECORD: u64 = 16;
pub const MIN_FREQUENCY_SIZE: u64 = 512;
const V6_LEAF16_COUNT: u64 = 0x400;

/// The four table locations stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpwingHeader {
    pub index_position: u64,
    pub index_size: u64,
    pub frequency_position: u64,
    pub frequency_size: u64,
}

/// Reads the header at the current position.
///
/// # Errors
/// Returns `CorruptArchive` if the page index is smaller than one record or
/// the frequency table is smaller than the 8-bit leaf region.
pub fn parse_header<R: Read>(reader: &mut R, version: EpwingVersion) -> Result<EpwingHeader> {
    let mut b = [0u8; 48];
    let b = &mut b[..version.header_size()];
    read_block(reader, b, "EPWING header")?;

    let header = EpwingHeader {
        index_position: BigEndian::read_u32(&b[0..4]) as u64,
        index_size: BigEndian::read_u32(&b[4..8]) as u64,
        frequency_position: BigEndian::read_u32(&b[8..12]) as u64,
        frequency_size: BigEndian::read_u32(&b[12..16]) as u64,
    };
    debug!("EPWING header: {:?}", header);

    if header.index_size < INDEX_RECORD_SIZE || header.frequency_size < MIN_FREQUENCY_SIZE {
        return Err(EbError::CorruptArchive(format!(
            "EPWING tables too small: index {} bytes, frequency {} bytes",
            header.index_size, header.frequency_size
        )));
    }
    Ok(header)
}

/// Derives the logical size from the last page-index record.
///
/// A zero sub-offset in the last record marks the end of the data; the
/// pages from there on are not part of the stream.
pub fn logical_size<R: Read + Seek>(reader: &mut R, header: &EpwingHeader) -> Result<u64> {
    let records = header.index_size / INDEX_RECORD_SIZE;
    let last = header.index_position + (header.index_size - INDEX_RECORD_SIZE) / INDEX_RECORD_SIZE * INDEX_RECORD_SIZE;
    reader.seek(SeekFrom::Start(last))?;
    let mut record = [0u8; INDEX_RECORD_SIZE as usize];
    read_block(reader, &mut record, "EPWING page index record")?;

    let mut size = records * PAGES_PER_RECORD * PAGE_SIZE;
    for i in 1..PAGES_PER_RECORD as usize {
        if BigEndian::read_u16(&record[4 + i * 2..]) == 0 {
            warn!(
                "EPWING page index ends after page {} of its last record; truncating logical size",
                i
            );
            size -= PAGE_SIZE * (PAGES_PER_RECORD - i as u64);
            break;
        }
    }
    Ok(size)
}

/// Reads every leaf of the frequency table, EOF leaf included.
pub fn read_leaves<R: Read + Seek>(
    reader: &mut R,
    header: &EpwingHeader,
    version: EpwingVersion,
) -> Result<Vec<Leaf>> {
    let (leaf32, leaf16) = match version {
        EpwingVersion::V4 => (0, (header.frequency_size - MIN_FREQUENCY_SIZE) / 4),
        EpwingVersion::V6 => {
            let fixed = V6_LEAF16_COUNT * 4 + MIN_FREQUENCY_SIZE;
            if header.frequency_size < fixed {
                return Err(EbError::CorruptArchive(format!(
                    "EPWING6 frequency table of {} bytes is smaller than {}",
                    header.frequency_size, fixed
                )));
            }
            ((header.frequency_size - fixed) / 6, V6_LEAF16_COUNT)
        }
    };
    debug!("EPWING frequency table: {} 32-bit, {} 16-bit, 256 8-bit leaves", leaf32, leaf16);

    let mut leaves = Vec::with_capacity((leaf32 + leaf16) as usize + 257);
    reader.seek(SeekFrom::Start(header.frequency_position))?;
    let mut table = std::io::BufReader::new(reader);
    let truncated = |_| EbError::corrupt("EPWING frequency table truncated");

    for _ in 0..leaf32 {
        let value = table.read_u32::<BigEndian>().map_err(truncated)?;
        let frequency = table.read_u16::<BigEndian>().map_err(truncated)?;
        leaves.push(Leaf::new(LeafKind::Bits32, value, frequency as u64));
    }
    for _ in 0..leaf16 {
        let value = table.read_u16::<BigEndian>().map_err(truncated)?;
        let frequency = table.read_u16::<BigEndian>().map_err(truncated)?;
        leaves.push(Leaf::new(LeafKind::Bits16, value as u32, frequency as u64));
    }
    for value in 0..256u32 {
        let frequency = table.read_u16::<BigEndian>().map_err(truncated)?;
        leaves.push(Leaf::new(LeafKind::Bits8, value, frequency as u64));
    }
    leaves.push(Leaf::eof());
    Ok(leaves)
}

/// Parses the header and frequency table and builds the decoding tree.
///
/// Returns the header, the logical size and the tree.
pub fn parse<R: Read + Seek>(reader: &mut R, version: EpwingVersion) -> Result<(EpwingHeader, u64, HuffmanTree)> {
    reader.seek(SeekFrom::Start(0))?;
    let header = parse_header(reader, version)?;
    let size = logical_size(reader, &header)?;
    let leaves = read_leaves(reader, &header, version)?;
    let tree = HuffmanTree::build(leaves)?;
    Ok((header, size, tree))
}

/// Physical position of the compressed page holding logical `pos`.
pub fn page_location<R: Read + Seek>(reader: &mut R, index_position: u64, pos: u64) -> Result<u64> {
    let record_pos = index_position + pos / (PAGE_SIZE * PAGES_PER_RECORD) * INDEX_RECORD_SIZE;
    reader.seek(SeekFrom::Start(record_pos))?;
    let mut record = [0u8; INDEX_RECORD_SIZE as usize];
    read_block(reader, &mut record, "EPWING page index record")?;
    let slot = 4 + (pos / PAGE_SIZE % PAGES_PER_RECORD) as usize * 2;
    Ok(BigEndian::read_u32(&record[0..4]) as u64 + BigEndian::read_u16(&record[slot..]) as u64)
}

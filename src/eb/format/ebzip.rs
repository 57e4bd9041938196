//! EBZip header parsing.
//!
//! ```text
//! offset  size  field
//!      0     5  magic "EBZip"
//!      5     1  mode (high nibble) | level (low nibble)
//!      6     3  reserved
//!      9     5  logical size, big-endian
//!     14     4  Adler-32 of the logical stream
//!     18     4  timestamp
//!     22     …  slice index, (slices + 1) entries of `index_width` bytes
//! ```

use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use log::debug;

use super::read_block;
use crate::eb::types::error::{EbError, Result};
use crate::eb::types::models::EbzipParams;
use crate::eb::utils::{read_be_uint, PAGE_SIZE};

pub const HEADER_SIZE: usize = 22;
pub const MAGIC: &[u8; 5] = b"EBZip";
pub const MAX_LEVEL: u8 = 5;

/// Parsed EBZip header.
#[derive(Debug, Clone)]
pub struct EbzipHeader {
    pub params: EbzipParams,
    pub logical_size: u64,
    pub slice_size: usize,
}

/// Reads and validates the 22-byte header at the current position.
///
/// # Errors
/// Returns `CorruptArchive` on a bad magic tag, an unknown mode, a level
/// above 5, or a header shorter than 22 bytes.
pub fn parse<R: Read>(reader: &mut R) -> Result<EbzipHeader> {
    let mut b = [0u8; HEADER_SIZE];
    read_block(reader, &mut b, "EBZip header")?;

    if &b[0..5] != MAGIC {
        return Err(EbError::corrupt("Missing EBZip magic tag"));
    }
    let mode = b[5] >> 4;
    let level = b[5] & 0x0f;
    if mode != 1 && mode != 2 {
        return Err(EbError::CorruptArchive(format!("Unsupported EBZip mode {}", mode)));
    }
    if level > MAX_LEVEL {
        return Err(EbError::CorruptArchive(format!("EBZip level {} exceeds {}", level, MAX_LEVEL)));
    }

    let logical_size = read_be_uint(&b[9..14], 5);
    let checksum = BigEndian::read_u32(&b[14..18]);
    let timestamp = BigEndian::read_u32(&b[18..22]);
    let slice_size = (PAGE_SIZE as usize) << level;
    let index_width = index_width(logical_size);

    debug!(
        "EBZip header: mode={}, level={}, slice_size={}, logical_size={}, index_width={}, checksum={:#010x}",
        mode, level, slice_size, logical_size, index_width, checksum
    );

    Ok(EbzipHeader {
        params: EbzipParams { mode, level, index_width, checksum, timestamp },
        logical_size,
        slice_size,
    })
}

/// Width of one slice index entry for a stream of `logical_size` bytes.
pub fn index_width(logical_size: u64) -> usize {
    if logical_size < 1 << 16 {
        2
    } else if logical_size < 1 << 24 {
        3
    } else if logical_size < 1 << 32 {
        4
    } else {
        5
    }
}

/// Physical position of the index entry for `slice`.
pub fn index_entry_position(slice: u64, index_width: usize) -> u64 {
    HEADER_SIZE as u64 + slice * index_width as u64
}

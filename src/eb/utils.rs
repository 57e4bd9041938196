//! Low-level byte and position utilities

use byteorder::{BigEndian, ByteOrder};

/// Size of one logical page in bytes.
pub const PAGE_SIZE: u64 = 2048;

/// Converts a 1-based page number and in-page offset into a logical position.
pub fn position(page: u64, offset: u64) -> u64 {
    page.saturating_sub(1) * PAGE_SIZE + offset
}

/// Returns the 1-based page holding `pos`.
pub fn page_of(pos: u64) -> u64 {
    pos / PAGE_SIZE + 1
}

/// Returns the offset of `pos` within its page.
pub fn offset_of(pos: u64) -> u64 {
    pos % PAGE_SIZE
}

/// Read a big-endian unsigned integer of 1 to 8 bytes.
///
/// Used for the variable-width EBZip slice index entries (2 to 5 bytes).
pub fn read_be_uint(buf: &[u8], width: usize) -> u64 {
    BigEndian::read_uint(buf, width)
}

/// Decodes 2 bytes as a 4-digit packed BCD number.
pub fn bcd2(buf: &[u8]) -> u64 {
    buf[..2].iter().fold(0, |acc, &b| acc * 100 + bcd_byte(b))
}

/// Decodes 4 bytes as an 8-digit packed BCD number.
pub fn bcd4(buf: &[u8]) -> u64 {
    buf[..4].iter().fold(0, |acc, &b| acc * 100 + bcd_byte(b))
}

// Digits above 9 are taken at face value, as legacy readers do.
fn bcd_byte(b: u8) -> u64 {
    ((b >> 4) as u64) * 10 + (b & 0x0f) as u64
}

/// Returns the logical position named by a BCD page (4 bytes) and offset (2 bytes).
pub fn bcd_position(page: &[u8], offset: &[u8]) -> u64 {
    position(bcd4(page), bcd2(offset))
}

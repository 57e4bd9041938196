//! DEFLATE decompression for EBZip slices.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use log::trace;

use crate::eb::types::error::{EbError, Result};

/// Inflates one compressed slice into `out`, which must be filled exactly.
///
/// Slices are raw DEFLATE streams. Archives written by zlib-based tools
/// carry a two-byte zlib header instead; such slices are recognised by the
/// header check bits and decoded with the wrapper.
///
/// # Errors
/// Returns `CorruptArchive` if the stream is malformed or inflates to fewer
/// than `out.len()` bytes.
pub fn inflate_slice(compressed: &[u8], out: &mut [u8]) -> Result<()> {
    trace!(
        "Inflating slice: {} bytes -> {} bytes (expected)",
        compressed.len(),
        out.len()
    );
    let result = if has_zlib_header(compressed) {
        ZlibDecoder::new(compressed).read_exact(out)
    } else {
        DeflateDecoder::new(compressed).read_exact(out)
    };
    result.map_err(|e| EbError::CorruptArchive(format!("Slice inflation failed: {}", e)))
}

fn has_zlib_header(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => cmf & 0x0f == 8 && cmf >> 4 <= 7 && ((*cmf as u16) << 8 | *flg as u16) % 31 == 0,
        _ => false,
    }
}

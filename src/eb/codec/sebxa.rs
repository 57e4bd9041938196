//! LZ decoding for S-EBXA slices.
//!
//! Each slice inflates to exactly [`SLICE_SIZE`] bytes. The input is a series
//! of groups: one flag byte, read least-significant bit first, followed by up
//! to eight units. A clear bit marks a two-byte back-reference, a set bit a
//! literal byte.

use std::io::{self, BufReader, Read};

use byteorder::ReadBytesExt;
use log::trace;

use crate::eb::types::error::{EbError, Result};

/// Logical size of one S-EBXA slice.
pub const SLICE_SIZE: usize = 4096;

/// Decodes one slice from `input` into `out`.
///
/// Back-references are resolved one byte at a time against the slice being
/// written, so a reference may overlap its own output. A reference to a
/// position not yet written yields a zero byte.
///
/// # Errors
/// Returns `CorruptArchive` if `input` ends before the slice is complete.
pub fn decode_slice<R: Read>(input: R, out: &mut [u8; SLICE_SIZE]) -> Result<()> {
    let mut input = BufReader::new(input);
    let mut written = 0usize;

    while written < SLICE_SIZE {
        let flags = next_byte(&mut input)?;
        for unit in 0..8 {
            if flags & (1 << unit) == 0 {
                let c0 = next_byte(&mut input)? as usize;
                let c1 = next_byte(&mut input)? as usize;
                let mut from = (((c1 & 0xf0) << 4) + c0 + 18) % SLICE_SIZE;
                let len = ((c1 & 0x0f) + 3).min(SLICE_SIZE - written);
                for _ in 0..len {
                    out[written] = if from < written { out[from] } else { 0 };
                    written += 1;
                    from = (from + 1) % SLICE_SIZE;
                }
            } else {
                out[written] = next_byte(&mut input)?;
                written += 1;
            }
            if written >= SLICE_SIZE {
                break;
            }
        }
    }
    trace!("Decoded S-EBXA slice of {} bytes", written);
    Ok(())
}

fn next_byte<R: Read>(input: &mut R) -> Result<u8> {
    input.read_u8().map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => EbError::corrupt("S-EBXA slice input ended early"),
        _ => EbError::Io(e),
    })
}

//! S-EBXA: a pass-through prefix followed by LZ-coded 4096-byte slices.
//!
//! The logical stream ends at `article_end`, so every position at or after
//! `article_start` falls in a compressed slice.

use byteorder::{BigEndian, ByteOrder};
use log::trace;

use super::{Chunk, RawFile, SliceDecoder};
use crate::eb::codec::sebxa::{decode_slice, SLICE_SIZE};
use crate::eb::types::error::{EbError, Result};
use crate::eb::types::models::SebxaParams;

#[derive(Debug)]
pub(crate) struct SebxaDecoder {
    params: SebxaParams,
}

impl SebxaDecoder {
    pub fn new(params: SebxaParams) -> Self {
        Self { params }
    }

    /// Physical position of compressed slice `n`.
    fn slice_position(&self, raw: &mut RawFile, n: u64) -> Result<u64> {
        if n == 0 {
            return Ok(self.params.base_position);
        }
        let mut entry = [0u8; 4];
        raw.seek_to(self.params.index_position + (n - 1) * 4)?;
        raw.read_fully(&mut entry)?;
        Ok(self.params.base_position + BigEndian::read_u32(&entry) as u64)
    }
}

impl SliceDecoder for SebxaDecoder {
    fn fill(&mut self, raw: &mut RawFile, pos: u64, cache: &mut [u8]) -> Result<Chunk> {
        let SebxaParams { article_start, article_end, .. } = self.params;

        if pos < article_start {
            // Pass-through prefix, copied verbatim up to the first slice.
            let len = (article_start - pos).min(SLICE_SIZE as u64) as usize;
            raw.seek_to(pos)?;
            raw.read_fully(&mut cache[..len])?;
            return Ok(Chunk { start: pos, len });
        }

        let n = (pos - article_start) / SLICE_SIZE as u64;
        let start = article_start + n * SLICE_SIZE as u64;
        let physical = self.slice_position(raw, n)?;
        trace!("S-EBXA slice {} at {:#x}", n, physical);
        raw.seek_to(physical)?;

        let out: &mut [u8; SLICE_SIZE] = (&mut cache[..SLICE_SIZE])
            .try_into()
            .map_err(|_| EbError::corrupt("S-EBXA cache is smaller than one slice"))?;
        decode_slice(&mut *raw, out)?;
        let len = (article_end - start).min(SLICE_SIZE as u64) as usize;
        Ok(Chunk { start, len })
    }
}

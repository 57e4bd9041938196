//! Identity decoding: the logical stream is the file itself.

use super::{page_start, Chunk, RawFile, SliceDecoder};
use crate::eb::types::error::Result;
use crate::eb::utils::PAGE_SIZE;

#[derive(Debug)]
pub(crate) struct PlainDecoder {
    size: u64,
}

impl PlainDecoder {
    pub fn new(size: u64) -> Self {
        Self { size }
    }
}

impl SliceDecoder for PlainDecoder {
    fn fill(&mut self, raw: &mut RawFile, pos: u64, cache: &mut [u8]) -> Result<Chunk> {
        let start = page_start(pos);
        // The final page is read only up to the end of the file.
        let len = PAGE_SIZE.min(self.size - start) as usize;
        raw.seek_to(start)?;
        raw.read_fully(&mut cache[..len])?;
        Ok(Chunk { start, len })
    }
}

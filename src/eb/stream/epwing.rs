//! EPWING pages: Huffman-coded 2048-byte pages located through a page index.

use log::trace;

use super::{page_start, Chunk, RawFile, SliceDecoder};
use crate::eb::format::epwing::page_location;
use crate::eb::types::error::Result;
use crate::eb::types::models::{EpwingParams, EpwingVersion};
use crate::eb::utils::PAGE_SIZE;

#[derive(Debug)]
pub(crate) struct EpwingDecoder {
    params: EpwingParams,
}

impl EpwingDecoder {
    pub fn new(params: EpwingParams) -> Self {
        Self { params }
    }
}

impl SliceDecoder for EpwingDecoder {
    fn fill(&mut self, raw: &mut RawFile, pos: u64, cache: &mut [u8]) -> Result<Chunk> {
        let start = page_start(pos);
        let page = &mut cache[..PAGE_SIZE as usize];
        let physical = page_location(raw, self.params.index_position, pos)?;
        raw.seek_to(physical)?;

        if self.params.version == EpwingVersion::V6 {
            let mut control = [0u8; 1];
            raw.read_fully(&mut control)?;
            if control[0] != 0 {
                trace!("EPWING page at {:#x} stored raw", physical);
                raw.read_fully(page)?;
                return Ok(Chunk { start, len: page.len() });
            }
        }

        trace!("EPWING page at {:#x}: Huffman decoding", physical);
        self.params.tree.decode_page(&mut *raw, page)?;
        Ok(Chunk { start, len: PAGE_SIZE as usize })
    }
}

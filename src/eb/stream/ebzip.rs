//! EBZip slices: an offset index followed by independently deflated slices.

use log::trace;

use super::{Chunk, RawFile, SliceDecoder};
use crate::eb::codec::deflate;
use crate::eb::format::ebzip::index_entry_position;
use crate::eb::types::error::{EbError, Result};
use crate::eb::types::models::EbzipParams;
use crate::eb::utils::read_be_uint;

#[derive(Debug)]
pub(crate) struct EbzipDecoder {
    params: EbzipParams,
    slice_size: usize,
    size: u64,
    compressed: Vec<u8>,
}

impl EbzipDecoder {
    pub fn new(params: EbzipParams, slice_size: usize, size: u64) -> Self {
        Self { params, slice_size, size, compressed: Vec::with_capacity(slice_size) }
    }
}

impl SliceDecoder for EbzipDecoder {
    fn fill(&mut self, raw: &mut RawFile, pos: u64, cache: &mut [u8]) -> Result<Chunk> {
        let slice_size = self.slice_size as u64;
        let slice = pos / slice_size;
        let width = self.params.index_width;

        let mut entries = [0u8; 10];
        raw.seek_to(index_entry_position(slice, width))?;
        raw.read_fully(&mut entries[..width * 2])?;
        let start = read_be_uint(&entries[..width], width);
        let end = read_be_uint(&entries[width..width * 2], width);

        if end <= start || end - start > slice_size {
            return Err(EbError::CorruptArchive(format!(
                "EBZip slice {} has invalid bounds {:#x}..{:#x}",
                slice, start, end
            )));
        }
        let stored = (end - start) as usize;
        let out = &mut cache[..self.slice_size];
        raw.seek_to(start)?;
        if stored == self.slice_size {
            trace!("EBZip slice {} stored raw", slice);
            raw.read_fully(out)?;
        } else {
            trace!("EBZip slice {}: inflating {} bytes", slice, stored);
            self.compressed.resize(stored, 0);
            raw.read_fully(&mut self.compressed)?;
            deflate::inflate_slice(&self.compressed, out)?;
        }

        let chunk_start = slice * slice_size;
        let len = slice_size.min(self.size - chunk_start) as usize;
        Ok(Chunk { start: chunk_start, len })
    }
}

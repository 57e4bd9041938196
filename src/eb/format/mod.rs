//! File format parsing layer.
//!
//! This module reads the container headers and builds the immutable
//! [`FileInfo`] every [`BookStream`](crate::eb::stream::BookStream) works from.
//!
//! # Module Organization
//!
//! - [`ebzip`]: the 22-byte EBZip header and slice index geometry
//! - [`epwing`]: EPWING header, page index and Huffman frequency table
//!
//! Plain files need no header and S-EBXA positions come from the catalog,
//! so both are handled here directly.

pub mod ebzip;
pub mod epwing;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::eb::codec::sebxa;
use crate::eb::types::error::{EbError, Result};
use crate::eb::types::models::*;
use crate::eb::utils::PAGE_SIZE;

impl FileInfo {
    /// Opens `path` and reads the metadata needed to decode it as `format`.
    ///
    /// # Arguments
    /// * `path` - Location of the physical file
    /// * `format` - Container format, as recorded by the catalog
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file does not exist or cannot be read
    /// - The container header is malformed (`CorruptArchive`)
    pub fn open(path: impl AsRef<Path>, format: FileFormat) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| EbError::from_open(path, e))?;
        let physical_size = file.metadata()?.len();

        let (logical_size, slice_size, params) = match format {
            FileFormat::Plain => (physical_size, PAGE_SIZE as usize, FormatParams::Plain),
            FileFormat::Ebzip => {
                let header = ebzip::parse(&mut file)?;
                (header.logical_size, header.slice_size, FormatParams::DeflateSliced(header.params))
            }
            FileFormat::Epwing | FileFormat::Epwing6 => {
                let version = if format == FileFormat::Epwing6 {
                    EpwingVersion::V6
                } else {
                    EpwingVersion::V4
                };
                let (header, size, tree) = epwing::parse(&mut file, version)?;
                let params = EpwingParams {
                    version,
                    index_position: header.index_position,
                    index_size: header.index_size,
                    frequency_position: header.frequency_position,
                    frequency_size: header.frequency_size,
                    tree: Arc::new(tree),
                };
                (size, PAGE_SIZE as usize, FormatParams::HuffmanPaged(params))
            }
            FileFormat::Sebxa { index_position, base_position, article_start, article_end } => {
                if article_start > article_end {
                    return Err(EbError::CorruptArchive(format!(
                        "S-EBXA article start {:#x} is after its end {:#x}",
                        article_start, article_end
                    )));
                }
                let params = SebxaParams { index_position, base_position, article_start, article_end };
                (article_end, sebxa::SLICE_SIZE, FormatParams::LzSliced(params))
            }
        };

        let info = FileInfo {
            path: path.to_path_buf(),
            logical_size,
            physical_size,
            slice_size,
            params,
        };
        info!(
            "Opened {} as {:?}: logical size {} bytes, physical size {} bytes",
            path.display(),
            info.kind(),
            logical_size,
            physical_size
        );
        Ok(Arc::new(info))
    }
}

/// Fills `buf` from `reader`, reporting a short read as a corrupt structure.
pub(crate) fn read_block<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => EbError::CorruptArchive(format!("{} truncated", what)),
        _ => EbError::Io(e),
    })
}

//! # epwing-reader
//!
//! A reader for EB, EPWING and S-EBXA electronic dictionaries, including
//! books compressed with EBZip.
//!
//! Two layers are exposed:
//! - [`BookStream`]: random-access reads over the decoded byte stream of one
//!   book file, whatever its container (plain, EBZip, EPWING Huffman pages,
//!   S-EBXA LZ slices).
//! - [`BookReader`]: parses the escape-sequence markup of headings and
//!   articles and reports it to a caller-supplied [`Hook`].
//!
//! ```no_run
//! use epwing_reader::{BookReader, BookStream, FileFormat, FileInfo, PlainTextHook, TextConfig};
//!
//! # fn main() -> epwing_reader::Result<()> {
//! let info = FileInfo::open("HONMON", FileFormat::Epwing)?;
//! let stream = BookStream::open(info)?;
//! let mut reader = BookReader::new(stream, PlainTextHook::new(), TextConfig::default());
//! let text = reader.read_text_at(1, 0)?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```
pub mod eb;

// Re-export the main types for convenience
pub use eb::{
    locate::{find_directory, locate_file, LocatedFile},
    utils::{offset_of, page_of, position, PAGE_SIZE},
    BookReader, BookStream, CharCode, ContainerKind, Decoration, DiscKind, EbError, FileFormat,
    FileInfo, FormatParams, GraphicFormat, Hook, MovieFormat, PlainTextHook, Result, SoundFormat,
    StopCode, TextConfig,
};

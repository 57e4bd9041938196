//! EB / EPWING book file reading.
//!
//! # Layers
//!
//! ```text
//! text     BookReader ──► Hook            escape sequences → events
//!            │
//! stream   BookStream ──► SliceDecoder    logical position → cached chunk
//!            │
//! format   FileInfo::open                 container headers, Huffman tree
//!            │
//! codec    huffman / sebxa / deflate      pure decoding
//! ```

pub mod codec;
pub mod format;
pub mod locate;
pub mod stream;
pub mod text;
pub mod types;
pub mod utils;

pub use stream::BookStream;
pub use text::{BookReader, Hook, PlainTextHook};
pub use types::config::{CharCode, DiscKind, StopCode, TextConfig};
pub use types::error::{EbError, Result};
pub use types::models::{
    ContainerKind, Decoration, FileFormat, FileInfo, FormatParams, GraphicFormat, MovieFormat,
    SoundFormat,
};

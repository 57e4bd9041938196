//! Codec layer for the compressed container formats.
//!
//! # Submodules
//!
//! - [`huffman`][]: Huffman tree construction and EPWING page decoding
//! - [`sebxa`][]: LZ slice decoding for S-EBXA
//! - [`deflate`][]: DEFLATE slice inflation for EBZip

pub mod deflate;
pub mod huffman;
pub mod sebxa;

//! The visitor interface driven by [`BookReader`](super::BookReader).
//!
//! Every escape sequence the reader recognises maps to one callback. All
//! callbacks except [`clear`](Hook::clear) and [`result`](Hook::result) have
//! empty default bodies, so a visitor implements only what it renders.
//!
//! Positions passed to callbacks are logical positions in the same file,
//! decoded from the BCD page/offset pairs embedded in the escape.

use crate::eb::types::models::{Decoration, GraphicFormat, MovieFormat, SoundFormat};

/// Caller-supplied receiver of decoded text events.
pub trait Hook {
    /// Accumulated representation returned after each read.
    type Output;

    /// Resets the accumulated state before a new heading or article.
    fn clear(&mut self);

    /// Returns the representation accumulated since the last `clear`.
    fn result(&self) -> Self::Output;

    /// Returns `false` to stop the current read early.
    fn is_more_input(&self) -> bool {
        true
    }

    /// A single-byte character (ISO 8859-1 books).
    fn append_char(&mut self, _ch: char) {}

    /// Decoded double-byte text.
    fn append_str(&mut self, _text: &str) {}

    /// An external glyph ("gaiji") code with no Unicode equivalent.
    fn append_gaiji(&mut self, _code: u16) {}

    fn begin_narrow(&mut self) {}
    fn end_narrow(&mut self) {}

    fn begin_unicode(&mut self) {}
    fn end_unicode(&mut self) {}

    fn begin_subscript(&mut self) {}
    fn end_subscript(&mut self) {}

    fn begin_superscript(&mut self) {}
    fn end_superscript(&mut self) {}

    /// Indentation level for the following lines.
    fn set_indent(&mut self, _indent: u16) {}

    fn new_line(&mut self) {}

    fn begin_no_new_line(&mut self) {}
    fn end_no_new_line(&mut self) {}

    fn begin_emphasis(&mut self) {}
    fn end_emphasis(&mut self) {}

    fn begin_decoration(&mut self, _decoration: Decoration) {}
    fn end_decoration(&mut self) {}

    fn begin_candidate(&mut self) {}
    /// End of a candidate that leads to another candidate group at `pos`.
    fn end_candidate_group(&mut self, _pos: u64) {}
    /// End of a candidate with no further group.
    fn end_candidate_leaf(&mut self) {}

    fn begin_reference(&mut self) {}
    fn end_reference(&mut self, _pos: u64) {}

    fn begin_keyword(&mut self) {}
    fn end_keyword(&mut self) {}

    /// Monochrome image of `width` x `height` dots; both are 0 on EB discs,
    /// where the size is stored with the bitmap.
    fn begin_mono_graphic(&mut self, _width: u64, _height: u64) {}
    fn end_mono_graphic(&mut self, _pos: u64) {}

    fn begin_inline_color_graphic(&mut self, _format: GraphicFormat, _pos: u64) {}
    fn end_inline_color_graphic(&mut self) {}

    fn begin_color_graphic(&mut self, _format: GraphicFormat, _pos: u64) {}
    fn end_color_graphic(&mut self) {}

    /// Sound data stored between logical positions `start` and `end`.
    fn begin_sound(&mut self, _format: SoundFormat, _start: u64, _end: u64) {}
    fn end_sound(&mut self) {}

    /// Movie stored in an external file named `file_name`.
    fn begin_movie(&mut self, _format: MovieFormat, _width: u64, _height: u64, _file_name: &str) {}
    fn end_movie(&mut self) {}

    fn begin_graphic_reference(&mut self, _pos: u64) {}
    fn end_graphic_reference(&mut self) {}
    /// A graphic reference with no body; ends the read.
    fn set_graphic_reference(&mut self, _pos: u64) {}

    fn begin_image_page(&mut self) {}
    fn end_image_page(&mut self) {}

    /// Clickable rectangle inside an image, linking to `pos`.
    fn begin_clickable_area(&mut self, _x: u64, _y: u64, _width: u64, _height: u64, _pos: u64) {}
    fn end_clickable_area(&mut self) {}

    fn begin_ebxac_gaiji(&mut self) {}
    fn end_ebxac_gaiji(&mut self) {}
}

//! The escape-sequence parser that turns a decoded stream into hook events.
//!
//! A [`BookReader`] reads either a heading (up to the first line feed) or an
//! article body (up to the end-of-text escape or a stop code) starting at a
//! logical position, and reports what it finds to its [`Hook`].
//!
//! # Stop codes
//! Article bodies in many books are not terminated by an end-of-text escape;
//! the next entry simply begins. The reader treats an indentation or keyword
//! escape as the start of the next entry when:
//! - some text has already been seen in this read, and
//! - the escape's code pair equals the subbook's stop code, or, when the
//!   subbook has none, the escape is a keyword whose operand equals the
//!   operand of the first keyword this reader ever saw.
//!
//! The auto-detected code and any pending skip region belong to the reader
//! instance, not to one read, and carry over from one read to the next.

use log::{trace, warn};

use super::charset::{self, DoubleByte};
use super::escape::{self, Escape, ESCAPE};
use super::hook::Hook;
use crate::eb::stream::BookStream;
use crate::eb::types::config::{CharCode, DiscKind, TextConfig};
use crate::eb::types::error::{EbError, Result};
use crate::eb::types::models::{Decoration, GraphicFormat, MovieFormat, SoundFormat};
use crate::eb::utils::{self, bcd2, bcd4, bcd_position, PAGE_SIZE};

const KEYWORD_ESCAPE: u16 = 0x1f41;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Heading,
    Text,
}

/// Parser state that outlives a single read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ParserState {
    /// Operand of the first keyword escape seen.
    auto_stop_code: Option<u16>,
    /// Code byte of the escape that closes the pending skip region.
    skip_code: Option<u8>,
}

/// Rolling read-ahead window over a [`BookStream`].
#[derive(Debug)]
struct Lookahead {
    buf: Vec<u8>,
    off: usize,
    len: usize,
    /// Logical position of `buf[0]`.
    base: u64,
}

impl Lookahead {
    fn new() -> Self {
        Self { buf: vec![0; PAGE_SIZE as usize], off: 0, len: 0, base: 0 }
    }

    fn reset(&mut self, base: u64) {
        self.off = 0;
        self.len = 0;
        self.base = base;
    }

    fn position(&self) -> u64 {
        self.base + self.off as u64
    }

    fn available(&self) -> usize {
        self.len - self.off
    }

    /// Tops up the window to `want` bytes if the stream allows; returns the
    /// number of bytes available afterwards.
    fn fill(&mut self, stream: &mut BookStream, want: usize) -> Result<usize> {
        if self.available() >= want {
            return Ok(self.available());
        }
        self.buf.copy_within(self.off..self.len, 0);
        self.base += self.off as u64;
        self.len -= self.off;
        self.off = 0;
        while self.len < want {
            match stream.read(&mut self.buf[self.len..])? {
                Some(n) => self.len += n,
                None => break,
            }
        }
        Ok(self.len)
    }

    /// Like `fill`, but fails if fewer than `n` bytes remain in the stream.
    fn require(&mut self, stream: &mut BookStream, n: usize) -> Result<()> {
        if self.fill(stream, n)? < n {
            return Err(EbError::UnexpectedEndOfFile { position: self.position() });
        }
        Ok(())
    }

    fn byte(&self, i: usize) -> u8 {
        self.buf[self.off + i]
    }

    fn u16_at(&self, i: usize) -> u16 {
        u16::from_be_bytes([self.byte(i), self.byte(i + 1)])
    }

    fn bytes(&self, i: usize, n: usize) -> &[u8] {
        &self.buf[self.off + i..self.off + i + n]
    }

    fn advance(&mut self, n: usize) {
        self.off += n;
    }
}

/// Reads headings and article bodies from one book file.
#[derive(Debug)]
pub struct BookReader<H: Hook> {
    stream: BookStream,
    hook: H,
    config: TextConfig,
    state: ParserState,
    window: Lookahead,
    end: Option<u64>,
}

impl<H: Hook> BookReader<H> {
    /// Creates a reader over `stream` reporting to `hook`.
    ///
    /// # Arguments
    /// * `stream` - Decoded stream of the subbook's text file
    /// * `hook` - Visitor receiving the decoded events
    /// * `config` - Character set, disc kind and stop code of the subbook
    pub fn new(stream: BookStream, hook: H, config: TextConfig) -> Self {
        Self {
            stream,
            hook,
            config,
            state: ParserState::default(),
            window: Lookahead::new(),
            end: None,
        }
    }

    /// Reads the heading at logical position `pos`.
    ///
    /// # Errors
    /// Returns `UnexpectedEndOfFile` if the stream ends inside an escape or
    /// character, or any error of the underlying stream.
    pub fn read_heading(&mut self, pos: u64) -> Result<H::Output> {
        self.hook.clear();
        self.run(pos, Mode::Heading, false)?;
        Ok(self.hook.result())
    }

    /// Reads the heading at `offset` within the 1-based `page`.
    pub fn read_heading_at(&mut self, page: u64, offset: u64) -> Result<H::Output> {
        self.read_heading(utils::position(page, offset))
    }

    /// Reads the article body at logical position `pos`.
    ///
    /// # Errors
    /// Returns `UnexpectedEndOfFile` if the stream ends inside an escape or
    /// character, or any error of the underlying stream.
    pub fn read_text(&mut self, pos: u64) -> Result<H::Output> {
        self.hook.clear();
        self.run(pos, Mode::Text, false)?;
        Ok(self.hook.result())
    }

    /// Reads the article body at `offset` within the 1-based `page`.
    pub fn read_text_at(&mut self, page: u64, offset: u64) -> Result<H::Output> {
        self.read_text(utils::position(page, offset))
    }

    /// Returns the position just after the heading at `pos`, without
    /// reporting anything to the hook. `None` if `pos` is at the end of the
    /// stream.
    pub fn next_heading_position(&mut self, pos: u64) -> Result<Option<u64>> {
        self.run(pos, Mode::Heading, true)
    }

    /// Logical position where the last read stopped; `None` if it started at
    /// the end of the stream.
    ///
    /// After a stop code this is the position of the stop-code escape itself.
    pub fn end_position(&self) -> Option<u64> {
        self.end
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    /// Releases the underlying file handle.
    pub fn close(&mut self) {
        self.stream.close();
    }

    pub fn into_stream(self) -> BookStream {
        self.stream
    }

    fn run(&mut self, pos: u64, mode: Mode, dry_run: bool) -> Result<Option<u64>> {
        self.end = None;
        self.stream.seek(pos);
        self.window.reset(self.stream.position());
        if self.window.fill(&mut self.stream, 2)? == 0 {
            return Ok(None);
        }
        trace!("Reading {:?} at {:#x} (dry run: {})", mode, self.window.position(), dry_run);

        let mut run = Extraction {
            stream: &mut self.stream,
            window: &mut self.window,
            hook: &mut self.hook,
            state: &mut self.state,
            config: &self.config,
            mode,
            dry_run,
            printable: false,
        };
        let end = run.parse()?;
        self.end = Some(end);
        Ok(self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// One heading or article read, borrowing the reader's parts.
struct Extraction<'a, H: Hook> {
    stream: &'a mut BookStream,
    window: &'a mut Lookahead,
    hook: &'a mut H,
    state: &'a mut ParserState,
    config: &'a TextConfig,
    mode: Mode,
    dry_run: bool,
    /// Set once any character has been seen.
    printable: bool,
}

impl<H: Hook> Extraction<'_, H> {
    /// Runs until the read ends; returns the logical position it ended at.
    fn parse(&mut self) -> Result<u64> {
        loop {
            if self.window.fill(self.stream, 4)? == 0 {
                break;
            }
            let flow = if self.window.byte(0) == ESCAPE {
                self.window.require(self.stream, 2)?;
                self.escape()?
            } else {
                self.character()?;
                Flow::Continue
            };
            if flow == Flow::Stop || (!self.dry_run && !self.hook.is_more_input()) {
                break;
            }
        }
        Ok(self.window.position())
    }

    fn emit(&mut self, f: impl FnOnce(&mut H)) {
        if !self.dry_run {
            f(&mut *self.hook);
        }
    }

    fn is_stop_code(&self, code0: u16, code1: u16) -> bool {
        match self.config.stop_code {
            Some(stop) => stop.code0 == code0 && stop.code1 == code1,
            None => code0 == KEYWORD_ESCAPE && self.state.auto_stop_code == Some(code1),
        }
    }

    fn at_stop_code(&self) -> bool {
        self.printable
            && self.mode == Mode::Text
            && self.is_stop_code(self.window.u16_at(0), self.window.u16_at(2))
    }

    /// Length of escapes that are 2 bytes on EB discs when followed by a
    /// byte of 0x1f or above, and 4 bytes otherwise.
    fn disc_dependent_len(&self) -> usize {
        if self.config.disc == DiscKind::Eb && self.window.byte(2) >= 0x1f {
            2
        } else {
            4
        }
    }

    fn escape(&mut self) -> Result<Flow> {
        let code = self.window.byte(1);
        let op = escape::classify(code, self.config);
        self.window.require(self.stream, op.min_len())?;
        let w = &*self.window;

        let (len, flow) = match op {
            Escape::BeginText => (2, Flow::Continue),
            Escape::EndText => (0, Flow::Stop),
            Escape::Span(span) => {
                self.emit(|h| span.emit(h));
                (2, Flow::Continue)
            }
            Escape::Indent => {
                if self.at_stop_code() {
                    return Ok(Flow::Stop);
                }
                let indent = w.u16_at(2);
                self.emit(|h| h.set_indent(indent));
                (4, Flow::Continue)
            }
            Escape::LineFeed => {
                if self.mode == Mode::Heading {
                    (2, Flow::Stop)
                } else {
                    self.emit(|h| h.new_line());
                    (2, Flow::Continue)
                }
            }
            Escape::DiscDependent => (self.disc_dependent_len(), Flow::Continue),
            Escape::EbMonoGraphic => {
                self.emit(|h| h.begin_mono_graphic(0, 0));
                (2, Flow::Continue)
            }
            Escape::Movie => {
                let format = MovieFormat::from((w.u16_at(2) >> 12) as u8);
                let width = bcd2(w.bytes(10, 2));
                let height = bcd2(w.bytes(12, 2));
                if let Some(name) = movie_file_name(w.bytes(22, 16)) {
                    self.emit(|h| h.begin_movie(format, width, height, &name));
                }
                (46, Flow::Continue)
            }
            Escape::InlineColorGraphic | Escape::ColorGraphic => {
                let format = GraphicFormat::from((w.u16_at(2) >> 12) as u8);
                let pos = bcd_position(w.bytes(14, 4), w.bytes(18, 2));
                if op == Escape::ColorGraphic {
                    self.emit(|h| h.begin_color_graphic(format, pos));
                } else {
                    self.emit(|h| h.begin_inline_color_graphic(format, pos));
                }
                (20, Flow::Continue)
            }
            Escape::Keyword => {
                if self.at_stop_code() {
                    return Ok(Flow::Stop);
                }
                if self.state.auto_stop_code.is_none() {
                    self.state.auto_stop_code = Some(w.u16_at(2));
                }
                self.emit(|h| h.begin_keyword());
                (4, Flow::Continue)
            }
            Escape::Reference => {
                let len = if w.byte(2) != 0 { 2 } else { 4 };
                self.emit(|h| h.begin_reference());
                (len, Flow::Continue)
            }
            Escape::MonoGraphic => {
                let height = bcd4(w.bytes(4, 4));
                let width = bcd4(w.bytes(8, 4));
                if width > 0 && height > 0 {
                    self.emit(|h| h.begin_mono_graphic(width, height));
                }
                (12, Flow::Continue)
            }
            Escape::ImageBlock => {
                let len = if w.byte(2) == ESCAPE { 6 } else { 4 };
                self.window.require(self.stream, len)?;
                (len, Flow::Continue)
            }
            Escape::Sound => {
                let format = SoundFormat::from((w.u16_at(2) & 0x0f) as u8);
                let start = bcd_position(w.bytes(6, 4), w.bytes(10, 2));
                let end = bcd_position(w.bytes(12, 4), w.bytes(16, 2));
                self.emit(|h| h.begin_sound(format, start, end));
                (18, Flow::Continue)
            }
            Escape::GraphicReference => {
                let pos = bcd_position(w.bytes(2, 4), w.bytes(6, 2));
                if w.byte(8) == ESCAPE && w.byte(9) == 0x6b {
                    self.emit(|h| h.set_graphic_reference(pos));
                    (10, Flow::Stop)
                } else {
                    self.emit(|h| h.begin_graphic_reference(pos));
                    (8, Flow::Continue)
                }
            }
            Escape::ImagePage => {
                self.emit(|h| h.begin_image_page());
                (4, Flow::Continue)
            }
            Escape::ClickableArea => {
                let x = bcd2(w.bytes(8, 2));
                let y = bcd2(w.bytes(10, 2));
                let width = bcd2(w.bytes(12, 2));
                let height = bcd2(w.bytes(14, 2));
                let pos = bcd_position(w.bytes(28, 4), w.bytes(32, 2));
                self.emit(|h| h.begin_clickable_area(x, y, width, height, pos));
                (34, Flow::Continue)
            }
            Escape::EndMonoGraphic => {
                let pos = bcd_position(w.bytes(2, 4), w.bytes(6, 2));
                self.emit(|h| h.end_mono_graphic(pos));
                (8, Flow::Continue)
            }
            Escape::EndEbSound => (10, Flow::Continue),
            Escape::EndReference => {
                let pos = bcd_position(w.bytes(2, 4), w.bytes(6, 2));
                self.emit(|h| h.end_reference(pos));
                (8, Flow::Continue)
            }
            Escape::EndCandidate => {
                let page = bcd4(w.bytes(2, 4));
                let offset = bcd2(w.bytes(6, 2));
                if page == 0 && offset == 0 {
                    self.emit(|h| h.end_candidate_leaf());
                } else {
                    let pos = utils::position(page, offset);
                    self.emit(|h| h.end_candidate_group(pos));
                }
                (8, Flow::Continue)
            }
            Escape::EndImagePage => {
                self.emit(|h| h.end_image_page());
                (2, Flow::Stop)
            }
            Escape::BeginDecoration => {
                let decoration = Decoration::from(w.u16_at(2));
                self.emit(|h| h.begin_decoration(decoration));
                (self.disc_dependent_len(), Flow::Continue)
            }
            Escape::OpenSkip { terminator, len } => {
                if !self.dry_run {
                    warn!(
                        "Skipping text after unknown escape 0x1f{:02x} at {:#x} until 0x1f{:02x}",
                        code,
                        w.position(),
                        terminator
                    );
                }
                self.state.skip_code = Some(terminator);
                (len, Flow::Continue)
            }
            Escape::Other(c) => {
                if self.state.skip_code == Some(c) {
                    self.state.skip_code = None;
                }
                (2, Flow::Continue)
            }
        };
        self.window.advance(len);
        Ok(flow)
    }

    fn character(&mut self) -> Result<()> {
        self.printable = true;
        let emit = self.state.skip_code.is_none() && !self.dry_run;

        if self.config.char_code == CharCode::Iso8859_1 {
            let ch = self.window.byte(0);
            if charset::is_latin1_printable(ch) {
                if emit {
                    self.hook.append_char(ch as char);
                }
                self.window.advance(1);
            } else {
                self.window.require(self.stream, 2)?;
                let code = self.window.u16_at(0);
                if emit {
                    self.hook.append_gaiji(code);
                }
                self.window.advance(2);
            }
            return Ok(());
        }

        self.window.require(self.stream, 2)?;
        let (high, low) = (self.window.byte(0), self.window.byte(1));
        if emit {
            match charset::classify_double_byte(high, low) {
                DoubleByte::JisX0208 => self.hook.append_str(&charset::decode_jisx0208(high, low)),
                DoubleByte::Gb2312 => self.hook.append_str(&charset::decode_gb2312(high, low)),
                DoubleByte::Gaiji => self.hook.append_gaiji(self.window.u16_at(0)),
                DoubleByte::Unknown => {}
            }
        }
        self.window.advance(2);
        Ok(())
    }
}

/// Decodes the 8-character movie file name stored as JIS X 0208 codes.
///
/// Digits and letters live in row 0x23; uppercase is folded to lowercase.
/// The name ends at 0x2121 or 0x0000. Any other code makes the name invalid.
fn movie_file_name(codes: &[u8]) -> Option<String> {
    let mut name = String::with_capacity(8);
    for pair in codes.chunks_exact(2) {
        let (high, low) = (pair[0], pair[1]);
        match (high, low) {
            (0x21, 0x21) | (0x00, 0x00) => break,
            (0x23, b'0'..=b'9') | (0x23, b'a'..=b'z') => name.push(low as char),
            (0x23, b'A'..=b'Z') => name.push((low | 0x20) as char),
            _ => return None,
        }
    }
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_names() {
        let mut codes = Vec::new();
        for c in b"Mov1" {
            codes.extend_from_slice(&[0x23, *c]);
        }
        codes.extend_from_slice(&[0x21, 0x21]);
        codes.resize(16, 0);
        assert_eq!(movie_file_name(&codes).as_deref(), Some("mov1"));

        let full: Vec<u8> = b"ABCDEFGH".iter().flat_map(|c| [0x23, *c]).collect();
        assert_eq!(movie_file_name(&full).as_deref(), Some("abcdefgh"));

        let bad = [0x24, 0x22, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(movie_file_name(&bad), None);
        assert_eq!(movie_file_name(&[0u8; 16]), None);
    }
}

//! Escape-code dispatch table.
//!
//! An escape is the byte `0x1f` followed by a code byte. [`classify`] maps
//! the code byte to the operation the reader performs; the reader then
//! makes sure [`Escape::min_len`] bytes are buffered before decoding any
//! operands.

use super::hook::Hook;
use crate::eb::types::config::{CharCode, TextConfig};

pub const ESCAPE: u8 = 0x1f;

/// Two-byte escapes that only toggle a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Span {
    BeginNarrow,
    EndNarrow,
    BeginSubscript,
    EndSubscript,
    BeginUnicode,
    EndUnicode,
    BeginSuperscript,
    EndSuperscript,
    BeginNoNewLine,
    EndNoNewLine,
    BeginEmphasis,
    EndEmphasis,
    BeginCandidate,
    BeginEbxacGaiji,
    EndEbxacGaiji,
    EndMovie,
    EndInlineColorGraphic,
    EndKeyword,
    EndSound,
    EndGraphicReference,
    EndColorGraphic,
    EndClickableArea,
    EndDecoration,
}

impl Span {
    pub(crate) fn emit<H: Hook>(self, hook: &mut H) {
        match self {
            Span::BeginNarrow => hook.begin_narrow(),
            Span::EndNarrow => hook.end_narrow(),
            Span::BeginSubscript => hook.begin_subscript(),
            Span::EndSubscript => hook.end_subscript(),
            Span::BeginUnicode => hook.begin_unicode(),
            Span::EndUnicode => hook.end_unicode(),
            Span::BeginSuperscript => hook.begin_superscript(),
            Span::EndSuperscript => hook.end_superscript(),
            Span::BeginNoNewLine => hook.begin_no_new_line(),
            Span::EndNoNewLine => hook.end_no_new_line(),
            Span::BeginEmphasis => hook.begin_emphasis(),
            Span::EndEmphasis => hook.end_emphasis(),
            Span::BeginCandidate => hook.begin_candidate(),
            Span::BeginEbxacGaiji => hook.begin_ebxac_gaiji(),
            Span::EndEbxacGaiji => hook.end_ebxac_gaiji(),
            Span::EndMovie => hook.end_movie(),
            Span::EndInlineColorGraphic => hook.end_inline_color_graphic(),
            Span::EndKeyword => hook.end_keyword(),
            Span::EndSound => hook.end_sound(),
            Span::EndGraphicReference => hook.end_graphic_reference(),
            Span::EndColorGraphic => hook.end_color_graphic(),
            Span::EndClickableArea => hook.end_clickable_area(),
            Span::EndDecoration => hook.end_decoration(),
        }
    }
}

/// Operation selected by an escape code byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escape {
    /// 0x02: start of text, ignored.
    BeginText,
    /// 0x03: end of text; the read stops on it.
    EndText,
    Span(Span),
    /// 0x09: indentation, a stop-code checkpoint.
    Indent,
    /// 0x0a
    LineFeed,
    /// Escapes of 2 or 4 bytes depending on the disc (0x1a, 0x1b, 0x1e, 0x1f, and
    /// 0x1c/0x1d outside EBXA-C).
    DiscDependent,
    /// 0x32: EB monochrome image, size stored with the bitmap.
    EbMonoGraphic,
    /// 0x39
    Movie,
    /// 0x3c
    InlineColorGraphic,
    /// 0x41: keyword, a stop-code checkpoint.
    Keyword,
    /// 0x42
    Reference,
    /// 0x44
    MonoGraphic,
    /// 0x45
    ImageBlock,
    /// 0x4a
    Sound,
    /// 0x4b
    GraphicReference,
    /// 0x4c
    ImagePage,
    /// 0x4d
    ColorGraphic,
    /// 0x4f
    ClickableArea,
    /// 0x52 (EB) and 0x64 (EPWING)
    EndMonoGraphic,
    /// 0x53: EB sound end, no event.
    EndEbSound,
    /// 0x62
    EndReference,
    /// 0x63
    EndCandidate,
    /// 0x6c: ends the read.
    EndImagePage,
    /// 0xe0
    BeginDecoration,
    /// A span with no known meaning; text is suppressed until the escape
    /// with code `terminator` is seen. `len` is the escape length.
    OpenSkip { terminator: u8, len: usize },
    /// Anything else. Closes a pending skip region when the code matches.
    Other(u8),
}

impl Escape {
    /// Bytes that must be buffered before operands are decoded.
    pub(crate) fn min_len(&self) -> usize {
        match self {
            Escape::Indent
            | Escape::DiscDependent
            | Escape::Keyword
            | Escape::Reference
            | Escape::ImageBlock
            | Escape::ImagePage
            | Escape::BeginDecoration => 4,
            Escape::Movie => 46,
            Escape::InlineColorGraphic | Escape::ColorGraphic => 20,
            Escape::MonoGraphic => 12,
            Escape::Sound => 18,
            Escape::GraphicReference | Escape::EndEbSound => 10,
            Escape::ClickableArea => 34,
            Escape::EndMonoGraphic | Escape::EndReference | Escape::EndCandidate => 8,
            Escape::OpenSkip { len, .. } => *len,
            _ => 2,
        }
    }
}

/// Maps an escape code byte to its operation.
pub(crate) fn classify(code: u8, config: &TextConfig) -> Escape {
    let ebxac = config.char_code == CharCode::JisX0208Gb2312;
    match code {
        0x02 => Escape::BeginText,
        0x03 => Escape::EndText,
        0x04 => Escape::Span(Span::BeginNarrow),
        0x05 => Escape::Span(Span::EndNarrow),
        0x06 => Escape::Span(Span::BeginSubscript),
        0x07 => Escape::Span(Span::EndSubscript),
        0x09 => Escape::Indent,
        0x0a => Escape::LineFeed,
        0x0b => Escape::Span(Span::BeginUnicode),
        0x0c => Escape::Span(Span::EndUnicode),
        0x0e => Escape::Span(Span::BeginSuperscript),
        0x0f => Escape::Span(Span::EndSuperscript),
        0x10 => Escape::Span(Span::BeginNoNewLine),
        0x11 => Escape::Span(Span::EndNoNewLine),
        0x12 => Escape::Span(Span::BeginEmphasis),
        0x13 => Escape::Span(Span::EndEmphasis),
        0x14 => Escape::OpenSkip { terminator: 0x15, len: 4 },
        0x1c if ebxac => Escape::Span(Span::BeginEbxacGaiji),
        0x1d if ebxac => Escape::Span(Span::EndEbxacGaiji),
        0x1a..=0x1f => Escape::DiscDependent,
        0x32 => Escape::EbMonoGraphic,
        0x35..=0x38 | 0x3a | 0x3b | 0x3d..=0x3f | 0x49 | 0x4e | 0x70..=0x8f => {
            Escape::OpenSkip { terminator: code + 0x20, len: 2 }
        }
        0x39 => Escape::Movie,
        0x3c => Escape::InlineColorGraphic,
        0x41 => Escape::Keyword,
        0x42 => Escape::Reference,
        0x43 => Escape::Span(Span::BeginCandidate),
        0x44 => Escape::MonoGraphic,
        0x45 => Escape::ImageBlock,
        0x4a => Escape::Sound,
        0x4b => Escape::GraphicReference,
        0x4c => Escape::ImagePage,
        0x4d => Escape::ColorGraphic,
        0x4f => Escape::ClickableArea,
        0x52 | 0x64 => Escape::EndMonoGraphic,
        0x53 => Escape::EndEbSound,
        0x59 => Escape::Span(Span::EndMovie),
        0x5c => Escape::Span(Span::EndInlineColorGraphic),
        0x61 => Escape::Span(Span::EndKeyword),
        0x62 => Escape::EndReference,
        0x63 => Escape::EndCandidate,
        0x6a => Escape::Span(Span::EndSound),
        0x6b => Escape::Span(Span::EndGraphicReference),
        0x6c => Escape::EndImagePage,
        0x6d => Escape::Span(Span::EndColorGraphic),
        0x6f => Escape::Span(Span::EndClickableArea),
        0xe0 => Escape::BeginDecoration,
        0xe1 => Escape::Span(Span::EndDecoration),
        0xe4..=0xfe if code % 2 == 0 => Escape::OpenSkip { terminator: code + 1, len: 2 },
        _ => Escape::Other(code),
    }
}

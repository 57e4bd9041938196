//! Construction-time settings for the text parser.

/// Character set a subbook declares for its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharCode {
    /// Single-byte Latin text.
    Iso8859_1,
    /// Double-byte JIS X 0208 text.
    #[default]
    JisX0208,
    /// JIS X 0208 with GB 2312 regions (EBXA-C); enables the 0x1f1c gaiji escapes.
    JisX0208Gb2312,
}

/// Disc family. Changes the length of a handful of escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscKind {
    Eb,
    #[default]
    Epwing,
}

/// Escape code pair that ends an article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopCode {
    /// Full escape code, e.g. `0x1f41` or `0x1f09`.
    pub code0: u16,
    /// The 16-bit value following the escape.
    pub code1: u16,
}

impl StopCode {
    pub fn new(code0: u16, code1: u16) -> Self {
        Self { code0, code1 }
    }
}

/// Per-subbook settings for [`BookReader`](crate::eb::text::BookReader).
///
/// The default is a JIS X 0208 EPWING subbook with no stop code, in which
/// case the stop code is detected from the first keyword escape of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextConfig {
    pub char_code: CharCode,
    pub disc: DiscKind,
    pub stop_code: Option<StopCode>,
}

impl TextConfig {
    pub fn with_char_code(mut self, char_code: CharCode) -> Self {
        self.char_code = char_code;
        self
    }

    pub fn with_disc(mut self, disc: DiscKind) -> Self {
        self.disc = disc;
        self
    }

    pub fn with_stop_code(mut self, stop_code: StopCode) -> Self {
        self.stop_code = Some(stop_code);
        self
    }
}

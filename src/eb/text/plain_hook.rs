//! A ready-made [`Hook`] that renders text to a `String`.

use std::collections::HashMap;

use super::hook::Hook;

/// Default number of lines accepted before a read is cut short.
pub const DEFAULT_MAX_LINES: usize = 500;

/// Renders headings and articles as plain text.
///
/// - Full-width ASCII forms are folded to their narrow equivalents inside
///   half-width spans.
/// - Gaiji codes are replaced by an alternate string when one is
///   registered, otherwise rendered as `[GAIJI=n1234]` (narrow) or
///   `[GAIJI=w1234]` (wide).
/// - Line feeds become `'\n'`; the read stops after `max_lines` of them.
#[derive(Debug, Clone)]
pub struct PlainTextHook {
    buf: String,
    narrow: bool,
    lines: usize,
    max_lines: usize,
    narrow_alternates: HashMap<u16, String>,
    wide_alternates: HashMap<u16, String>,
}

impl Default for PlainTextHook {
    fn default() -> Self {
        Self::with_max_lines(DEFAULT_MAX_LINES)
    }
}

impl PlainTextHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            buf: String::with_capacity(2048),
            narrow: false,
            lines: 0,
            max_lines,
            narrow_alternates: HashMap::new(),
            wide_alternates: HashMap::new(),
        }
    }

    /// Registers alternate text for narrow gaiji, as found in a subbook appendix.
    pub fn with_narrow_alternates(mut self, table: HashMap<u16, String>) -> Self {
        self.narrow_alternates = table;
        self
    }

    /// Registers alternate text for wide gaiji.
    pub fn with_wide_alternates(mut self, table: HashMap<u16, String>) -> Self {
        self.wide_alternates = table;
        self
    }
}

/// Folds full-width ASCII forms and a few punctuation marks to ASCII.
pub fn wide_to_narrow(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{2019}' => '\'',
            '\u{2212}' => '-',
            '\u{201d}' => '"',
            '\u{301c}' | '\u{ffe3}' => '~',
            '\u{ff01}'..='\u{ff5e}' => char::from_u32(c as u32 - 0xfee0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

impl Hook for PlainTextHook {
    type Output = String;

    fn clear(&mut self) {
        self.buf.clear();
        self.narrow = false;
        self.lines = 0;
    }

    fn result(&self) -> String {
        self.buf.clone()
    }

    fn is_more_input(&self) -> bool {
        self.lines < self.max_lines
    }

    fn append_char(&mut self, ch: char) {
        if self.narrow {
            self.buf.push_str(&wide_to_narrow(ch.encode_utf8(&mut [0; 4])));
        } else {
            self.buf.push(ch);
        }
    }

    fn append_str(&mut self, text: &str) {
        if self.narrow {
            self.buf.push_str(&wide_to_narrow(text));
        } else {
            self.buf.push_str(text);
        }
    }

    fn append_gaiji(&mut self, code: u16) {
        let (table, tag) = if self.narrow {
            (&self.narrow_alternates, 'n')
        } else {
            (&self.wide_alternates, 'w')
        };
        match table.get(&code).filter(|alt| !alt.trim().is_empty()) {
            Some(alt) => self.buf.push_str(alt),
            None => self.buf.push_str(&format!("[GAIJI={}{:04x}]", tag, code)),
        }
    }

    fn begin_narrow(&mut self) {
        self.narrow = true;
    }

    fn end_narrow(&mut self) {
        self.narrow = false;
    }

    fn new_line(&mut self) {
        self.buf.push('\n');
        self.lines += 1;
    }
}

//! Character classification and decoding for book text.

use encoding_rs::{EUC_JP, GBK};

/// Class of a two-byte code in a JIS X 0208 book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleByte {
    /// Both bytes in 0x21..=0x7e.
    JisX0208,
    /// High byte in 0x21..=0x7e, low byte in 0xa1..=0xfe.
    Gb2312,
    /// High byte in 0xa1..=0xfe, low byte in 0x21..=0x7e.
    Gaiji,
    /// Anything else; consumed without output.
    Unknown,
}

fn is_graphic(b: u8) -> bool {
    (0x21..=0x7e).contains(&b)
}

fn is_high_graphic(b: u8) -> bool {
    (0xa1..=0xfe).contains(&b)
}

pub fn classify_double_byte(high: u8, low: u8) -> DoubleByte {
    if is_graphic(high) && is_graphic(low) {
        DoubleByte::JisX0208
    } else if is_graphic(high) && is_high_graphic(low) {
        DoubleByte::Gb2312
    } else if is_high_graphic(high) && is_graphic(low) {
        DoubleByte::Gaiji
    } else {
        DoubleByte::Unknown
    }
}

/// Returns `true` if `b` is a printable ISO 8859-1 character; any other byte
/// starts a two-byte gaiji code.
pub fn is_latin1_printable(b: u8) -> bool {
    (0x20..=0x7f).contains(&b) || b >= 0xa0
}

/// Decodes a JIS X 0208 code point (both bytes in GL) to a string.
pub fn decode_jisx0208(high: u8, low: u8) -> String {
    let bytes = [high | 0x80, low | 0x80];
    let (text, _, _) = EUC_JP.decode(&bytes);
    text.into_owned()
}

/// Decodes a GB 2312 code point (high byte in GL, low byte in GR).
pub fn decode_gb2312(high: u8, low: u8) -> String {
    let bytes = [high | 0x80, low];
    let (text, _, _) = GBK.decode(&bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_byte_ranges() {
        assert_eq!(classify_double_byte(0x30, 0x21), DoubleByte::JisX0208);
        assert_eq!(classify_double_byte(0x30, 0xa1), DoubleByte::Gb2312);
        assert_eq!(classify_double_byte(0xa1, 0x21), DoubleByte::Gaiji);
        assert_eq!(classify_double_byte(0x20, 0x21), DoubleByte::Unknown);
        assert_eq!(classify_double_byte(0xa1, 0xa1), DoubleByte::Unknown);
    }

    #[test]
    fn decodes_jis_and_gb() {
        // 0x2422 is HIRAGANA LETTER A; 0x2121 is the ideographic space.
        assert_eq!(decode_jisx0208(0x24, 0x22), "\u{3042}");
        assert_eq!(decode_jisx0208(0x21, 0x21), "\u{3000}");
        // GB 2312 0xB0A1 is U+554A.
        assert_eq!(decode_gb2312(0x30, 0xa1), "\u{554a}");
    }

    #[test]
    fn latin1_printable_ranges() {
        assert!(is_latin1_printable(b'a'));
        assert!(is_latin1_printable(0x7f));
        assert!(is_latin1_printable(0xe9));
        assert!(!is_latin1_printable(0x1e));
        assert!(!is_latin1_printable(0x85));
    }
}

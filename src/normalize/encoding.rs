//! Strict decoding of fetched page bodies.
//!
//! UTF-8 (also assumed when no charset was declared) must be well formed;
//! the first bad byte is an error. The single-byte Western labels are
//! decoded as windows-1252, which every byte maps into. Any other charset is
//! refused rather than guessed.

use crate::error::NormalizeError;

/// windows-1252 code points for bytes 0x80..=0x9F. Unassigned bytes map to
/// the C1 control of the same value.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

const UTF8_LABELS: &[&str] = &["utf-8", "utf8", "unicode-1-1-utf-8"];
const CP1252_LABELS: &[&str] = &[
    "windows-1252",
    "cp1252",
    "x-cp1252",
    "iso-8859-1",
    "iso8859-1",
    "latin1",
    "l1",
    "us-ascii",
    "ascii",
];

/// Decode `bytes` according to `charset`.
pub fn decode(bytes: &[u8], charset: Option<&str>) -> Result<String, NormalizeError> {
    let label = charset
        .map(|c| c.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "utf-8".to_string());

    if UTF8_LABELS.contains(&label.as_str()) {
        return std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| NormalizeError::InvalidUtf8 {
                offset: e.valid_up_to(),
            });
    }
    if CP1252_LABELS.contains(&label.as_str()) {
        return Ok(bytes.iter().map(|&b| cp1252_char(b)).collect());
    }
    Err(NormalizeError::UnsupportedCharset { charset: label })
}

fn cp1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => CP1252_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_is_the_default() {
        assert_eq!(decode("café".as_bytes(), None).unwrap(), "café");
        assert_eq!(decode(b"plain", Some(" UTF-8 ")).unwrap(), "plain");
    }

    #[test]
    fn test_malformed_utf8_reports_offset() {
        let err = decode(b"caf\xff\xfe market", Some("utf-8")).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidUtf8 { offset: 3 }));
    }

    #[test]
    fn test_truncated_sequence_is_malformed() {
        // first two bytes of a three-byte sequence
        let err = decode(b"ok \xe2\x82", None).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidUtf8 { offset: 3 }));
    }

    #[test]
    fn test_western_single_byte_labels() {
        assert_eq!(decode(b"caf\xe9", Some("ISO-8859-1")).unwrap(), "café");
        assert_eq!(decode(b"\x93quoted\x94", Some("windows-1252")).unwrap(), "\u{201C}quoted\u{201D}");
        assert_eq!(decode(b"\x80", Some("cp1252")).unwrap(), "\u{20AC}");
    }

    #[test]
    fn test_unknown_charset_is_refused() {
        let err = decode(b"text", Some("Shift_JIS")).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::UnsupportedCharset { ref charset } if charset == "shift_jis"
        ));
    }
}

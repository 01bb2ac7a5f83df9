//! Value text as printed by the net-snmp tools, and decoding of raw values.
//!
//! With `-OQ -Oe -Ot` the tools print values unquoted for numbers, OIDs and
//! timeticks, quoted for strings, and as a quoted space separated hex dump
//! (with a trailing space inside the quotes) for octet strings that are not
//! printable. [`strip_value`] turns any of these into raw bytes;
//! [`render_value`] goes the other way for writing stored walks.

use crate::error::{Error, Result};
use bytes::Bytes;
use encoding_rs::Encoding;

/// Replies that mean "nothing here" rather than a value.
const SOFT_MISS_PREFIXES: [&str; 4] = [
    "No more variables",
    "End of MIB",
    "No Such Object available",
    "No Such Instance currently exists",
];

/// Whether a response value is a soft miss (no such object/instance, end of MIB).
pub fn is_soft_miss(value: impl AsRef<[u8]>) -> bool {
    let value = value.as_ref().trim_ascii_start();
    SOFT_MISS_PREFIXES
        .iter()
        .any(|p| value.starts_with(p.as_bytes()))
}

/// Convert a value as printed by the tools to raw bytes.
///
/// Quoted grouped hex (`"B2 E0 7D "`) becomes the bytes it spells. Other
/// quoted values lose their quotes and outer whitespace and have doubled
/// backslashes collapsed. Unquoted values are taken verbatim.
///
/// ```
/// use snmp_acquire::value::strip_value;
///
/// assert_eq!(&strip_value("\"B2 E0 7D 2C 4D 15 \"")[..], &[0xB2, 0xE0, 0x7D, 0x2C, 0x4D, 0x15]);
/// assert_eq!(&strip_value("\"C:\\\\\"")[..], b"C:\\");
/// assert_eq!(&strip_value("42")[..], b"42");
/// ```
pub fn strip_value(value: impl AsRef<[u8]>) -> Bytes {
    let value = value.as_ref().trim_ascii();
    let Some(rest) = value.strip_prefix(b"\"") else {
        return Bytes::copy_from_slice(value);
    };

    // Drop the closing quote (or whatever the last byte is when the value
    // was truncated).
    let inner = rest.split_last().map(|(_, init)| init).unwrap_or_default();

    if inner.len() > 2 && is_hex_dump(inner) {
        return Bytes::from(decode_hex_dump(inner));
    }

    Bytes::from(collapse_backslashes(inner.trim_ascii()))
}

/// `XX XX XX ` with a mandatory trailing space.
fn is_hex_dump(value: &[u8]) -> bool {
    if value.last() != Some(&b' ') {
        return false;
    }
    value.iter().enumerate().all(|(i, b)| {
        if i % 3 == 2 {
            *b == b' '
        } else {
            b.is_ascii_hexdigit()
        }
    })
}

fn decode_hex_dump(value: &[u8]) -> Vec<u8> {
    value
        .chunks(3)
        .filter_map(|chunk| std::str::from_utf8(&chunk[..2]).ok())
        .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
        .collect()
}

fn collapse_backslashes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        out.push(raw[i]);
        if raw[i] == b'\\' && raw.get(i + 1) == Some(&b'\\') {
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

/// Render raw bytes so that [`strip_value`] reads them back unchanged.
///
/// Plain text is written quoted; anything that would not survive the round
/// trip (control characters, surrounding whitespace, backslash pairs, quotes,
/// invalid UTF-8) is written as a quoted hex dump.
pub fn render_value(value: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(value)
        && renders_as_text(text)
    {
        return format!("\"{}\"", text);
    }

    let mut out = String::with_capacity(value.len() * 3 + 2);
    out.push('"');
    for b in value {
        out.push_str(&format!("{:02X} ", b));
    }
    out.push('"');
    out
}

fn renders_as_text(text: &str) -> bool {
    text.trim() == text
        && !text.contains("\\\\")
        && !text.contains('"')
        && !text.chars().any(char::is_control)
        && !(text.len() > 2 && is_hex_dump(text.as_bytes()))
}

/// Decodes string columns with the host's character encoding.
///
/// Falls back to latin-1 when the bytes are not valid in the configured
/// encoding (UTF-8 unless configured otherwise).
#[derive(Debug, Clone, Copy)]
pub struct TextDecoder {
    encoding: &'static Encoding,
}

impl TextDecoder {
    /// Decoder for an optional encoding label such as `"utf-8"` or `"cp1252"`.
    pub fn for_label(label: Option<&str>) -> Result<Self> {
        let encoding = match label {
            None => encoding_rs::UTF_8,
            Some(label) => {
                Encoding::for_label(label.as_bytes()).ok_or_else(|| Error::UnknownEncoding {
                    label: label.to_string(),
                })?
            }
        };
        Ok(Self { encoding })
    }

    pub fn decode(&self, raw: &[u8]) -> String {
        match self
            .encoding
            .decode_without_bom_handling_and_without_replacement(raw)
        {
            Some(text) => text.into_owned(),
            None => decode_latin1(raw),
        }
    }
}

impl Default for TextDecoder {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
        }
    }
}

/// ISO-8859-1: every byte is the code point of the same value.
pub fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_decodes_to_bytes() {
        let raw = strip_value("\"B2 E0 7D 2C 4D 15 \"");
        assert_eq!(&raw[..], &[0xB2, 0xE0, 0x7D, 0x2C, 0x4D, 0x15]);
    }

    #[test]
    fn test_hex_dump_requires_trailing_space() {
        // Without the trailing space this is just text that happens to look like hex
        let raw = strip_value("\"AB CD\"");
        assert_eq!(&raw[..], b"AB CD");
    }

    #[test]
    fn test_plain_string_is_utf8_unchanged() {
        let raw = strip_value("\"Linux sw1 5.10.0 #1 SMP\"");
        assert_eq!(&raw[..], "Linux sw1 5.10.0 #1 SMP".as_bytes());

        let raw = strip_value("\"Zürich\"");
        assert_eq!(&raw[..], "Zürich".as_bytes());
    }

    #[test]
    fn test_doubled_backslashes_collapse() {
        let raw = strip_value(r#""C:\\ Label:  Serial Number 4c8f3a2b""#);
        assert_eq!(&raw[..], br"C:\ Label:  Serial Number 4c8f3a2b");
    }

    #[test]
    fn test_unquoted_values_verbatim() {
        assert_eq!(&strip_value(" 1234 ")[..], b"1234");
        let oid = ".1.3.6.1.4.1.9.1.1208";
        assert_eq!(&strip_value(oid)[..], oid.as_bytes());
    }

    #[test]
    fn test_degenerate_quotes() {
        assert_eq!(&strip_value("\"\"")[..], b"");
        assert_eq!(&strip_value("\"")[..], b"");
    }

    #[test]
    fn test_soft_miss() {
        let misses = [
            "No Such Object available on this agent at this OID",
            "No Such Instance currently exists at this OID",
            "End of MIB",
            "No more variables left in this MIB View (It is past the end of the MIB tree)",
        ];
        for text in misses {
            assert!(is_soft_miss(text), "{}", text);
        }
        let quoted = "\"No Such Object available\" is what I was named";
        assert!(!is_soft_miss(quoted));
    }

    #[test]
    fn test_render_reads_back() {
        for raw in [
            &b"Cisco IOS Software"[..],
            &[0x00, 0x1A, 0x2B, 0xFF][..],
            &b" padded "[..],
            &b"line\nbreak"[..],
            &b"\\\\share"[..],
            &b"AB CD "[..],
            &b""[..],
        ] {
            let rendered = render_value(raw);
            assert_eq!(&strip_value(&rendered)[..], raw, "via {}", rendered);
        }
    }

    #[test]
    fn test_render_shapes() {
        assert_eq!(render_value(b"eth0"), "\"eth0\"");
        assert_eq!(render_value(&[0xB2, 0xE0]), "\"B2 E0 \"");
    }

    #[test]
    fn test_decoder_falls_back_to_latin1() {
        let decoder = TextDecoder::default();
        assert_eq!(decoder.decode("Zürich".as_bytes()), "Zürich");
        // 0xFC is 'ü' in latin-1 and invalid on its own in UTF-8
        assert_eq!(decoder.decode(b"Z\xFCrich"), "Zürich");
    }

    #[test]
    fn test_decoder_with_configured_encoding() {
        let decoder = TextDecoder::for_label(Some("cp1252")).unwrap();
        // 0x80 is the euro sign in windows-1252
        assert_eq!(decoder.decode(b"\x80 5"), "€ 5");

        assert!(TextDecoder::for_label(Some("klingon")).is_err());
    }
}

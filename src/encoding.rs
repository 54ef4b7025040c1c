//! Provide methods and data structures for output encodings.
//!
//! This module is based on `libxml/encoding.h`, `encoding.c`, and so on in `libxml2-v2.11.8`.
//! Please refer to original libxml2 documents also.
//!
//! Conversions are delegated to `encoding_rs`.
//! Because `encoding_rs` does not provide encoders for UTF-16,
//! and maps ISO-8859-1 to windows-1252, those are handled here.

// Copyright of the original code is the following.
// --------
// Summary: interface for the encoding conversion functions
// Description: interface for the encoding conversion functions needed for
//              XML basic encoding and iconv() support.
//
// Copy: See Copyright for the status of this software.
//
// Author: Daniel Veillard
// -------
// encoding.c : implements the encoding conversion functions needed for XML
//
// See Copyright for the status of this software.
//
// daniel@veillard.com

use encoding_rs::{
    EncoderResult, Encoding, UTF_8,
    mem::{convert_utf8_to_latin1_lossy, str_latin1_up_to},
};

/// Encodings that are not provided (or not provided correctly) by `encoding_rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomEncoding {
    /// UTF-16 with a little-endian BOM.
    UTF16,
    UTF16LE,
    UTF16BE,
    ISO8859_1,
    ASCII,
}

impl CustomEncoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::UTF16 => "UTF-16",
            Self::UTF16LE => "UTF-16LE",
            Self::UTF16BE => "UTF-16BE",
            Self::ISO8859_1 => "ISO-8859-1",
            Self::ASCII => "US-ASCII",
        }
    }
}

/// A handler converting UTF-8 into an output encoding.
#[doc(alias = "xmlCharEncodingHandler")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlCharEncodingHandler {
    Predefined(&'static Encoding),
    Custom(CustomEncoding),
}

impl XmlCharEncodingHandler {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Predefined(enc) => enc.name(),
            Self::Custom(enc) => enc.name(),
        }
    }

    pub fn is_utf8(&self) -> bool {
        matches!(self, Self::Predefined(enc) if *enc == UTF_8)
    }

    pub(crate) fn encoder(&self) -> XmlEncoder {
        match self {
            Self::Predefined(enc) => XmlEncoder::Predefined(Box::new(enc.new_encoder())),
            Self::Custom(enc) => XmlEncoder::Custom {
                encoding: *enc,
                init: true,
            },
        }
    }
}

/// Search in the registered set the handler able to write in the given encoding.
///
/// Encodings that `encoding_rs` can only decode are not returned.
#[doc(alias = "xmlFindCharEncodingHandler")]
pub fn find_encoding_handler(name: &str) -> Option<XmlCharEncodingHandler> {
    let name = name.trim().to_ascii_uppercase();
    let custom = match name.as_str() {
        "UTF-16" | "UTF16" => Some(CustomEncoding::UTF16),
        "UTF-16LE" | "UTF16LE" => Some(CustomEncoding::UTF16LE),
        "UTF-16BE" | "UTF16BE" => Some(CustomEncoding::UTF16BE),
        "ISO-8859-1" | "ISO-LATIN-1" | "ISO LATIN 1" | "LATIN1" => {
            Some(CustomEncoding::ISO8859_1)
        }
        "ASCII" | "US-ASCII" => Some(CustomEncoding::ASCII),
        _ => None,
    };
    if let Some(custom) = custom {
        return Some(XmlCharEncodingHandler::Custom(custom));
    }
    let encoding = Encoding::for_label(name.as_bytes())?;
    // the replacement encoding and UTF-16 cannot be produced by `encoding_rs`
    if encoding.output_encoding() != encoding {
        return None;
    }
    Some(XmlCharEncodingHandler::Predefined(encoding))
}

/// The state of one conversion.
pub(crate) enum XmlEncoder {
    Predefined(Box<encoding_rs::Encoder>),
    Custom { encoding: CustomEncoding, init: bool },
}

impl XmlEncoder {
    /// Convert `src` and append the result to `out`.
    ///
    /// Characters that cannot be represented are written as decimal character references.
    pub(crate) fn encode(&mut self, src: &str, last: bool, out: &mut Vec<u8>) {
        match self {
            Self::Predefined(encoder) => {
                let mut src = src;
                let len = encoder
                    .max_buffer_length_from_utf8_without_replacement(src.len())
                    .unwrap_or(src.len() * 4 + 16);
                let mut dst = vec![0; len.max(16)];
                loop {
                    let (res, read, write) =
                        encoder.encode_from_utf8_without_replacement(src, &mut dst, last);
                    out.extend_from_slice(&dst[..write]);
                    src = &src[read..];
                    match res {
                        EncoderResult::InputEmpty => break,
                        EncoderResult::OutputFull => {}
                        EncoderResult::Unmappable(c) => {
                            out.extend_from_slice(format!("&#{};", c as u32).as_bytes());
                        }
                    }
                }
            }
            Self::Custom { encoding, init } => {
                if std::mem::take(init) && *encoding == CustomEncoding::UTF16 {
                    out.extend_from_slice(&[0xFF, 0xFE]);
                }
                match encoding {
                    CustomEncoding::UTF16 | CustomEncoding::UTF16LE => {
                        out.extend(src.encode_utf16().flat_map(u16::to_le_bytes));
                    }
                    CustomEncoding::UTF16BE => {
                        out.extend(src.encode_utf16().flat_map(u16::to_be_bytes));
                    }
                    CustomEncoding::ISO8859_1 => encode_latin1(src, out),
                    CustomEncoding::ASCII => {
                        for c in src.chars() {
                            if c.is_ascii() {
                                out.push(c as u8);
                            } else {
                                out.extend_from_slice(format!("&#{};", c as u32).as_bytes());
                            }
                        }
                    }
                }
            }
        }
    }
}

fn encode_latin1(mut src: &str, out: &mut Vec<u8>) {
    while !src.is_empty() {
        let up_to = str_latin1_up_to(src);
        let start = out.len();
        out.resize(start + up_to, 0);
        let write = convert_utf8_to_latin1_lossy(&src.as_bytes()[..up_to], &mut out[start..]);
        out.truncate(start + write);
        src = &src[up_to..];
        if let Some(c) = src.chars().next() {
            out.extend_from_slice(format!("&#{};", c as u32).as_bytes());
            src = &src[c.len_utf8()..];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(name: &str, src: &str) -> Vec<u8> {
        let mut encoder = find_encoding_handler(name).unwrap().encoder();
        let mut out = vec![];
        encoder.encode(src, true, &mut out);
        out
    }

    #[test]
    fn find_encoding_handler_test() {
        assert!(find_encoding_handler("utf-8").unwrap().is_utf8());
        assert_eq!(
            find_encoding_handler("iso-8859-1"),
            Some(XmlCharEncodingHandler::Custom(CustomEncoding::ISO8859_1))
        );
        assert_eq!(
            find_encoding_handler("Shift_JIS").map(|h| h.name()),
            Some("Shift_JIS")
        );
        assert!(find_encoding_handler("no-such-encoding").is_none());
        assert!(find_encoding_handler("replacement").is_none());
    }

    #[test]
    fn latin1_test() {
        assert_eq!(encode("ISO-8859-1", "caf\u{e9}"), b"caf\xE9");
        assert_eq!(encode("ISO-8859-1", "a\u{20ac}b"), b"a&#8364;b");
    }

    #[test]
    fn ascii_test() {
        assert_eq!(encode("US-ASCII", "caf\u{e9}"), b"caf&#233;");
    }

    #[test]
    fn utf16_test() {
        assert_eq!(encode("UTF-16LE", "a"), [0x61, 0x00]);
        assert_eq!(encode("UTF-16BE", "a"), [0x00, 0x61]);
        assert_eq!(encode("UTF-16", "a"), [0xFF, 0xFE, 0x61, 0x00]);
    }

    #[test]
    fn predefined_unmappable_test() {
        assert_eq!(encode("windows-1252", "\u{e9}\u{3042}"), b"\xE9&#12354;");
    }
}

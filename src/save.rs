//! Provide methods and data structures for serializing document trees.
//!
//! This module is based on `libxml/xmlsave.h`, `xmlsave.c`, and so on in `libxml2-v2.11.8`.
//! Please refer to original libxml2 documents also.
//!
//! The escaping rules are not libxml2's: text and attribute values are escaped
//! with numeric references for quotes, control characters and the range
//! `0x80..0xE0`, and characters that are not allowed in XML are replaced
//! with U+FFFD.

// Copyright of the original code is the following.
// --------
// Summary: the XML document serializer
// Description: API to save document or subtree of document
//
// Copy: See Copyright for the status of this software.
//
// Author: Daniel Veillard
// --------
// xmlsave.c: Implementation of the document serializer
//
// See Copyright for the status of this software.
//
// daniel@veillard.com

use std::io::{self, Write};

use log::trace;

use crate::{
    encoding::find_encoding_handler,
    error::XmlError,
    io::XmlOutputBuffer,
    tree::{NodeId, NodeKind, XmlDoc, XmlElement, XmlStandalone},
};

/// This is the set of XML save options that can be passed down
/// to [`XmlSaveCtxt::save_to_io`].
#[doc(alias = "xmlSaveOption")]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlSaveOption {
    /// drop the xml declaration
    XmlSaveNoDecl = 1 << 1,
    /// no empty tags
    XmlSaveNoEmpty = 1 << 2,
    /// escape line feeds in text content
    XmlSaveEscapeNewline = 1 << 8,
}

const ESC_QUOT: &[u8] = b"&#34;";
const ESC_APOS: &[u8] = b"&#39;";
const ESC_AMP: &[u8] = b"&amp;";
const ESC_LT: &[u8] = b"&lt;";
const ESC_GT: &[u8] = b"&gt;";
const ESC_TAB: &[u8] = b"&#9;";
const ESC_NL: &[u8] = b"&#10;";
const ESC_CR: &[u8] = b"&#13;";
const ESC_FFFD: &[u8] = "\u{FFFD}".as_bytes();

/// Decode the first UTF-8 sequence of `s`.
///
/// An invalid or truncated sequence decodes as U+FFFD with a width of 1.
fn decode_char(s: &[u8]) -> (char, usize) {
    let width = match s[0] {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return ('\u{FFFD}', 1),
    };
    match s
        .get(..width)
        .and_then(|seq| std::str::from_utf8(seq).ok())
        .and_then(|seq| seq.chars().next())
    {
        Some(c) => (c, width),
        None => ('\u{FFFD}', 1),
    }
}

/// Check whether `c` is allowed in an XML document.
fn is_in_character_range(c: u32) -> bool {
    matches!(
        c,
        0x09 | 0x0A | 0x0D | 0x20..=0xDF77 | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

enum Escape {
    Literal,
    Fixed(&'static [u8]),
    Hex(u32),
}

/// The escape shared by text and attribute values for everything but the markup characters.
fn escape_char(c: char, width: usize) -> Escape {
    let code = c as u32;
    if !(0x20..0x80).contains(&code) && code < 0xE0 {
        Escape::Hex(code)
    } else if !is_in_character_range(code) || (c == '\u{FFFD}' && width == 1) {
        Escape::Fixed(ESC_FFFD)
    } else {
        Escape::Literal
    }
}

fn escape_with<W: Write + ?Sized>(
    out: &mut W,
    s: &[u8],
    rule: impl Fn(char, usize) -> Escape,
) -> io::Result<()> {
    let mut last = 0;
    let mut i = 0;
    while i < s.len() {
        let (c, width) = decode_char(&s[i..]);
        let start = i;
        i += width;
        match rule(c, width) {
            Escape::Literal => continue,
            Escape::Fixed(esc) => {
                out.write_all(&s[last..start])?;
                out.write_all(esc)?;
            }
            Escape::Hex(code) => {
                out.write_all(&s[last..start])?;
                write!(out, "&#x{code:X};")?;
            }
        }
        last = i;
    }
    out.write_all(&s[last..])
}

/// Write `s` escaped for use inside a double-quoted attribute value.
#[doc(alias = "xmlAttrSerializeTxtContent")]
pub fn escape_attr_value<W: Write + ?Sized>(out: &mut W, s: &[u8]) -> io::Result<()> {
    escape_with(out, s, |c, width| match c {
        '"' => Escape::Fixed(ESC_QUOT),
        '\'' => Escape::Fixed(ESC_APOS),
        '&' => Escape::Fixed(ESC_AMP),
        '<' => Escape::Fixed(ESC_LT),
        '>' => Escape::Fixed(ESC_GT),
        '\n' => Escape::Fixed(ESC_NL),
        '\r' => Escape::Fixed(ESC_CR),
        '\t' => Escape::Fixed(ESC_TAB),
        _ => escape_char(c, width),
    })
}

/// Write `s` escaped for use as character data.
///
/// Tabs are kept literally, and so are line feeds unless `escape_newline` is set.
#[doc(alias = "xmlEscapeContent")]
pub fn escape_text<W: Write + ?Sized>(
    out: &mut W,
    s: &[u8],
    escape_newline: bool,
) -> io::Result<()> {
    escape_with(out, s, |c, width| match c {
        '"' => Escape::Fixed(ESC_QUOT),
        '\'' => Escape::Fixed(ESC_APOS),
        '&' => Escape::Fixed(ESC_AMP),
        '<' => Escape::Fixed(ESC_LT),
        '>' => Escape::Fixed(ESC_GT),
        '\n' if escape_newline => Escape::Fixed(ESC_NL),
        '\n' | '\t' => Escape::Literal,
        '\r' => Escape::Fixed(ESC_CR),
        _ => escape_char(c, width),
    })
}

/// A serialization context.
#[doc(alias = "xmlSaveCtxt")]
pub struct XmlSaveCtxt<'a> {
    pub(crate) encoding: Option<String>,
    pub(crate) buf: XmlOutputBuffer<'a>,
    pub(crate) options: i32,
}

impl<'a> XmlSaveCtxt<'a> {
    /// Create a document saving context serializing to `writer`
    /// with the encoding and the options given.
    ///
    /// Fails with [`XmlError::UnknownEncoding`] before anything is written
    /// if the encoding cannot be used for output.
    #[doc(alias = "xmlSaveToIO")]
    pub fn save_to_io(
        writer: impl Write + 'a,
        encoding: Option<&str>,
        options: i32,
    ) -> Result<Self, XmlError> {
        let handler = match encoding {
            Some(enc) => Some(
                find_encoding_handler(enc)
                    .ok_or_else(|| XmlError::UnknownEncoding(enc.to_owned()))?,
            ),
            None => None,
        };
        Ok(Self {
            encoding: encoding.map(|e| e.to_owned()),
            buf: XmlOutputBuffer::from_writer(writer, handler),
            options,
        })
    }

    /// Save a full document to a saving context.
    ///
    /// If the context has no encoding, the encoding declared by the document is used.
    #[doc(alias = "xmlSaveDoc")]
    pub fn save_doc(&mut self, doc: &XmlDoc) -> Result<(), XmlError> {
        trace!("xmlSaveDoc: options {:#x}", self.options);
        if self.encoding.is_none() {
            if let Some(label) = doc.encoding() {
                let handler = find_encoding_handler(label)
                    .ok_or_else(|| XmlError::UnknownEncoding(label.to_owned()))?;
                let mut out = Vec::new();
                {
                    let mut ctxt = XmlSaveCtxt {
                        encoding: Some(label.to_owned()),
                        buf: XmlOutputBuffer::from_writer(&mut out, Some(handler)),
                        options: self.options,
                    };
                    ctxt.doc_content_dump_output(doc)?;
                    ctxt.flush()?;
                }
                self.buf.write_bytes(&out)?;
                return self.flush();
            }
        }
        self.doc_content_dump_output(doc)?;
        self.flush()
    }

    /// Save a subtree starting at `node` to a saving context.
    #[doc(alias = "xmlSaveTree")]
    pub fn save_tree(&mut self, doc: &XmlDoc, node: NodeId) -> Result<(), XmlError> {
        doc.check(node)?;
        trace!("xmlSaveTree: options {:#x}", self.options);
        self.node_dump_output(doc, node)?;
        self.flush()
    }

    /// Flush a document saving context, i.e. make sure that all bytes have been output.
    #[doc(alias = "xmlSaveFlush")]
    pub fn flush(&mut self) -> Result<(), XmlError> {
        self.buf.flush()?;
        Ok(())
    }

    #[doc(alias = "xmlDocContentDumpOutput")]
    fn doc_content_dump_output(&mut self, doc: &XmlDoc) -> Result<(), XmlError> {
        if self.options & XmlSaveOption::XmlSaveNoDecl as i32 == 0 {
            self.buf.write_str("<?xml version=\"")?;
            self.buf.write_str(doc.version().unwrap_or("1.0"))?;
            self.buf.write_str("\"")?;
            if let Some(encoding) = self.encoding.as_deref().or(doc.encoding()) {
                self.buf.write_str(" encoding=\"")?;
                self.buf.write_str(encoding)?;
                self.buf.write_str("\"")?;
            }
            match doc.standalone() {
                XmlStandalone::ExplicitYes => self.buf.write_str(" standalone=\"yes\"")?,
                XmlStandalone::ExplicitNo => self.buf.write_str(" standalone=\"no\"")?,
                XmlStandalone::NoXmlDecl | XmlStandalone::ImplicitNo => {}
            }
            self.buf.write_str("?>\n")?;
        }
        for child in doc.children(doc.document_node()) {
            self.node_dump_output(doc, child)?;
            self.buf.write_str("\n")?;
        }
        Ok(())
    }

    fn start_tag(&mut self, doc: &XmlDoc, node: NodeId, elem: &XmlElement) -> io::Result<()> {
        self.buf.write_str("<")?;
        self.buf.write_str(&elem.qualified_name())?;
        for ns in doc.ns_defs(node) {
            self.buf.write_str(" xmlns")?;
            if let Some(prefix) = ns.prefix() {
                self.buf.write_str(":")?;
                self.buf.write_str(prefix)?;
            }
            self.buf.write_str("=\"")?;
            escape_attr_value(&mut self.buf, ns.href().unwrap_or_default().as_bytes())?;
            self.buf.write_str("\"")?;
        }
        for (_, attr) in doc.attributes(node) {
            self.buf.write_str(" ")?;
            self.buf.write_str(&attr.qualified_name())?;
            self.buf.write_str("=\"")?;
            escape_attr_value(&mut self.buf, attr.value().as_bytes())?;
            self.buf.write_str("\"")?;
        }
        Ok(())
    }

    fn end_tag(&mut self, elem: &XmlElement) -> io::Result<()> {
        self.buf.write_str("</")?;
        self.buf.write_str(&elem.qualified_name())?;
        self.buf.write_str(">")
    }

    /// Dump an XML node, recursive behaviour, children are printed too.
    #[doc(alias = "xmlNodeDumpOutputInternal")]
    fn node_dump_output(&mut self, doc: &XmlDoc, root: NodeId) -> Result<(), XmlError> {
        let no_empty = self.options & XmlSaveOption::XmlSaveNoEmpty as i32 != 0;
        let escape_newline = self.options & XmlSaveOption::XmlSaveEscapeNewline as i32 != 0;
        let mut cur = root;
        loop {
            let mut descend = None;
            match &doc.node(cur).kind {
                NodeKind::Document => self.doc_content_dump_output(doc)?,
                NodeKind::Element(elem) => {
                    self.start_tag(doc, cur, elem)?;
                    match doc.first_child(cur) {
                        Some(child) => {
                            self.buf.write_str(">")?;
                            descend = Some(child);
                        }
                        None if no_empty => {
                            self.buf.write_str(">")?;
                            self.end_tag(elem)?;
                        }
                        None => self.buf.write_str("/>")?,
                    }
                }
                NodeKind::Text(content) => escape_text(&mut self.buf, content, escape_newline)?,
                NodeKind::Comment(content) => {
                    self.buf.write_str("<!--")?;
                    self.buf.write_bytes(content)?;
                    self.buf.write_str("-->")?;
                }
                NodeKind::ProcessingInstruction(pi) => {
                    self.buf.write_str("<?")?;
                    self.buf.write_str(pi.target())?;
                    if let Some(data) = pi.data().filter(|data| !data.is_empty()) {
                        self.buf.write_str(" ")?;
                        self.buf.write_str(data)?;
                    }
                    self.buf.write_str("?>")?;
                }
                NodeKind::EntityRef(er) => {
                    self.buf.write_str("&")?;
                    self.buf.write_str(er.name())?;
                    self.buf.write_str(";")?;
                }
                NodeKind::Attribute(_)
                | NodeKind::Entity(_)
                | NodeKind::Dtd(_)
                | NodeKind::NamespaceDecl(_) => {}
            }

            if let Some(child) = descend {
                cur = child;
                continue;
            }
            loop {
                if cur == root {
                    return Ok(());
                }
                if let Some(next) = doc.next_sibling(cur) {
                    cur = next;
                    break;
                }
                let Some(parent) = doc.parent(cur) else {
                    return Ok(());
                };
                cur = parent;
                if let NodeKind::Element(elem) = &doc.node(cur).kind {
                    self.end_tag(elem)?;
                }
            }
        }
    }
}

impl XmlDoc {
    /// Dump the document in memory, converted to `encoding` if one is given.
    #[doc(alias = "xmlDocDumpMemoryEnc")]
    pub fn dump_memory_enc(&self, encoding: Option<&str>) -> Result<Vec<u8>, XmlError> {
        let mut out = vec![];
        {
            let mut ctxt = XmlSaveCtxt::save_to_io(&mut out, encoding, 0)?;
            ctxt.save_doc(self)?;
        }
        Ok(out)
    }

    /// Dump the document in memory, in the encoding it declares.
    ///
    /// Fails with [`XmlError::UnknownEncoding`] if the declared encoding cannot be
    /// used for output (e.g. `EBCDIC-US`). Use `dump_memory_enc(Some("UTF-8"))`
    /// to serialize such a document anyway.
    #[doc(alias = "xmlDocDumpMemory")]
    pub fn dump_memory(&self) -> Result<Vec<u8>, XmlError> {
        self.dump_memory_enc(None)
    }

    /// Dump the document to `out`.
    ///
    /// Returns the number of bytes written.
    #[doc(alias = "xmlDocDump")]
    pub fn dump_file(&self, out: impl Write) -> Result<usize, XmlError> {
        let mut ctxt = XmlSaveCtxt::save_to_io(out, None, 0)?;
        ctxt.save_doc(self)?;
        Ok(ctxt.buf.written())
    }

    /// Dump the subtree rooted at `node` to `out`.
    #[doc(alias = "xmlNodeDump")]
    pub fn node_dump(&self, out: impl Write, node: NodeId) -> Result<(), XmlError> {
        let mut ctxt = XmlSaveCtxt::save_to_io(out, None, 0)?;
        ctxt.save_tree(self, node)
    }
}

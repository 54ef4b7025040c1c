//! Provide methods and data structures for feeding SAX2 events.
//!
//! This module is based on `libxml/parser.h`, `parser.c`, and so on in `libxml2-v2.11.8`.
//! Please refer to original libxml2 documents also.
//!
//! The event contract lives in [`sax`] and the parser context in [`XmlParserCtxt`].
//! With the `libxml_reader` feature, a tokenizer built on `xmlparser`
//! drives any [`sax::SaxHandler`] from an in-memory document.

// Copyright of the original code is the following.
// --------
// Summary: the core parser module
// Description: Interfaces, constants and types related to the XML parser
//
// Copy: See Copyright for the status of this software.
//
// Author: Daniel Veillard
// --------
// parser.c : an XML 1.0 parser, namespaces and validity support are mostly
//            implemented on top of the SAX interfaces
//
// See Copyright for the status of this software.
//
// daniel@veillard.com

mod context;
pub mod sax;
#[cfg(feature = "libxml_reader")]
mod tokenizer;

pub use context::*;

#[cfg(feature = "libxml_reader")]
use crate::{error::XmlError, sax2::TreeBuilder, tree::XmlDoc};

#[cfg(feature = "libxml_reader")]
impl XmlParserCtxt {
    /// Parse an in-memory document and report it to `handler`.
    ///
    /// Parsing stops at the first error, whether it comes from the tokenizer or from the handler.
    #[doc(alias = "xmlParseDocument")]
    pub fn parse_document<H: sax::SaxHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        buffer: &str,
    ) -> Result<(), XmlError> {
        let res = tokenizer::parse(self, handler, buffer);
        if res.is_err() {
            self.well_formed = false;
        }
        res
    }
}

/// Parse an XML in-memory document and build a tree.
///
/// `options` is a combination of [`XmlParserOption`]s.
#[doc(alias = "xmlReadMemory")]
#[cfg(feature = "libxml_reader")]
pub fn parse_memory(buffer: &str, options: i32) -> Result<XmlDoc, XmlError> {
    let mut ctxt = XmlParserCtxt::new();
    ctxt.use_options(options);
    let mut builder = TreeBuilder::new();
    ctxt.parse_document(&mut builder, buffer)?;
    ctxt.take_document().ok_or(XmlError::InvalidDocument)
}

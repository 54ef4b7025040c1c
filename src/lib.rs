//! Build libxml2-style document trees from SAX2 events and serialize them back to XML.
//!
//! The crate is split the same way the libxml2 tree layer is:
//!
//! - [`parser::sax`] defines the SAX2 event contract ([`parser::sax::SaxHandler`]).
//! - [`sax2::TreeBuilder`] is the default handler; it turns events into an [`tree::XmlDoc`].
//! - [`tree`] holds the node arena, the DTD subsets and the entity tables.
//! - [`save`] walks a tree and writes escaped XML text.
//!
//! With the `libxml_reader` feature, [`parser::parse_memory`] drives the builder from the
//! `xmlparser` tokenizer.

#![allow(clippy::new_without_default)]
#![warn(unused_assignments)]
#![warn(unused_mut)]
#![warn(unused_imports)]
#![warn(unused_labels)]
#![warn(unused_parens)]
#![warn(unused_variables)]

#[cfg(feature = "libxml_output")]
pub mod encoding;
pub mod error;
#[cfg(feature = "libxml_output")]
pub mod io;
pub mod parser;
pub mod sax2;
#[cfg(feature = "libxml_output")]
pub mod save;
pub mod tree;

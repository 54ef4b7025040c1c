//! Provide methods and data structures for the document tree.
//!
//! This module is based on `libxml/tree.h`, `tree.c`, and so on in `libxml2-v2.11.8`.
//! Please refer to original libxml2 documents also.
//!
//! Unlike libxml2, nodes do not point at each other directly.
//! Every node lives in the arena of the [`XmlDoc`] that created it and is addressed by a [`NodeId`].
//! Parent, child and sibling links are stored as `NodeId`s, so the tree never forms ownership cycles.

// Copyright of the original code is the following.
// --------
// Summary: interfaces for tree manipulation
// Description: this module describes the structures found in an tree resulting
//              from an XML or HTML parsing, as well as the API provided for
//              various processing on that tree
//
// Copy: See Copyright for the status of this software.
//
// Author: Daniel Veillard
// --------
// tree.c : implementation of access function for an XML tree.
//
// References:
//   XHTML 1.0 W3C REC: http://www.w3.org/TR/2002/REC-xhtml1-20020801/
//
// See Copyright for the status of this software.
//
// daniel@veillard.com

mod attribute;
mod document;
mod dtd;
mod entities;
mod namespace;
mod node;

use std::{
    any::type_name,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

pub use attribute::*;
pub use document::*;
pub use dtd::*;
pub use entities::*;
pub use namespace::*;
pub use node::*;

/// Identifies one document instance.
///
/// Every [`XmlDoc`] receives a fresh id, so handles created by one document
/// are never mistaken for handles of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocId(u64);

impl DocId {
    pub(crate) fn next() -> Self {
        static NEXT_DOC_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_DOC_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A handle to a node stored in the arena of an [`XmlDoc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    doc: DocId,
    index: usize,
}

impl NodeId {
    /// The document that created this node.
    pub fn document(self) -> DocId {
        self.doc
    }
}

/// The different element types carried by an XML tree.
///
/// The numbering follows libxml2.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlElementType {
    XmlElementNode = 1,
    XmlAttributeNode = 2,
    XmlTextNode = 3,
    XmlEntityRefNode = 5,
    XmlPINode = 7,
    XmlCommentNode = 8,
    XmlDocumentNode = 9,
    XmlDTDNode = 14,
    XmlEntityDecl = 17,
    XmlNamespaceDecl = 18,
}

impl TryFrom<i32> for XmlElementType {
    type Error = anyhow::Error;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::XmlElementNode),
            2 => Ok(Self::XmlAttributeNode),
            3 => Ok(Self::XmlTextNode),
            5 => Ok(Self::XmlEntityRefNode),
            7 => Ok(Self::XmlPINode),
            8 => Ok(Self::XmlCommentNode),
            9 => Ok(Self::XmlDocumentNode),
            14 => Ok(Self::XmlDTDNode),
            17 => Ok(Self::XmlEntityDecl),
            18 => Ok(Self::XmlNamespaceDecl),
            _ => Err(anyhow::anyhow!(
                "Invalid convert from value '{value}' to {}",
                type_name::<Self>()
            )),
        }
    }
}

/// Which subset a DTD node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlSubset {
    Internal,
    External,
}

/// The payload of a node.
#[derive(Debug)]
pub enum NodeKind {
    Document,
    Element(XmlElement),
    Attribute(XmlAttr),
    Text(Vec<u8>),
    Comment(Vec<u8>),
    ProcessingInstruction(XmlPI),
    EntityRef(XmlEntityRef),
    Entity(Rc<XmlEntity>),
    Dtd(XmlSubset),
    NamespaceDecl(XmlNs),
}

impl NodeKind {
    pub fn element_type(&self) -> XmlElementType {
        match self {
            Self::Document => XmlElementType::XmlDocumentNode,
            Self::Element(_) => XmlElementType::XmlElementNode,
            Self::Attribute(_) => XmlElementType::XmlAttributeNode,
            Self::Text(_) => XmlElementType::XmlTextNode,
            Self::Comment(_) => XmlElementType::XmlCommentNode,
            Self::ProcessingInstruction(_) => XmlElementType::XmlPINode,
            Self::EntityRef(_) => XmlElementType::XmlEntityRefNode,
            Self::Entity(_) => XmlElementType::XmlEntityDecl,
            Self::Dtd(_) => XmlElementType::XmlDTDNode,
            Self::NamespaceDecl(_) => XmlElementType::XmlNamespaceDecl,
        }
    }
}

/// One slot of the document arena.
#[derive(Debug)]
pub struct XmlNode {
    pub(crate) kind: NodeKind,
    pub(crate) doc: DocId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
}

impl XmlNode {
    pub(crate) fn new(doc: DocId, kind: NodeKind) -> Self {
        Self {
            kind,
            doc,
            parent: None,
            children: None,
            last: None,
            next: None,
            prev: None,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn element_type(&self) -> XmlElementType {
        self.kind.element_type()
    }

    pub fn document(&self) -> DocId {
        self.doc
    }
}

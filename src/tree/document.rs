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

use std::any::type_name;

use crate::error::XmlError;

use super::{
    DocId, NodeId, NodeKind, XmlDtd, XmlElement, XmlEntityRef, XmlNode, XmlNs, XmlPI, XmlSubset,
};

/// How the XML declaration classified the document.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlStandalone {
    /// `standalone="yes"`
    ExplicitYes = 1,
    /// `standalone="no"`
    ExplicitNo = 0,
    /// No XML declaration at all.
    #[default]
    NoXmlDecl = -1,
    /// An XML declaration without a standalone pseudo-attribute.
    ImplicitNo = -2,
}

impl TryFrom<i32> for XmlStandalone {
    type Error = anyhow::Error;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::ExplicitYes),
            0 => Ok(Self::ExplicitNo),
            -1 => Ok(Self::NoXmlDecl),
            -2 => Ok(Self::ImplicitNo),
            _ => Err(anyhow::anyhow!(
                "Invalid convert from value '{value}' to {}",
                type_name::<Self>()
            )),
        }
    }
}

/// An XML document.
///
/// The document owns every node created through its factories.
/// The document node itself is always the first slot of the arena.
#[derive(Debug)]
pub struct XmlDoc {
    id: DocId,
    nodes: Vec<XmlNode>,
    pub(crate) version: Option<String>,
    pub(crate) encoding: Option<String>,
    pub(crate) standalone: XmlStandalone,
    pub(crate) int_subset: XmlDtd,
    pub(crate) ext_subset: Option<XmlDtd>,
}

impl XmlDoc {
    /// Creates a new XML document.
    ///
    /// The internal subset is created at the same time. It is not attached under the document node.
    #[doc(alias = "xmlNewDoc")]
    pub fn new(version: Option<&str>) -> Self {
        let id = DocId::next();
        let mut nodes = vec![XmlNode::new(id, NodeKind::Document)];
        let dtd = NodeId { doc: id, index: 1 };
        nodes.push(XmlNode::new(id, NodeKind::Dtd(XmlSubset::Internal)));
        Self {
            id,
            nodes,
            version: version.map(|v| v.to_owned()),
            encoding: None,
            standalone: XmlStandalone::default(),
            int_subset: XmlDtd::new(dtd),
            ext_subset: None,
        }
    }

    /// Creates a new document carrying the values of an XML declaration.
    pub fn with_declaration(
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: XmlStandalone,
    ) -> Self {
        let mut doc = Self::new(version);
        doc.encoding = encoding.map(|e| e.to_owned());
        doc.standalone = standalone;
        doc
    }

    pub fn id(&self) -> DocId {
        self.id
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn set_encoding(&mut self, encoding: Option<&str>) {
        self.encoding = encoding.map(|e| e.to_owned());
    }

    pub fn standalone(&self) -> XmlStandalone {
        self.standalone
    }

    pub fn set_standalone(&mut self, standalone: XmlStandalone) {
        self.standalone = standalone;
    }

    /// The handle of the document node.
    pub fn document_node(&self) -> NodeId {
        NodeId {
            doc: self.id,
            index: 0,
        }
    }

    pub fn int_subset(&self) -> &XmlDtd {
        &self.int_subset
    }

    pub fn int_subset_mut(&mut self) -> &mut XmlDtd {
        &mut self.int_subset
    }

    pub fn ext_subset(&self) -> Option<&XmlDtd> {
        self.ext_subset.as_ref()
    }

    /// Returns the external subset, creating an empty one if it does not exist yet.
    ///
    /// When the subset already exists, the identifiers given here fill only the missing ones.
    #[doc(alias = "xmlNewDtd")]
    pub fn create_ext_subset(
        &mut self,
        name: Option<&str>,
        external_id: Option<&str>,
        system_id: Option<&str>,
    ) -> &mut XmlDtd {
        let node = match self.ext_subset.as_ref().map(|dtd| dtd.node) {
            Some(node) => node,
            None => self.alloc(NodeKind::Dtd(XmlSubset::External)),
        };
        let dtd = self.ext_subset.get_or_insert_with(|| XmlDtd::new(node));
        if dtd.name.is_none() {
            dtd.name = name.map(|n| n.to_owned());
        }
        if dtd.external_id.is_none() {
            dtd.external_id = external_id.map(|e| e.to_owned());
        }
        if dtd.system_id.is_none() {
            dtd.system_id = system_id.map(|s| s.to_owned());
        }
        dtd
    }

    pub(crate) fn subset(&self, subset: XmlSubset) -> Option<&XmlDtd> {
        match subset {
            XmlSubset::Internal => Some(&self.int_subset),
            XmlSubset::External => self.ext_subset.as_ref(),
        }
    }

    pub(crate) fn subset_mut(&mut self, subset: XmlSubset) -> Option<&mut XmlDtd> {
        match subset {
            XmlSubset::Internal => Some(&mut self.int_subset),
            XmlSubset::External => self.ext_subset.as_mut(),
        }
    }

    /// Check if `node` was created by this document.
    pub fn owns(&self, node: NodeId) -> bool {
        node.doc == self.id && node.index < self.nodes.len()
    }

    pub(crate) fn check(&self, node: NodeId) -> Result<(), XmlError> {
        if self.owns(node) {
            Ok(())
        } else {
            Err(XmlError::InvalidDocument)
        }
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(XmlNode::new(self.id, kind));
        NodeId {
            doc: self.id,
            index,
        }
    }

    /// Returns the node for `id`, or `None` if it belongs to another document.
    pub fn get(&self, id: NodeId) -> Option<&XmlNode> {
        if id.doc == self.id {
            self.nodes.get(id.index)
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut XmlNode> {
        if id.doc == self.id {
            self.nodes.get_mut(id.index)
        } else {
            None
        }
    }

    /// Access a node that is known to belong to this document.
    pub(crate) fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id.index]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut XmlNode {
        &mut self.nodes[id.index]
    }

    /// Creation of a new element node.
    #[doc(alias = "xmlNewDocNode")]
    pub fn new_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element(XmlElement::new(name, None)))
    }

    /// Creation of a new element node bound to a namespace.
    pub fn new_ns_element(&mut self, ns: Option<XmlNs>, name: &str) -> NodeId {
        self.alloc(NodeKind::Element(XmlElement::new(name, ns)))
    }

    /// Creation of a new text node.
    #[doc(alias = "xmlNewDocText")]
    pub fn new_text(&mut self, content: impl Into<Vec<u8>>) -> NodeId {
        self.alloc(NodeKind::Text(content.into()))
    }

    /// Creation of a new comment node.
    #[doc(alias = "xmlNewDocComment")]
    pub fn new_comment(&mut self, content: impl Into<Vec<u8>>) -> NodeId {
        self.alloc(NodeKind::Comment(content.into()))
    }

    /// Creation of a processing instruction node.
    #[doc(alias = "xmlNewDocPI")]
    pub fn new_pi(&mut self, target: &str, data: Option<&str>) -> NodeId {
        self.alloc(NodeKind::ProcessingInstruction(XmlPI {
            target: target.to_owned(),
            data: data.map(|d| d.to_owned()),
        }))
    }

    /// Creation of a new reference node.
    ///
    /// `name` may be given with or without the surrounding `&` and `;`.
    /// The node is bound to the entity that [`XmlDoc::get_doc_entity`] finds for it, if any.
    #[doc(alias = "xmlNewReference")]
    pub fn new_reference(&mut self, name: &str) -> NodeId {
        let name = name.strip_prefix('&').unwrap_or(name);
        let name = name.strip_suffix(';').unwrap_or(name);
        let entity = self.get_doc_entity(name);
        self.alloc(NodeKind::EntityRef(XmlEntityRef {
            name: name.to_owned(),
            entity,
        }))
    }

    /// Search the root element of the document.
    #[doc(alias = "xmlDocGetRootElement")]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.document_node())
            .find(|&child| matches!(self.node(child).kind, NodeKind::Element(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_conversion_test() {
        assert_eq!(
            XmlStandalone::try_from(1).ok(),
            Some(XmlStandalone::ExplicitYes)
        );
        assert_eq!(
            XmlStandalone::try_from(0).ok(),
            Some(XmlStandalone::ExplicitNo)
        );
        assert_eq!(
            XmlStandalone::try_from(-1).ok(),
            Some(XmlStandalone::NoXmlDecl)
        );
        assert_eq!(
            XmlStandalone::try_from(-2).ok(),
            Some(XmlStandalone::ImplicitNo)
        );
        assert!(XmlStandalone::try_from(2).is_err());
        assert!(XmlStandalone::try_from(-99).is_err());
        assert_eq!(XmlStandalone::ImplicitNo as i32, -2);
    }

    #[test]
    fn new_document_test() {
        let doc = XmlDoc::with_declaration(Some("1.0"), Some("UTF-8"), XmlStandalone::ExplicitYes);
        assert_eq!(doc.version(), Some("1.0"));
        assert_eq!(doc.encoding(), Some("UTF-8"));
        assert_eq!(doc.standalone(), XmlStandalone::ExplicitYes);
        assert!(doc.ext_subset().is_none());
        assert!(doc.root_element().is_none());
        // the internal subset is not a child of the document node
        assert_eq!(doc.children(doc.document_node()).count(), 0);
        assert_eq!(doc.parent(doc.int_subset().node()), None);
    }

    #[test]
    fn foreign_handles_test() {
        let mut a = XmlDoc::new(None);
        let b = XmlDoc::new(None);
        let elem = a.new_element("a");
        assert!(a.owns(elem));
        assert!(!b.owns(elem));
        assert!(b.get(elem).is_none());
        assert_eq!(elem.document(), a.id());
    }

    #[test]
    fn root_element_test() {
        let mut doc = XmlDoc::new(None);
        let comment = doc.new_comment("c");
        let root = doc.new_element("root");
        let top = doc.document_node();
        doc.add_child(top, comment).unwrap();
        doc.add_child(top, root).unwrap();
        assert_eq!(doc.root_element(), Some(root));
    }

    #[test]
    fn external_subset_test() {
        let mut doc = XmlDoc::new(None);
        doc.create_ext_subset(Some("doc"), None, Some("doc.dtd"));
        let dtd = doc.create_ext_subset(None, Some("-//X"), Some("other.dtd"));
        assert_eq!(dtd.name(), Some("doc"));
        assert_eq!(dtd.external_id(), Some("-//X"));
        assert_eq!(dtd.system_id(), Some("doc.dtd"));
    }
}

use std::borrow::Cow;

use log::trace;

use crate::error::XmlError;

use super::{NodeId, NodeKind, XmlDoc, XmlElementType, XmlNs};

/// The payload of an element node.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub(crate) name: String,
    pub(crate) ns: Option<XmlNs>,
    /// The first attribute. The rest are chained through `next`.
    pub(crate) properties: Option<NodeId>,
    /// Namespace declaration nodes, in declaration order.
    pub(crate) ns_def: Vec<NodeId>,
}

impl XmlElement {
    pub(crate) fn new(name: &str, ns: Option<XmlNs>) -> Self {
        Self {
            name: name.to_owned(),
            ns,
            properties: None,
            ns_def: vec![],
        }
    }

    /// The local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ns(&self) -> Option<&XmlNs> {
        self.ns.as_ref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.ns.as_ref().and_then(|ns| ns.prefix())
    }

    pub fn uri(&self) -> Option<&str> {
        self.ns.as_ref().and_then(|ns| ns.href())
    }

    /// The name as written in markup, `prefix:local` or `local`.
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.prefix() {
            Some(prefix) => Cow::Owned(format!("{prefix}:{}", self.name)),
            None => Cow::Borrowed(&self.name),
        }
    }
}

/// The payload of a processing instruction node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPI {
    pub(crate) target: String,
    pub(crate) data: Option<String>,
}

impl XmlPI {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a XmlDoc,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = self.doc.node(cur).next;
        Some(cur)
    }
}

impl XmlDoc {
    pub fn node_type(&self, node: NodeId) -> Option<XmlElementType> {
        self.get(node).map(|node| node.element_type())
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.get(node).map(|node| &node.kind)
    }

    /// The owning document of `node`, if it belongs to this document.
    pub fn owner_document(&self, node: NodeId) -> Option<super::DocId> {
        self.get(node).map(|node| node.doc)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.children
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.last
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.next
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.prev
    }

    pub fn children(&self, node: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(node),
        }
    }

    /// Returns the payload of an element node.
    pub fn element(&self, node: NodeId) -> Option<&XmlElement> {
        match self.kind(node)? {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> Option<&mut XmlElement> {
        match &mut self.get_mut(node)?.kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    /// The name of the node.
    ///
    /// Elements and attributes report their qualified name, PIs their target,
    /// entity references and entity declarations the entity name, namespace
    /// declarations their prefix. Other nodes have no name.
    pub fn name(&self, node: NodeId) -> Option<Cow<'_, str>> {
        match self.kind(node)? {
            NodeKind::Element(elem) => Some(elem.qualified_name()),
            NodeKind::Attribute(attr) => Some(attr.qualified_name()),
            NodeKind::ProcessingInstruction(pi) => Some(Cow::Borrowed(pi.target())),
            NodeKind::EntityRef(er) => Some(Cow::Borrowed(er.name())),
            NodeKind::Entity(ent) => Some(Cow::Borrowed(ent.name())),
            NodeKind::Dtd(subset) => {
                let dtd = self.subset(*subset)?;
                dtd.name().map(Cow::Borrowed)
            }
            NodeKind::NamespaceDecl(ns) => ns.prefix().map(Cow::Borrowed),
            NodeKind::Document | NodeKind::Text(_) | NodeKind::Comment(_) => None,
        }
    }

    /// The literal content of text-bearing nodes.
    pub fn content(&self, node: NodeId) -> Option<&[u8]> {
        match self.kind(node)? {
            NodeKind::Text(content) | NodeKind::Comment(content) => Some(content),
            NodeKind::ProcessingInstruction(pi) => pi.data().map(|d| d.as_bytes()),
            NodeKind::Attribute(attr) => Some(attr.value().as_bytes()),
            NodeKind::Entity(ent) => ent.content().map(|c| c.as_bytes()),
            _ => None,
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.node(node).parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Unlink a node from its current context.
    ///
    /// Only nodes linked into a child list are handled here.
    #[doc(alias = "xmlUnlinkNode")]
    pub(crate) fn unlink(&mut self, node: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(node);
            (n.parent, n.prev, n.next)
        };
        if let Some(parent) = parent {
            let p = self.node_mut(parent);
            if p.children == Some(node) {
                p.children = next;
            }
            if p.last == Some(node) {
                p.last = prev;
            }
        }
        if let Some(prev) = prev {
            self.node_mut(prev).next = next;
        }
        if let Some(next) = next {
            self.node_mut(next).prev = prev;
        }
        let n = self.node_mut(node);
        n.parent = None;
        n.prev = None;
        n.next = None;
    }

    /// Link an unlinked node as the last child of `parent`.
    pub(crate) fn link_last(&mut self, parent: NodeId, node: NodeId) {
        let last = self.node(parent).last;
        {
            let n = self.node_mut(node);
            n.parent = Some(parent);
            n.prev = last;
            n.next = None;
        }
        match last {
            Some(last) => self.node_mut(last).next = Some(node),
            None => self.node_mut(parent).children = Some(node),
        }
        self.node_mut(parent).last = Some(node);
    }

    fn check_linkable(&self, node: NodeId) -> Result<(), XmlError> {
        match self.node(node).kind {
            NodeKind::Document | NodeKind::Dtd(_) => {
                Err(XmlError::InvalidOperation("node cannot be placed under another node"))
            }
            NodeKind::Attribute(_) | NodeKind::NamespaceDecl(_) => Err(
                XmlError::InvalidOperation("attributes and namespaces are not child nodes"),
            ),
            _ => Ok(()),
        }
    }

    /// Add `child` to the end of the children of `parent`.
    ///
    /// `child` is unlinked from its previous position first.
    /// Returns the handle of `child`.
    #[doc(alias = "xmlAddChild")]
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, XmlError> {
        self.check(parent)?;
        self.check(child)?;
        match (&self.node(parent).kind, &self.node(child).kind) {
            (NodeKind::Document | NodeKind::Element(_), _) => {}
            (NodeKind::Dtd(_), NodeKind::Entity(_)) => {}
            _ => return Err(XmlError::InvalidOperation("node cannot have children")),
        }
        self.check_linkable(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(XmlError::InvalidOperation("node cannot contain itself"));
        }
        self.unlink(child);
        self.link_last(parent, child);
        Ok(child)
    }

    /// Add `elem` as the last sibling of `node`.
    ///
    /// If `node` is attached, `elem` gets the same parent.
    #[doc(alias = "xmlAddSibling")]
    pub fn add_sibling(&mut self, node: NodeId, elem: NodeId) -> Result<NodeId, XmlError> {
        self.check(node)?;
        self.check(elem)?;
        self.check_linkable(node)?;
        self.check_linkable(elem)?;
        if node == elem {
            return Err(XmlError::InvalidOperation("node cannot be its own sibling"));
        }
        if let Some(parent) = self.node(node).parent {
            return self.add_child(parent, elem);
        }
        self.unlink(elem);
        let mut last = node;
        while let Some(next) = self.node(last).next {
            last = next;
        }
        self.node_mut(last).next = Some(elem);
        self.node_mut(elem).prev = Some(last);
        Ok(elem)
    }

    /// Append the extra substring to the node content.
    ///
    /// Text-bearing nodes receive the bytes directly.
    /// Elements receive them in their last child if it is a text node,
    /// otherwise a new text child is created.
    #[doc(alias = "xmlNodeAddContent")]
    pub fn add_content(&mut self, node: NodeId, content: &[u8]) -> Result<(), XmlError> {
        self.check(node)?;
        let last = self.node(node).last;
        match &mut self.node_mut(node).kind {
            NodeKind::Text(text) | NodeKind::Comment(text) => {
                text.extend_from_slice(content);
                return Ok(());
            }
            NodeKind::ProcessingInstruction(pi) => {
                pi.data
                    .get_or_insert_with(String::new)
                    .push_str(&String::from_utf8_lossy(content));
                return Ok(());
            }
            NodeKind::Attribute(attr) => {
                attr.value.push_str(&String::from_utf8_lossy(content));
                return Ok(());
            }
            NodeKind::Element(_) => {}
            _ => return Err(XmlError::InvalidOperation("node does not carry content")),
        }
        if let Some(last) = last {
            if let NodeKind::Text(text) = &mut self.node_mut(last).kind {
                text.extend_from_slice(content);
                return Ok(());
            }
        }
        trace!("add_content: new text child");
        let text = self.new_text(content);
        self.link_last(node, text);
        Ok(())
    }

    /// Replace `old` with `cur` at the same place in the tree.
    ///
    /// `cur` is unlinked from its previous position. Returns `old`, which is left unlinked.
    #[doc(alias = "xmlReplaceNode")]
    pub fn replace(&mut self, old: NodeId, cur: NodeId) -> Result<NodeId, XmlError> {
        self.check(old)?;
        self.check(cur)?;
        if old == cur {
            return Ok(old);
        }
        self.check_linkable(old)?;
        self.check_linkable(cur)?;
        let Some(parent) = self.node(old).parent else {
            return Err(XmlError::InvalidOperation("node to replace is not attached"));
        };
        if self.is_ancestor_or_self(cur, parent) {
            return Err(XmlError::InvalidOperation("node cannot contain itself"));
        }
        self.unlink(cur);
        let (prev, next) = {
            let o = self.node(old);
            (o.prev, o.next)
        };
        {
            let c = self.node_mut(cur);
            c.parent = Some(parent);
            c.prev = prev;
            c.next = next;
        }
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(cur),
            None => self.node_mut(parent).children = Some(cur),
        }
        match next {
            Some(next) => self.node_mut(next).prev = Some(cur),
            None => self.node_mut(parent).last = Some(cur),
        }
        let o = self.node_mut(old);
        o.parent = None;
        o.prev = None;
        o.next = None;
        Ok(old)
    }
}

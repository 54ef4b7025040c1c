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

use std::{any::type_name, borrow::Cow};

use log::trace;

use crate::error::XmlError;

use super::{NodeId, NodeKind, XmlDoc, XmlNs};

/// A DTD Attribute type definition.
#[doc(alias = "xmlAttributeType")]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlAttributeType {
    #[default]
    XmlAttributeCDATA = 1,
    XmlAttributeID,
    XmlAttributeIDREF,
    XmlAttributeIDREFS,
    XmlAttributeEntity,
    XmlAttributeEntities,
    XmlAttributeNmtoken,
    XmlAttributeNmtokens,
    XmlAttributeEnumeration,
    XmlAttributeNotation,
}

impl TryFrom<i32> for XmlAttributeType {
    type Error = anyhow::Error;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::XmlAttributeCDATA),
            2 => Ok(Self::XmlAttributeID),
            3 => Ok(Self::XmlAttributeIDREF),
            4 => Ok(Self::XmlAttributeIDREFS),
            5 => Ok(Self::XmlAttributeEntity),
            6 => Ok(Self::XmlAttributeEntities),
            7 => Ok(Self::XmlAttributeNmtoken),
            8 => Ok(Self::XmlAttributeNmtokens),
            9 => Ok(Self::XmlAttributeEnumeration),
            10 => Ok(Self::XmlAttributeNotation),
            _ => Err(anyhow::anyhow!(
                "Invalid convert from value '{value}' to {}",
                type_name::<Self>()
            )),
        }
    }
}

/// A DTD Attribute default definition.
#[doc(alias = "xmlAttributeDefault")]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlAttributeDefault {
    #[default]
    XmlAttributeNone = 1,
    XmlAttributeRequired,
    XmlAttributeImplied,
    XmlAttributeFixed,
}

/// The payload of an attribute node.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttr {
    pub(crate) name: String,
    pub(crate) ns: Option<XmlNs>,
    pub(crate) value: String,
    pub(crate) atype: XmlAttributeType,
    /// The value came from a DTD default rather than the markup.
    pub(crate) default_attr: bool,
}

impl XmlAttr {
    pub fn new(name: &str, ns: Option<XmlNs>, value: &str) -> Self {
        Self {
            name: name.to_owned(),
            ns,
            value: value.to_owned(),
            atype: XmlAttributeType::default(),
            default_attr: false,
        }
    }

    /// The local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ns(&self) -> Option<&XmlNs> {
        self.ns.as_ref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn atype(&self) -> XmlAttributeType {
        self.atype
    }

    pub fn is_default(&self) -> bool {
        self.default_attr
    }

    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.ns.as_ref().and_then(|ns| ns.prefix()) {
            Some(prefix) => Cow::Owned(format!("{prefix}:{}", self.name)),
            None => Cow::Borrowed(&self.name),
        }
    }

    fn same_name(&self, name: &str, href: Option<&str>) -> bool {
        self.name == name && self.ns.as_ref().and_then(|ns| ns.href()) == href
    }
}

/// Iterator over the attribute chain of an element.
pub struct Attributes<'a> {
    doc: &'a XmlDoc,
    next: Option<NodeId>,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = (NodeId, &'a XmlAttr);

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        let node = self.doc.node(cur);
        self.next = node.next;
        match &node.kind {
            NodeKind::Attribute(attr) => Some((cur, attr)),
            _ => None,
        }
    }
}

impl XmlDoc {
    /// The attributes of `elem` in insertion order.
    pub fn attributes(&self, elem: NodeId) -> Attributes<'_> {
        Attributes {
            doc: self,
            next: self.element(elem).and_then(|elem| elem.properties),
        }
    }

    pub fn attribute(&self, attr: NodeId) -> Option<&XmlAttr> {
        match self.kind(attr)? {
            NodeKind::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    /// Search an attribute without namespace.
    #[doc(alias = "xmlHasProp")]
    pub fn has_attribute(&self, elem: NodeId, name: &str) -> Option<NodeId> {
        self.attributes(elem)
            .find(|(_, attr)| attr.same_name(name, None))
            .map(|(id, _)| id)
    }

    /// Search an attribute with the given local name and namespace URI.
    #[doc(alias = "xmlHasNsProp")]
    pub fn has_ns_attribute(&self, elem: NodeId, name: &str, href: Option<&str>) -> Option<NodeId> {
        self.attributes(elem)
            .find(|(_, attr)| attr.same_name(name, href))
            .map(|(id, _)| id)
    }

    #[doc(alias = "xmlGetProp")]
    pub fn get_attribute(&self, elem: NodeId, name: &str) -> Option<&str> {
        self.attributes(elem)
            .find(|(_, attr)| attr.same_name(name, None))
            .map(|(_, attr)| attr.value())
    }

    #[doc(alias = "xmlGetNsProp")]
    pub fn get_ns_attribute(&self, elem: NodeId, name: &str, href: Option<&str>) -> Option<&str> {
        self.attributes(elem)
            .find(|(_, attr)| attr.same_name(name, href))
            .map(|(_, attr)| attr.value())
    }

    /// Add an attribute without namespace to `elem`.
    ///
    /// Fails with [`XmlError::DuplicateAttribute`] if the element already carries one with this name.
    #[doc(alias = "xmlNewProp")]
    pub fn set_attribute(
        &mut self,
        elem: NodeId,
        name: &str,
        value: &str,
    ) -> Result<NodeId, XmlError> {
        self.add_attribute(elem, XmlAttr::new(name, None, value))
    }

    /// Add an attribute bound to `ns` to `elem`.
    ///
    /// Attributes are unique by local name and namespace URI.
    #[doc(alias = "xmlNewNsProp")]
    pub fn set_ns_attribute(
        &mut self,
        elem: NodeId,
        ns: Option<XmlNs>,
        name: &str,
        value: &str,
    ) -> Result<NodeId, XmlError> {
        self.add_attribute(elem, XmlAttr::new(name, ns, value))
    }

    pub(crate) fn add_attribute(&mut self, elem: NodeId, attr: XmlAttr) -> Result<NodeId, XmlError> {
        self.check(elem)?;
        let Some(element) = self.element(elem) else {
            return Err(XmlError::InvalidOperation(
                "attributes can only be set on elements",
            ));
        };
        let href = attr.ns.as_ref().and_then(|ns| ns.href());
        if self.has_ns_attribute(elem, &attr.name, href).is_some() {
            return Err(XmlError::DuplicateAttribute {
                element: element.qualified_name().into_owned(),
                name: attr.qualified_name().into_owned(),
            });
        }
        trace!("add_attribute: {}", attr.qualified_name());
        let last = self.attributes(elem).last().map(|(id, _)| id);
        let id = self.alloc(NodeKind::Attribute(attr));
        {
            let node = self.node_mut(id);
            node.parent = Some(elem);
            node.prev = last;
        }
        match last {
            Some(last) => self.node_mut(last).next = Some(id),
            None => {
                if let Some(element) = self.element_mut(elem) {
                    element.properties = Some(id);
                }
            }
        }
        Ok(id)
    }
}

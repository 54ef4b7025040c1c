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

use crate::error::XmlError;

use super::{NodeId, NodeKind, XmlDoc};

/// The namespace bound to the `xml` prefix.
pub const XML_XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A namespace binding: a URI and the prefix used for it.
///
/// An empty prefix or URI is treated the same as an absent one.
#[doc(alias = "xmlNs")]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNs {
    pub(crate) href: Option<String>,
    pub(crate) prefix: Option<String>,
}

impl XmlNs {
    pub fn new(href: &str, prefix: Option<&str>) -> Self {
        Self {
            href: (!href.is_empty()).then(|| href.to_owned()),
            prefix: prefix.filter(|p| !p.is_empty()).map(|p| p.to_owned()),
        }
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl XmlDoc {
    /// Creation of a new namespace declaration on `elem`.
    ///
    /// Declaring the same prefix twice on one element is refused.
    #[doc(alias = "xmlNewNs")]
    pub fn new_ns_decl(
        &mut self,
        elem: NodeId,
        href: &str,
        prefix: Option<&str>,
    ) -> Result<NodeId, XmlError> {
        self.check(elem)?;
        let ns = XmlNs::new(href, prefix);
        let Some(element) = self.element(elem) else {
            return Err(XmlError::InvalidOperation(
                "namespaces can only be declared on elements",
            ));
        };
        if ns.prefix() == Some("xml") {
            return Err(XmlError::InvalidOperation("the xml prefix cannot be redeclared"));
        }
        let exists = element.ns_def.iter().any(|&decl| {
            matches!(&self.node(decl).kind, NodeKind::NamespaceDecl(cur) if cur.prefix() == ns.prefix())
        });
        if exists {
            return Err(XmlError::InvalidOperation("namespace prefix already declared"));
        }
        let decl = self.alloc(NodeKind::NamespaceDecl(ns));
        self.node_mut(decl).parent = Some(elem);
        if let Some(element) = self.element_mut(elem) {
            element.ns_def.push(decl);
        }
        Ok(decl)
    }

    /// The namespace declarations of `elem`, in declaration order.
    pub fn ns_defs(&self, elem: NodeId) -> impl Iterator<Item = &XmlNs> {
        self.element(elem)
            .into_iter()
            .flat_map(|elem| elem.ns_def.iter())
            .filter_map(move |&decl| match &self.node(decl).kind {
                NodeKind::NamespaceDecl(ns) => Some(ns),
                _ => None,
            })
    }

    /// Search the namespace bound to `prefix` in the scope of `node`.
    ///
    /// `None` looks up the default namespace.
    #[doc(alias = "xmlSearchNs")]
    pub fn search_ns(&self, node: NodeId, prefix: Option<&str>) -> Option<XmlNs> {
        if prefix == Some("xml") {
            return Some(XmlNs::new(XML_XML_NAMESPACE, Some("xml")));
        }
        let mut cur = Some(node);
        while let Some(now) = cur {
            if let Some(ns) = self.ns_defs(now).find(|ns| ns.prefix() == prefix) {
                return Some(ns.clone());
            }
            cur = self.parent(now);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ns_decl_test() {
        let mut doc = XmlDoc::new(None);
        let root = doc.new_element("root");
        let child = doc.new_element("child");
        doc.add_child(root, child).unwrap();

        let decl = doc.new_ns_decl(root, "urn:a", Some("a")).unwrap();
        doc.new_ns_decl(root, "urn:d", None).unwrap();
        assert_eq!(doc.parent(decl), Some(root));
        // declarations are not children
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![child]);
        assert!(matches!(
            doc.new_ns_decl(root, "urn:b", Some("a")),
            Err(XmlError::InvalidOperation(_))
        ));

        let defs = doc.ns_defs(root).cloned().collect::<Vec<_>>();
        assert_eq!(
            defs,
            vec![XmlNs::new("urn:a", Some("a")), XmlNs::new("urn:d", None)]
        );

        assert_eq!(
            doc.search_ns(child, Some("a")),
            Some(XmlNs::new("urn:a", Some("a")))
        );
        assert_eq!(doc.search_ns(child, None), Some(XmlNs::new("urn:d", None)));
        assert_eq!(doc.search_ns(child, Some("b")), None);
        assert_eq!(
            doc.search_ns(child, Some("xml")).and_then(|ns| ns.href().map(str::to_owned)),
            Some(XML_XML_NAMESPACE.to_owned())
        );
    }

    #[test]
    fn empty_names_test() {
        let ns = XmlNs::new("", Some(""));
        assert_eq!(ns.href(), None);
        assert_eq!(ns.prefix(), None);
    }
}

//! Provide methods and data structures for SAX2 handlers.
//! This module is based on `libxml/SAX2.h`, `SAX2.c`, and so on in `libxml2-v2.11.8`.
//!
//! Please refer to original libxml2 documents also.

// Copyright of the original code is the following.
// --------
// Summary: SAX2 parser interface used to build the DOM tree
// Description: those are the default SAX2 interfaces used by
//              the library when building DOM tree.
//
// Copy: See Copyright for the status of this software.
//
// Author: Daniel Veillard
// --------
// SAX2.c : Default SAX2 handler to build a tree.
//
// See Copyright for the status of this software.
//
// Daniel Veillard <daniel@veillard.com>

use std::rc::Rc;

use log::{debug, trace, warn};

use crate::{
    error::XmlError,
    parser::{
        XmlInSubset, XmlParserCtxt,
        sax::{SaxAttribute, SaxHandler, SaxNamespace},
    },
    tree::{
        NodeId, XmlAttr, XmlDoc, XmlEntity, XmlEntityType, XmlNs, XmlStandalone,
        xml_get_predefined_entity,
    },
};

/// The default SAX2 handler: it builds an [`XmlDoc`] from the notifications it receives.
///
/// The builder keeps the document under construction and a cursor on the
/// element that receives the next child. The document is handed over to the
/// parser context when the document end is notified.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    doc: Option<XmlDoc>,
    node: Option<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The document under construction, if the document start has been notified.
    pub fn document(&self) -> Option<&XmlDoc> {
        self.doc.as_ref()
    }

    /// The element that receives the next child.
    pub fn current_node(&self) -> Option<NodeId> {
        self.node
    }

    /// Get a parameter entity by name.
    ///
    /// Unlike [`SaxHandler::get_parameter_entity`], the context is optional here
    /// so that callers without one get [`XmlError::InvalidParserContext`].
    #[doc(alias = "xmlSAX2GetParameterEntity")]
    pub fn resolve_parameter_entity(
        &self,
        ctxt: Option<&XmlParserCtxt>,
        name: &str,
    ) -> Result<Rc<XmlEntity>, XmlError> {
        if ctxt.is_none() {
            return Err(XmlError::InvalidParserContext);
        }
        let Some(doc) = self.doc.as_ref() else {
            return Err(XmlError::InvalidDocument);
        };
        doc.get_parameter_entity(name)
            .ok_or_else(|| XmlError::EntityNotFound(name.to_owned()))
    }

    /// An entity definition has been parsed.
    ///
    /// Declarations never fail: an entity that cannot be registered is reported and dropped.
    #[doc(alias = "xmlSAX2EntityDecl")]
    fn entity_decl(
        &mut self,
        ctxt: &XmlParserCtxt,
        name: &str,
        typ: XmlEntityType,
        public_id: Option<&str>,
        system_id: Option<&str>,
        content: Option<&str>,
    ) {
        let Some(doc) = self.doc.as_mut() else {
            debug!("xmlSAX2EntityDecl: no document for '{name}'");
            return;
        };
        let (res, subset) = if ctxt.in_subset == XmlInSubset::ExternalSubset {
            doc.create_ext_subset(None, None, None);
            (
                doc.add_dtd_entity(name, typ, public_id, system_id, content),
                "external",
            )
        } else {
            (
                doc.add_doc_entity(name, typ, public_id, system_id, content),
                "internal",
            )
        };
        match res {
            Ok(Some(_)) => trace!("xmlSAX2EntityDecl: {name} in the {subset} subset"),
            Ok(None) => warn!("Entity({name}) already defined in the {subset} subset"),
            Err(err) => warn!("xmlSAX2EntityDecl: {name}: {err}"),
        }
    }
}

impl SaxHandler for TreeBuilder {
    /// Called when the document start being processed.
    #[doc(alias = "xmlSAX2StartDocument")]
    fn start_document(&mut self, ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2StartDocument()");
        self.doc = Some(XmlDoc::with_declaration(
            ctxt.version(),
            ctxt.encoding(),
            ctxt.standalone(),
        ));
        self.node = None;
        Ok(())
    }

    /// Called when the document end has been detected.
    #[doc(alias = "xmlSAX2EndDocument")]
    fn end_document(&mut self, ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2EndDocument()");
        ctxt.my_doc = self.doc.take();
        self.node = None;
        Ok(())
    }

    /// A processing instruction has been parsed.
    ///
    /// The node is registered in the internal subset and also placed in the tree.
    #[doc(alias = "xmlSAX2ProcessingInstruction")]
    fn processing_instruction(
        &mut self,
        _ctxt: &mut XmlParserCtxt,
        target: &str,
        data: Option<&str>,
    ) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2ProcessingInstruction({target}, {data:?})");
        let Some(doc) = self.doc.as_mut() else {
            return Err(XmlError::InvalidDocument);
        };
        let pi = doc.new_pi(target, data);
        doc.int_subset_mut().pis.push(pi);
        let parent = self.node.unwrap_or(doc.document_node());
        doc.add_child(parent, pi)?;
        Ok(())
    }

    /// Called when an opening tag has been processed.
    #[doc(alias = "xmlSAX2StartElementNs")]
    fn start_element_ns(
        &mut self,
        _ctxt: &mut XmlParserCtxt,
        localname: &str,
        prefix: Option<&str>,
        uri: Option<&str>,
        namespaces: &[SaxNamespace],
        attributes: &[SaxAttribute],
    ) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2StartElementNs({localname}, {prefix:?}, {uri:?})");
        let Some(doc) = self.doc.as_mut() else {
            return Err(XmlError::InvalidDocument);
        };
        let ns = (prefix.is_some() || uri.is_some())
            .then(|| XmlNs::new(uri.unwrap_or_default(), prefix));
        let elem = doc.new_ns_element(ns, localname);
        for decl in namespaces {
            doc.new_ns_decl(elem, decl.uri, decl.prefix)?;
        }
        for attr in attributes {
            let ns = (attr.prefix.is_some() || attr.uri.is_some())
                .then(|| XmlNs::new(attr.uri.unwrap_or_default(), attr.prefix));
            let mut prop = XmlAttr::new(attr.local_name, ns, attr.value);
            prop.default_attr = attr.defaulted;
            doc.add_attribute(elem, prop)?;
        }
        let parent = self.node.unwrap_or(doc.document_node());
        doc.add_child(parent, elem)?;
        self.node = Some(elem);
        Ok(())
    }

    /// Called when the end of an element has been detected.
    ///
    /// The cursor moves up only if the names match the current element.
    #[doc(alias = "xmlSAX2EndElementNs")]
    fn end_element_ns(
        &mut self,
        _ctxt: &mut XmlParserCtxt,
        localname: &str,
        prefix: Option<&str>,
        uri: Option<&str>,
    ) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2EndElementNs({localname}, {prefix:?}, {uri:?})");
        let (Some(doc), Some(cur)) = (self.doc.as_ref(), self.node) else {
            return Ok(());
        };
        let Some(elem) = doc.element(cur) else {
            return Ok(());
        };
        let prefix = prefix.filter(|p| !p.is_empty());
        let uri = uri.filter(|u| !u.is_empty());
        if elem.name() == localname && elem.prefix() == prefix && elem.uri() == uri {
            self.node = doc
                .parent(cur)
                .filter(|&parent| doc.element(parent).is_some());
        } else {
            debug!(
                "xmlSAX2EndElementNs: {localname} does not close {}",
                elem.qualified_name()
            );
        }
        Ok(())
    }

    /// Receiving some chars from the parser.
    #[doc(alias = "xmlSAX2Characters")]
    fn characters(&mut self, _ctxt: &mut XmlParserCtxt, ch: &[u8]) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2Characters({} bytes)", ch.len());
        let (Some(doc), Some(cur)) = (self.doc.as_mut(), self.node) else {
            return Err(XmlError::Structural("text content placed in wrong location"));
        };
        doc.add_content(cur, ch)
    }

    /// Receiving some ignorable whitespaces from the parser.
    ///
    /// They are kept as text unless blanks are removed.
    #[doc(alias = "xmlSAX2IgnorableWhitespace")]
    fn ignorable_whitespace(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        ch: &[u8],
    ) -> Result<(), XmlError> {
        if ctxt.keep_blanks() {
            self.characters(ctxt, ch)
        } else {
            Ok(())
        }
    }

    /// A comment has been parsed.
    #[doc(alias = "xmlSAX2Comment")]
    fn comment(&mut self, _ctxt: &mut XmlParserCtxt, value: &[u8]) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2Comment({} bytes)", value.len());
        let (Some(doc), Some(cur)) = (self.doc.as_mut(), self.node) else {
            return Err(XmlError::Structural("comment placed in wrong location"));
        };
        let comment = doc.new_comment(value);
        doc.add_child(cur, comment)?;
        Ok(())
    }

    /// Callback on internal subset declaration.
    #[doc(alias = "xmlSAX2InternalSubset")]
    fn internal_subset(
        &mut self,
        _ctxt: &mut XmlParserCtxt,
        name: Option<&str>,
        external_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2InternalSubset({name:?}, {external_id:?}, {system_id:?})");
        if let Some(doc) = self.doc.as_mut() {
            doc.int_subset_mut().set_ids(name, external_id, system_id);
        }
        Ok(())
    }

    /// Callback on external subset declaration.
    ///
    /// Only the descriptor is recorded; nothing is loaded.
    #[doc(alias = "xmlSAX2ExternalSubset")]
    fn external_subset(
        &mut self,
        _ctxt: &mut XmlParserCtxt,
        name: Option<&str>,
        external_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2ExternalSubset({name:?}, {external_id:?}, {system_id:?})");
        if external_id.is_none() && system_id.is_none() {
            return Ok(());
        }
        if let Some(doc) = self.doc.as_mut() {
            doc.create_ext_subset(name, external_id, system_id);
        }
        Ok(())
    }

    fn get_external_subset(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: Option<&str>,
        _base_uri: Option<&str>,
    ) -> Result<(), XmlError> {
        let Some(doc) = self.doc.as_ref() else {
            return Ok(());
        };
        let dtd = doc.int_subset();
        let (external_id, system_id) = (
            dtd.external_id().map(|e| e.to_owned()),
            dtd.system_id().map(|s| s.to_owned()),
        );
        self.external_subset(ctxt, name, external_id.as_deref(), system_id.as_deref())
    }

    fn internal_entity_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        value: &str,
    ) -> Result<(), XmlError> {
        let (name, typ) = match name.strip_prefix('%') {
            Some(name) => (name, XmlEntityType::XmlInternalParameterEntity),
            None => (name, XmlEntityType::XmlInternalGeneralEntity),
        };
        self.entity_decl(ctxt, name, typ, None, None, Some(value));
        Ok(())
    }

    fn external_entity_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        let (name, typ) = match name.strip_prefix('%') {
            Some(name) => (name, XmlEntityType::XmlExternalParameterEntity),
            None => (name, XmlEntityType::XmlExternalGeneralParsedEntity),
        };
        self.entity_decl(ctxt, name, typ, public_id, system_id, None);
        Ok(())
    }

    /// An unparsed entity declaration has been parsed.
    #[doc(alias = "xmlSAX2UnparsedEntityDecl")]
    fn unparsed_entity_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        notation_name: &str,
    ) -> Result<(), XmlError> {
        self.entity_decl(
            ctxt,
            name,
            XmlEntityType::XmlExternalGeneralUnparsedEntity,
            public_id,
            system_id,
            Some(notation_name),
        );
        Ok(())
    }

    /// Get an entity by name.
    ///
    /// For a standalone document, an entity that is only found once the external
    /// subset is searched as well is still returned (with a warning). If it cannot be
    /// found at all, [`XmlError::NotStandalone`] is returned.
    #[doc(alias = "xmlSAX2GetEntity")]
    fn get_entity(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
    ) -> Result<Option<Rc<XmlEntity>>, XmlError> {
        if ctxt.in_subset == XmlInSubset::NotInSubset {
            if let Some(ent) = xml_get_predefined_entity(name) {
                return Ok(Some(ent));
            }
        }
        let Some(doc) = self.doc.as_mut() else {
            return Ok(None);
        };
        if doc.standalone != XmlStandalone::ExplicitYes {
            return Ok(doc.get_doc_entity(name));
        }
        if ctxt.in_subset == XmlInSubset::ExternalSubset {
            doc.standalone = XmlStandalone::ExplicitNo;
            let ret = doc.get_doc_entity(name);
            doc.standalone = XmlStandalone::ExplicitYes;
            return Ok(ret);
        }
        if let Some(ent) = doc.get_doc_entity(name) {
            return Ok(Some(ent));
        }
        doc.standalone = XmlStandalone::ExplicitNo;
        let ret = doc.get_doc_entity(name);
        doc.standalone = XmlStandalone::ExplicitYes;
        match ret {
            Some(ent) => {
                warn!(
                    "Entity({name}) document marked standalone but requires external subset"
                );
                Ok(Some(ent))
            }
            None => Err(XmlError::NotStandalone(name.to_owned())),
        }
    }

    /// Get a parameter entity by name.
    #[doc(alias = "xmlSAX2GetParameterEntity")]
    fn get_parameter_entity(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
    ) -> Result<Rc<XmlEntity>, XmlError> {
        self.resolve_parameter_entity(Some(ctxt), name)
    }

    /// Called when an entity reference is detected.
    #[doc(alias = "xmlSAX2Reference")]
    fn reference(&mut self, _ctxt: &mut XmlParserCtxt, name: &str) -> Result<(), XmlError> {
        trace!("SAX.xmlSAX2Reference({name})");
        let (Some(doc), Some(cur)) = (self.doc.as_mut(), self.node) else {
            return Err(XmlError::Structural("entity reference placed in wrong location"));
        };
        let reference = doc.new_reference(name);
        doc.add_child(cur, reference)?;
        Ok(())
    }

    fn skipped_entity(&mut self, _ctxt: &mut XmlParserCtxt, name: &str) -> Result<(), XmlError> {
        debug!("SAX.skippedEntity({name})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::{NodeKind, XmlElementType};

    use super::*;

    fn started(standalone: XmlStandalone) -> (XmlParserCtxt, TreeBuilder) {
        let mut ctxt = XmlParserCtxt::new();
        ctxt.set_version(Some("1.0"));
        ctxt.set_standalone(standalone);
        let mut builder = TreeBuilder::new();
        builder.start_document(&mut ctxt).unwrap();
        (ctxt, builder)
    }

    fn open(builder: &mut TreeBuilder, ctxt: &mut XmlParserCtxt, name: &str) {
        builder
            .start_element_ns(ctxt, name, None, None, &[], &[])
            .unwrap();
    }

    #[test]
    fn start_document_test() {
        let mut ctxt = XmlParserCtxt::new();
        ctxt.set_version(Some("1.0"));
        ctxt.set_encoding(Some("UTF-8"));
        ctxt.set_standalone(XmlStandalone::ExplicitNo);
        let mut builder = TreeBuilder::new();
        assert!(builder.document().is_none());
        builder.start_document(&mut ctxt).unwrap();
        let doc = builder.document().unwrap();
        assert_eq!(doc.version(), Some("1.0"));
        assert_eq!(doc.encoding(), Some("UTF-8"));
        assert_eq!(doc.standalone(), XmlStandalone::ExplicitNo);
        assert_eq!(builder.current_node(), None);

        builder.end_document(&mut ctxt).unwrap();
        assert!(builder.document().is_none());
        assert!(ctxt.document().is_some());
    }

    #[test]
    fn element_nesting_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        open(&mut builder, &mut ctxt, "root");
        let root = builder.current_node().unwrap();
        open(&mut builder, &mut ctxt, "child");
        let child = builder.current_node().unwrap();
        builder
            .end_element_ns(&mut ctxt, "child", None, None)
            .unwrap();
        assert_eq!(builder.current_node(), Some(root));
        builder
            .end_element_ns(&mut ctxt, "root", None, None)
            .unwrap();
        assert_eq!(builder.current_node(), None);

        let doc = builder.document().unwrap();
        assert_eq!(doc.root_element(), Some(root));
        assert_eq!(doc.parent(child), Some(root));
        assert_eq!(doc.parent(root), Some(doc.document_node()));
    }

    #[test]
    fn end_element_mismatch_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        builder
            .start_element_ns(&mut ctxt, "a", Some("p"), Some("urn:p"), &[], &[])
            .unwrap();
        let a = builder.current_node();
        builder.end_element_ns(&mut ctxt, "b", None, None).unwrap();
        assert_eq!(builder.current_node(), a);
        builder
            .end_element_ns(&mut ctxt, "a", None, Some("urn:p"))
            .unwrap();
        assert_eq!(builder.current_node(), a);
        builder
            .end_element_ns(&mut ctxt, "a", Some("p"), Some("urn:q"))
            .unwrap();
        assert_eq!(builder.current_node(), a);
        builder
            .end_element_ns(&mut ctxt, "a", Some("p"), Some("urn:p"))
            .unwrap();
        assert_eq!(builder.current_node(), None);
    }

    #[test]
    fn characters_without_cursor_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        assert!(matches!(
            builder.characters(&mut ctxt, b"text"),
            Err(XmlError::Structural(_))
        ));
        assert!(matches!(
            builder.comment(&mut ctxt, b"comment"),
            Err(XmlError::Structural(_))
        ));
        assert!(matches!(
            builder.reference(&mut ctxt, "amp"),
            Err(XmlError::Structural(_))
        ));
        let doc = builder.document().unwrap();
        assert_eq!(doc.first_child(doc.document_node()), None);
    }

    #[test]
    fn characters_merge_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        open(&mut builder, &mut ctxt, "root");
        builder.characters(&mut ctxt, b"hel").unwrap();
        builder.characters(&mut ctxt, b"lo").unwrap();
        builder.comment(&mut ctxt, b" c ").unwrap();
        builder.characters(&mut ctxt, b"!").unwrap();

        let root = builder.current_node().unwrap();
        let doc = builder.document().unwrap();
        let children = doc.children(root).collect::<Vec<_>>();
        assert_eq!(children.len(), 3);
        assert_eq!(doc.content(children[0]), Some(&b"hello"[..]));
        assert_eq!(
            doc.node_type(children[1]),
            Some(XmlElementType::XmlCommentNode)
        );
        assert_eq!(doc.content(children[2]), Some(&b"!"[..]));
    }

    #[test]
    fn ignorable_whitespace_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        open(&mut builder, &mut ctxt, "root");
        builder.ignorable_whitespace(&mut ctxt, b"  ").unwrap();
        let root = builder.current_node().unwrap();
        assert_eq!(builder.document().unwrap().children(root).count(), 1);

        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        ctxt.use_options(crate::parser::XmlParserOption::XmlParseNoblanks as i32);
        open(&mut builder, &mut ctxt, "root");
        builder.ignorable_whitespace(&mut ctxt, b"  ").unwrap();
        let root = builder.current_node().unwrap();
        assert_eq!(builder.document().unwrap().children(root).count(), 0);
    }

    #[test]
    fn duplicate_attribute_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        let attr = SaxAttribute {
            local_name: "a",
            prefix: None,
            uri: None,
            value: "1",
            defaulted: false,
        };
        let err = builder
            .start_element_ns(&mut ctxt, "e", None, None, &[], &[attr, attr])
            .unwrap_err();
        assert!(matches!(err, XmlError::DuplicateAttribute { .. }));
        assert_eq!(builder.current_node(), None);
    }

    #[test]
    fn attributes_and_namespaces_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        let namespaces = [
            SaxNamespace {
                prefix: Some("p"),
                uri: "urn:p",
            },
            SaxNamespace {
                prefix: None,
                uri: "urn:d",
            },
        ];
        let attributes = [
            SaxAttribute {
                local_name: "a",
                prefix: None,
                uri: None,
                value: "1",
                defaulted: false,
            },
            SaxAttribute {
                local_name: "a",
                prefix: Some("p"),
                uri: Some("urn:p"),
                value: "2",
                defaulted: true,
            },
        ];
        builder
            .start_element_ns(
                &mut ctxt,
                "e",
                None,
                Some("urn:d"),
                &namespaces,
                &attributes,
            )
            .unwrap();
        let e = builder.current_node().unwrap();
        let doc = builder.document().unwrap();
        assert_eq!(doc.element(e).unwrap().uri(), Some("urn:d"));
        assert_eq!(doc.ns_defs(e).count(), 2);
        assert_eq!(doc.get_attribute(e, "a"), Some("1"));
        assert_eq!(doc.get_ns_attribute(e, "a", Some("urn:p")), Some("2"));
        let defaulted = doc
            .attributes(e)
            .map(|(_, attr)| attr.is_default())
            .collect::<Vec<_>>();
        assert_eq!(defaulted, vec![false, true]);
    }

    #[test]
    fn processing_instruction_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        builder
            .processing_instruction(&mut ctxt, "top", Some("x"))
            .unwrap();
        open(&mut builder, &mut ctxt, "root");
        builder
            .processing_instruction(&mut ctxt, "inner", None)
            .unwrap();

        let root = builder.current_node().unwrap();
        let doc = builder.document().unwrap();
        let pis = doc.int_subset().processing_instructions();
        assert_eq!(pis.len(), 2);
        assert_eq!(doc.parent(pis[0]), Some(doc.document_node()));
        assert_eq!(doc.parent(pis[1]), Some(root));
        assert_eq!(doc.first_child(root), Some(pis[1]));
    }

    #[test]
    fn processing_instruction_without_document_test() {
        let mut ctxt = XmlParserCtxt::new();
        let mut builder = TreeBuilder::new();
        assert!(matches!(
            builder.processing_instruction(&mut ctxt, "t", None),
            Err(XmlError::InvalidDocument)
        ));
    }

    #[test]
    fn entity_decl_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        ctxt.set_in_subset(XmlInSubset::InternalSubset);
        builder
            .internal_entity_decl(&mut ctxt, "e", "first")
            .unwrap();
        builder
            .internal_entity_decl(&mut ctxt, "e", "second")
            .unwrap();
        builder
            .internal_entity_decl(&mut ctxt, "%p", "param")
            .unwrap();
        builder
            .external_entity_decl(&mut ctxt, "x", None, Some("x.xml"))
            .unwrap();
        builder
            .unparsed_entity_decl(&mut ctxt, "img", None, Some("img.png"), "png")
            .unwrap();
        builder
            .internal_entity_decl(&mut ctxt, "lt", "oops")
            .unwrap();

        ctxt.set_in_subset(XmlInSubset::ExternalSubset);
        builder
            .internal_entity_decl(&mut ctxt, "ext", "from external")
            .unwrap();
        ctxt.set_in_subset(XmlInSubset::NotInSubset);

        let doc = builder.document().unwrap();
        let dtd = doc.int_subset();
        assert_eq!(dtd.get_entity("e").unwrap().content(), Some("first"));
        assert!(dtd.get_entity("p").is_none());
        assert_eq!(
            dtd.get_parameter_entity("p").unwrap().etype(),
            XmlEntityType::XmlInternalParameterEntity
        );
        assert_eq!(
            dtd.get_entity("x").unwrap().etype(),
            XmlEntityType::XmlExternalGeneralParsedEntity
        );
        let img = dtd.get_entity("img").unwrap();
        assert_eq!(img.etype(), XmlEntityType::XmlExternalGeneralUnparsedEntity);
        assert_eq!(img.content(), Some("png"));
        assert!(dtd.get_entity("lt").is_none());
        assert!(dtd.get_entity("ext").is_none());
        assert_eq!(
            doc.get_dtd_entity("ext").unwrap().content(),
            Some("from external")
        );
    }

    #[test]
    fn predefined_entity_without_document_test() {
        let mut ctxt = XmlParserCtxt::new();
        let mut builder = TreeBuilder::new();
        let ent = builder.get_entity(&mut ctxt, "amp").unwrap().unwrap();
        assert_eq!(ent.content(), Some("&"));
        assert!(builder.get_entity(&mut ctxt, "nbsp").unwrap().is_none());
    }

    fn with_entities(standalone: XmlStandalone) -> (XmlParserCtxt, TreeBuilder) {
        let (mut ctxt, mut builder) = started(standalone);
        ctxt.set_in_subset(XmlInSubset::InternalSubset);
        builder
            .internal_entity_decl(&mut ctxt, "int", "internal")
            .unwrap();
        ctxt.set_in_subset(XmlInSubset::ExternalSubset);
        builder
            .internal_entity_decl(&mut ctxt, "ext", "external")
            .unwrap();
        ctxt.set_in_subset(XmlInSubset::NotInSubset);
        (ctxt, builder)
    }

    #[test]
    fn entity_lookup_not_standalone_test() {
        let (mut ctxt, mut builder) = with_entities(XmlStandalone::ExplicitNo);
        let int = builder.get_entity(&mut ctxt, "int").unwrap().unwrap();
        assert_eq!(int.content(), Some("internal"));
        let ext = builder.get_entity(&mut ctxt, "ext").unwrap().unwrap();
        assert_eq!(ext.content(), Some("external"));
        assert!(builder.get_entity(&mut ctxt, "none").unwrap().is_none());
    }

    #[test]
    fn entity_lookup_standalone_test() {
        let (mut ctxt, mut builder) = with_entities(XmlStandalone::ExplicitYes);
        let int = builder.get_entity(&mut ctxt, "int").unwrap().unwrap();
        assert_eq!(int.content(), Some("internal"));

        // only reachable through the external subset: returned, flag restored
        let ext = builder.get_entity(&mut ctxt, "ext").unwrap().unwrap();
        assert_eq!(ext.content(), Some("external"));
        assert_eq!(
            builder.document().unwrap().standalone(),
            XmlStandalone::ExplicitYes
        );

        // not found at all
        let err = builder.get_entity(&mut ctxt, "none").unwrap_err();
        assert!(matches!(err, XmlError::NotStandalone(ref name) if name == "none"));
        assert_eq!(
            builder.document().unwrap().standalone(),
            XmlStandalone::ExplicitYes
        );

        // predefined entities never need the external subset
        assert!(builder.get_entity(&mut ctxt, "quot").unwrap().is_some());
    }

    #[test]
    fn entity_lookup_in_external_subset_test() {
        let (mut ctxt, mut builder) = with_entities(XmlStandalone::ExplicitYes);
        ctxt.set_in_subset(XmlInSubset::ExternalSubset);
        let ext = builder.get_entity(&mut ctxt, "ext").unwrap().unwrap();
        assert_eq!(ext.content(), Some("external"));
        assert!(builder.get_entity(&mut ctxt, "none").unwrap().is_none());
        assert_eq!(
            builder.document().unwrap().standalone(),
            XmlStandalone::ExplicitYes
        );
    }

    #[test]
    fn parameter_entity_test() {
        let builder = TreeBuilder::new();
        let ctxt = XmlParserCtxt::new();
        assert!(matches!(
            builder.resolve_parameter_entity(None, "p"),
            Err(XmlError::InvalidParserContext)
        ));
        assert!(matches!(
            builder.resolve_parameter_entity(Some(&ctxt), "p"),
            Err(XmlError::InvalidDocument)
        ));

        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        ctxt.set_in_subset(XmlInSubset::InternalSubset);
        builder
            .internal_entity_decl(&mut ctxt, "%p", "value")
            .unwrap();
        ctxt.set_in_subset(XmlInSubset::ExternalSubset);
        builder
            .external_entity_decl(&mut ctxt, "%q", None, Some("q.ent"))
            .unwrap();
        let p = builder.get_parameter_entity(&mut ctxt, "p").unwrap();
        assert_eq!(p.content(), Some("value"));
        let q = builder.get_parameter_entity(&mut ctxt, "q").unwrap();
        assert_eq!(q.etype(), XmlEntityType::XmlExternalParameterEntity);
        assert!(matches!(
            builder.get_parameter_entity(&mut ctxt, "r"),
            Err(XmlError::EntityNotFound(_))
        ));
    }

    #[test]
    fn reference_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        ctxt.set_in_subset(XmlInSubset::InternalSubset);
        builder
            .internal_entity_decl(&mut ctxt, "e", "value")
            .unwrap();
        ctxt.set_in_subset(XmlInSubset::NotInSubset);
        open(&mut builder, &mut ctxt, "root");
        builder.reference(&mut ctxt, "e").unwrap();
        builder.reference(&mut ctxt, "unknown").unwrap();

        let root = builder.current_node().unwrap();
        let doc = builder.document().unwrap();
        let refs = doc
            .children(root)
            .map(|child| match doc.kind(child) {
                Some(NodeKind::EntityRef(er)) => (er.name().to_owned(), er.entity().is_some()),
                _ => unreachable!(),
            })
            .collect::<Vec<_>>();
        assert_eq!(
            refs,
            vec![("e".to_owned(), true), ("unknown".to_owned(), false)]
        );
    }

    #[test]
    fn internal_subset_test() {
        let (mut ctxt, mut builder) = started(XmlStandalone::ImplicitNo);
        builder
            .internal_subset(&mut ctxt, Some("doc"), None, Some("doc.dtd"))
            .unwrap();
        builder.get_external_subset(&mut ctxt, Some("doc"), None).unwrap();
        let doc = builder.document().unwrap();
        assert_eq!(doc.int_subset().name(), Some("doc"));
        assert_eq!(doc.int_subset().system_id(), Some("doc.dtd"));
        assert_eq!(doc.ext_subset().and_then(|dtd| dtd.system_id()), Some("doc.dtd"));
    }
}

//! Provide the SAX2 event contract.
//!
//! This module is based on `libxml/parser.h` (`xmlSAXHandler`) in `libxml2-v2.11.8`.
//! Please refer to original libxml2 documents also.
//!
//! libxml2 keeps one optional function pointer per event.
//! Here every event is a method of [`SaxHandler`] with a default implementation,
//! so a handler only overrides the events it is interested in.
//! Any `Err` returned by a method is fatal for the current document.

// Copyright of the original code is the following.
// --------
// Summary: the core parser module
// Description: Interfaces, constants and types related to the XML parser
//
// Copy: See Copyright for the status of this software.
//
// Author: Daniel Veillard

use std::{borrow::Cow, rc::Rc};

use crate::{
    error::XmlError,
    tree::{
        XmlAttributeDefault, XmlAttributeType, XmlElementTypeVal, XmlEntity,
        xml_get_predefined_entity,
    },
};

use super::XmlParserCtxt;

/// A SAX Locator.
#[doc(alias = "xmlSAXLocator")]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlSAXLocator {
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub line: usize,
    pub column: usize,
}

/// A namespace declaration reported with an element start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaxNamespace<'a> {
    /// `None` for the default namespace.
    pub prefix: Option<&'a str>,
    pub uri: &'a str,
}

/// An attribute reported with an element start.
///
/// The value is already normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaxAttribute<'a> {
    pub local_name: &'a str,
    pub prefix: Option<&'a str>,
    pub uri: Option<&'a str>,
    pub value: &'a str,
    /// The attribute was defaulted from the DTD.
    pub defaulted: bool,
}

impl SaxAttribute<'_> {
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}:{}", self.local_name)),
            None => Cow::Borrowed(self.local_name),
        }
    }
}

/// The SAX2 notifications.
///
/// Parameter entities are reported through the entity declaration events
/// with a leading `%` on their name.
#[doc(alias = "xmlSAXHandler")]
#[allow(unused_variables)]
pub trait SaxHandler {
    /// Receive the document locator at startup.
    #[doc(alias = "setDocumentLocatorSAXFunc")]
    fn set_document_locator(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        locator: &XmlSAXLocator,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// Called when the document start being processed.
    #[doc(alias = "startDocumentSAXFunc")]
    fn start_document(&mut self, ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
        Ok(())
    }

    /// Called when the document end has been detected.
    #[doc(alias = "endDocumentSAXFunc")]
    fn end_document(&mut self, ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
        Ok(())
    }

    /// A processing instruction has been parsed.
    #[doc(alias = "processingInstructionSAXFunc")]
    fn processing_instruction(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        target: &str,
        data: Option<&str>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// Called when an opening tag has been processed.
    #[doc(alias = "startElementNsSAX2Func")]
    fn start_element_ns(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        localname: &str,
        prefix: Option<&str>,
        uri: Option<&str>,
        namespaces: &[SaxNamespace],
        attributes: &[SaxAttribute],
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// Called when the end of an element has been detected.
    #[doc(alias = "endElementNsSAX2Func")]
    fn end_element_ns(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        localname: &str,
        prefix: Option<&str>,
        uri: Option<&str>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// Receiving some chars from the parser.
    #[doc(alias = "charactersSAXFunc")]
    fn characters(&mut self, ctxt: &mut XmlParserCtxt, ch: &[u8]) -> Result<(), XmlError> {
        Ok(())
    }

    /// Receiving some ignorable whitespaces from the parser.
    #[doc(alias = "ignorableWhitespaceSAXFunc")]
    fn ignorable_whitespace(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        ch: &[u8],
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// A comment has been parsed.
    #[doc(alias = "commentSAXFunc")]
    fn comment(&mut self, ctxt: &mut XmlParserCtxt, value: &[u8]) -> Result<(), XmlError> {
        Ok(())
    }

    fn start_cdata(&mut self, ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
        Ok(())
    }

    fn end_cdata(&mut self, ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
        Ok(())
    }

    fn start_dtd(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        external_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    fn end_dtd(&mut self, ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
        Ok(())
    }

    /// Callback on internal subset declaration.
    #[doc(alias = "internalSubsetSAXFunc")]
    fn internal_subset(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: Option<&str>,
        external_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// Callback on external subset declaration.
    #[doc(alias = "externalSubsetSAXFunc")]
    fn external_subset(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: Option<&str>,
        external_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    fn start_entity(&mut self, ctxt: &mut XmlParserCtxt, name: &str) -> Result<(), XmlError> {
        Ok(())
    }

    fn end_entity(&mut self, ctxt: &mut XmlParserCtxt, name: &str) -> Result<(), XmlError> {
        Ok(())
    }

    /// An attribute definition has been parsed.
    #[doc(alias = "attributeDeclSAXFunc")]
    #[allow(clippy::too_many_arguments)]
    fn attribute_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        elem: &str,
        fullname: &str,
        typ: XmlAttributeType,
        def: XmlAttributeDefault,
        default_value: Option<&str>,
        tree: &[String],
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// An element definition has been parsed.
    #[doc(alias = "elementDeclSAXFunc")]
    fn element_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        typ: XmlElementTypeVal,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// An internal entity definition has been parsed.
    ///
    /// `value` is the replacement text with character references already expanded.
    fn internal_entity_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        value: &str,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// An external entity definition has been parsed.
    fn external_entity_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// An unparsed entity declaration has been parsed.
    #[doc(alias = "unparsedEntityDeclSAXFunc")]
    fn unparsed_entity_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        notation_name: &str,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// What to do when a notation declaration has been parsed.
    #[doc(alias = "notationDeclSAXFunc")]
    fn notation_decl(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// Get an entity by name.
    ///
    /// The default only knows the predefined entities.
    #[doc(alias = "getEntitySAXFunc")]
    fn get_entity(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
    ) -> Result<Option<Rc<XmlEntity>>, XmlError> {
        Ok(xml_get_predefined_entity(name))
    }

    /// Get a parameter entity by name.
    #[doc(alias = "getParameterEntitySAXFunc")]
    fn get_parameter_entity(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
    ) -> Result<Rc<XmlEntity>, XmlError> {
        Err(XmlError::EntityNotFound(name.to_owned()))
    }

    /// Callback: the application may supply the external entity here.
    #[doc(alias = "resolveEntitySAXFunc")]
    fn resolve_entity(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: &str,
        public_id: Option<&str>,
        base_uri: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<Rc<XmlEntity>, XmlError> {
        Err(XmlError::EntityNotFound(name.to_owned()))
    }

    /// Callback on the request for the external subset.
    #[doc(alias = "externalSubsetSAXFunc")]
    fn get_external_subset(
        &mut self,
        ctxt: &mut XmlParserCtxt,
        name: Option<&str>,
        base_uri: Option<&str>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    /// Called when an entity reference is detected and kept as a reference.
    #[doc(alias = "referenceSAXFunc")]
    fn reference(&mut self, ctxt: &mut XmlParserCtxt, name: &str) -> Result<(), XmlError> {
        Ok(())
    }

    /// An entity reference could not be resolved and was skipped.
    fn skipped_entity(&mut self, ctxt: &mut XmlParserCtxt, name: &str) -> Result<(), XmlError> {
        Ok(())
    }
}

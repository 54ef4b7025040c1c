//! Provide methods and data structures for handling XML entities.
//!
//! This module is based on `libxml/entities.h`, `entities.c`, and so on in `libxml2-v2.11.8`.
//! Please refer to original libxml2 documents also.

// Copyright of the original code is the following.
// --------
// Summary: interface for the XML entities handling
// Description: this module provides some of the entity API needed
//              for the parser and applications.
//
// Copy: See Copyright for the status of this software.
//
// Author: Daniel Veillard
// --------
// entities.c : implementation for the XML entities handling
//
// See Copyright for the status of this software.
//
// daniel@veillard.com

use std::{any::type_name, cell::Cell, rc::Rc};

use log::{debug, warn};

use crate::error::XmlError;

use super::{NodeKind, XmlDoc, XmlStandalone, XmlSubset};

/// The different valid entity types.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlEntityType {
    #[default]
    XmlInternalGeneralEntity = 1,
    XmlExternalGeneralParsedEntity = 2,
    XmlExternalGeneralUnparsedEntity = 3,
    XmlInternalParameterEntity = 4,
    XmlExternalParameterEntity = 5,
    XmlInternalPredefinedEntity = 6,
}

impl XmlEntityType {
    pub fn is_parameter(self) -> bool {
        matches!(
            self,
            Self::XmlInternalParameterEntity | Self::XmlExternalParameterEntity
        )
    }
}

impl TryFrom<i32> for XmlEntityType {
    type Error = anyhow::Error;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value == 1 {
            Ok(Self::XmlInternalGeneralEntity)
        } else if value == 2 {
            Ok(Self::XmlExternalGeneralParsedEntity)
        } else if value == 3 {
            Ok(Self::XmlExternalGeneralUnparsedEntity)
        } else if value == 4 {
            Ok(Self::XmlInternalParameterEntity)
        } else if value == 5 {
            Ok(Self::XmlExternalParameterEntity)
        } else if value == 6 {
            Ok(Self::XmlInternalPredefinedEntity)
        } else {
            Err(anyhow::anyhow!(
                "Invalid convert from value '{value}' to {}",
                type_name::<Self>()
            ))
        }
    }
}

/// An entity declaration.
#[doc(alias = "xmlEntity")]
#[derive(Debug)]
pub struct XmlEntity {
    pub(crate) name: String,
    pub(crate) etype: XmlEntityType,
    /// Content without ref substitution.
    pub(crate) orig: Option<String>,
    /// Content or ndata if unparsed.
    pub(crate) content: Option<String>,
    pub(crate) external_id: Option<String>,
    pub(crate) system_id: Option<String>,
    /// The full URI as computed.
    pub(crate) uri: Option<String>,
    /// Does the entity own the children.
    pub(crate) owner: bool,
    /// `0` if not scanned yet, otherwise `2 | (content contains '<')`.
    pub(crate) checked: Cell<i32>,
}

impl XmlEntity {
    #[doc(alias = "xmlCreateEntity")]
    pub(crate) fn new(
        name: &str,
        etype: XmlEntityType,
        external_id: Option<&str>,
        system_id: Option<&str>,
        content: Option<&str>,
    ) -> Self {
        let external = matches!(
            etype,
            XmlEntityType::XmlExternalGeneralParsedEntity
                | XmlEntityType::XmlExternalGeneralUnparsedEntity
                | XmlEntityType::XmlExternalParameterEntity
        );
        Self {
            name: name.to_owned(),
            etype,
            orig: content.map(|c| c.to_owned()),
            content: content.map(|c| c.to_owned()),
            external_id: external_id.map(|e| e.to_owned()),
            system_id: system_id.map(|s| s.to_owned()),
            uri: system_id.filter(|_| external).map(|s| s.to_owned()),
            owner: false,
            checked: Cell::new(0),
        }
    }

    fn predefined(name: &str, content: &str, orig: &str) -> Self {
        let mut ent = Self::new(
            name,
            XmlEntityType::XmlInternalPredefinedEntity,
            None,
            None,
            Some(content),
        );
        ent.orig = Some(orig.to_owned());
        ent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn etype(&self) -> XmlEntityType {
        self.etype
    }

    pub fn orig(&self) -> Option<&str> {
        self.orig.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn is_owner(&self) -> bool {
        self.owner
    }

    pub fn checked(&self) -> i32 {
        self.checked.get()
    }

    /// Check whether the replacement text contains markup.
    ///
    /// The content is scanned only once; the answer is kept in `checked`.
    pub fn content_has_lt(&self) -> bool {
        if self.checked.get() == 0 {
            let has_lt = self.content().is_some_and(|c| c.contains('<'));
            self.checked.set(2 | has_lt as i32);
        }
        self.checked.get() & 1 != 0
    }
}

/// The payload of an entity reference node.
#[derive(Debug, Clone)]
pub struct XmlEntityRef {
    pub(crate) name: String,
    pub(crate) entity: Option<Rc<XmlEntity>>,
}

impl XmlEntityRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaration the reference was bound to when it was created.
    pub fn entity(&self) -> Option<&Rc<XmlEntity>> {
        self.entity.as_ref()
    }
}

thread_local! {
    static XML_ENT_LT: Rc<XmlEntity> = Rc::new(XmlEntity::predefined("lt", "<", "&lt;"));
    static XML_ENT_GT: Rc<XmlEntity> = Rc::new(XmlEntity::predefined("gt", ">", "&gt;"));
    static XML_ENT_AMP: Rc<XmlEntity> = Rc::new(XmlEntity::predefined("amp", "&", "&amp;"));
    static XML_ENT_QUOT: Rc<XmlEntity> = Rc::new(XmlEntity::predefined("quot", "\"", "&quot;"));
    static XML_ENT_APOS: Rc<XmlEntity> = Rc::new(XmlEntity::predefined("apos", "'", "&apos;"));
}

/// Check whether this name is an predefined entity.
///
/// Returns the entity if found, otherwise `None`.
#[doc(alias = "xmlGetPredefinedEntity")]
pub fn xml_get_predefined_entity(name: &str) -> Option<Rc<XmlEntity>> {
    match name {
        "lt" => Some(XML_ENT_LT.with(Rc::clone)),
        "gt" => Some(XML_ENT_GT.with(Rc::clone)),
        "amp" => Some(XML_ENT_AMP.with(Rc::clone)),
        "apos" => Some(XML_ENT_APOS.with(Rc::clone)),
        "quot" => Some(XML_ENT_QUOT.with(Rc::clone)),
        _ => None,
    }
}

/// Check whether `content` is an acceptable redeclaration of the predefined entity `predef`.
///
/// Only the character itself (for `>`, `'` and `"`) or a character reference to it is allowed.
fn is_valid_predefined_redeclaration(predef: &XmlEntity, content: &str) -> bool {
    let Some(c) = predef.content().and_then(|c| c.chars().next()) else {
        return false;
    };
    if content.len() == 1 && content.starts_with(c) && matches!(c, '>' | '\'' | '"') {
        return true;
    }
    let Some(value) = content
        .strip_prefix("&#")
        .and_then(|rest| rest.strip_suffix(';'))
    else {
        return false;
    };
    let code = match value.strip_prefix('x') {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()
        }
        None if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
            value.parse::<u32>().ok()
        }
        _ => None,
    };
    code == Some(c as u32)
}

impl XmlDoc {
    /// Register a new entity in one of the subsets.
    ///
    /// Returns `None` if the declaration was ignored because the name is already taken,
    /// or because it is an invalid redeclaration of a predefined entity.
    #[doc(alias = "xmlAddEntity")]
    fn add_entity(
        &mut self,
        subset: XmlSubset,
        name: &str,
        etype: XmlEntityType,
        external_id: Option<&str>,
        system_id: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Rc<XmlEntity>>, XmlError> {
        if etype == XmlEntityType::XmlInternalPredefinedEntity {
            return Err(XmlError::InvalidOperation(
                "predefined entities cannot be declared",
            ));
        }
        if subset == XmlSubset::Internal && !etype.is_parameter() {
            if let Some(predef) = xml_get_predefined_entity(name) {
                let valid = etype == XmlEntityType::XmlInternalGeneralEntity
                    && content.is_some_and(|c| is_valid_predefined_redeclaration(&predef, c));
                if !valid {
                    warn!("xmlAddEntity: invalid redeclaration of predefined entity '{name}'");
                    return Ok(None);
                }
            }
        }
        let Some(dtd) = self.subset_mut(subset) else {
            return Err(XmlError::InvalidOperation("document without external subset"));
        };
        let table = if etype.is_parameter() {
            &mut dtd.pentities
        } else {
            &mut dtd.entities
        };
        if table.contains_key(name) {
            return Ok(None);
        }
        let entity = Rc::new(XmlEntity::new(
            name,
            etype,
            external_id,
            system_id,
            content,
        ));
        table.insert(name.to_owned(), entity.clone());
        let dtd_node = dtd.node;
        let node = self.alloc(NodeKind::Entity(entity.clone()));
        self.link_last(dtd_node, node);
        debug!("xmlAddEntity: registered '{name}' as {etype:?}");
        Ok(Some(entity))
    }

    /// Register a new entity for this document.
    ///
    /// Returns `None` if an entity with this name is already declared (the first declaration wins).
    #[doc(alias = "xmlAddDocEntity")]
    pub fn add_doc_entity(
        &mut self,
        name: &str,
        etype: XmlEntityType,
        external_id: Option<&str>,
        system_id: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Rc<XmlEntity>>, XmlError> {
        self.add_entity(
            XmlSubset::Internal,
            name,
            etype,
            external_id,
            system_id,
            content,
        )
    }

    /// Register a new entity for this document's external subset.
    ///
    /// Fails if the document has no external subset.
    #[doc(alias = "xmlAddDtdEntity")]
    pub fn add_dtd_entity(
        &mut self,
        name: &str,
        etype: XmlEntityType,
        external_id: Option<&str>,
        system_id: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Rc<XmlEntity>>, XmlError> {
        self.add_entity(
            XmlSubset::External,
            name,
            etype,
            external_id,
            system_id,
            content,
        )
    }

    /// Do an entity lookup in the document entity hash table.
    ///
    /// The internal subset is searched first, then the external subset unless the document
    /// is standalone, and finally the predefined entities.
    #[doc(alias = "xmlGetDocEntity")]
    pub fn get_doc_entity(&self, name: &str) -> Option<Rc<XmlEntity>> {
        if let Some(ent) = self.int_subset.get_entity(name) {
            return Some(ent);
        }
        if self.standalone != XmlStandalone::ExplicitYes {
            if let Some(ent) = self.ext_subset.as_ref().and_then(|dtd| dtd.get_entity(name)) {
                return Some(ent);
            }
        }
        xml_get_predefined_entity(name)
    }

    /// Do an entity lookup in the external subset only.
    #[doc(alias = "xmlGetDtdEntity")]
    pub fn get_dtd_entity(&self, name: &str) -> Option<Rc<XmlEntity>> {
        self.ext_subset.as_ref()?.get_entity(name)
    }

    /// Do a parameter entity lookup in the internal subset, then in the external subset.
    #[doc(alias = "xmlGetParameterEntity")]
    pub fn get_parameter_entity(&self, name: &str) -> Option<Rc<XmlEntity>> {
        self.int_subset
            .get_parameter_entity(name)
            .or_else(|| self.ext_subset.as_ref()?.get_parameter_entity(name))
    }
}

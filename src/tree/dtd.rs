use std::{collections::HashMap, rc::Rc};

use super::{NodeId, XmlAttributeDefault, XmlAttributeType, XmlEntity};

/// The different possible types for an element declaration.
#[doc(alias = "xmlElementTypeVal")]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlElementTypeVal {
    #[default]
    XmlElementTypeUndefined = 0,
    XmlElementTypeEmpty = 1,
    XmlElementTypeAny,
    XmlElementTypeMixed,
    XmlElementTypeElement,
}

/// An attribute declaration of a DTD.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttributeDecl {
    pub elem: String,
    pub name: String,
    pub prefix: Option<String>,
    pub atype: XmlAttributeType,
    pub def: XmlAttributeDefault,
    pub default_value: Option<String>,
    /// The enumerated values, if any.
    pub tree: Vec<String>,
}

/// An element declaration of a DTD.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElementDecl {
    pub name: String,
    pub prefix: Option<String>,
    pub etype: XmlElementTypeVal,
}

/// A DTD subset.
///
/// The tables are keyed by name. Keys are case-sensitive and the first declaration wins.
#[doc(alias = "xmlDtd")]
#[derive(Debug)]
pub struct XmlDtd {
    pub(crate) node: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) external_id: Option<String>,
    pub(crate) system_id: Option<String>,
    pub(crate) attributes: HashMap<(String, String), XmlAttributeDecl>,
    pub(crate) elements: HashMap<String, XmlElementDecl>,
    pub(crate) entities: HashMap<String, Rc<XmlEntity>>,
    pub(crate) pentities: HashMap<String, Rc<XmlEntity>>,
    /// Processing instructions registered against this subset.
    pub(crate) pis: Vec<NodeId>,
}

impl XmlDtd {
    pub(crate) fn new(node: NodeId) -> Self {
        Self {
            node,
            name: None,
            external_id: None,
            system_id: None,
            attributes: HashMap::new(),
            elements: HashMap::new(),
            entities: HashMap::new(),
            pentities: HashMap::new(),
            pis: vec![],
        }
    }

    /// The handle of the DTD node. Entity declarations are its children.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub(crate) fn set_ids(
        &mut self,
        name: Option<&str>,
        external_id: Option<&str>,
        system_id: Option<&str>,
    ) {
        self.name = name.map(|n| n.to_owned());
        self.external_id = external_id.map(|e| e.to_owned());
        self.system_id = system_id.map(|s| s.to_owned());
    }

    /// Look up a general entity declared in this subset.
    pub fn get_entity(&self, name: &str) -> Option<Rc<XmlEntity>> {
        self.entities.get(name).cloned()
    }

    /// Look up a parameter entity declared in this subset.
    pub fn get_parameter_entity(&self, name: &str) -> Option<Rc<XmlEntity>> {
        self.pentities.get(name).cloned()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Rc<XmlEntity>> {
        self.entities.values()
    }

    pub fn processing_instructions(&self) -> &[NodeId] {
        &self.pis
    }

    /// Register an element declaration. Returns `false` if the name is already declared.
    #[doc(alias = "xmlAddElementDecl")]
    pub fn add_element_decl(&mut self, decl: XmlElementDecl) -> bool {
        if self.elements.contains_key(&decl.name) {
            return false;
        }
        self.elements.insert(decl.name.clone(), decl);
        true
    }

    pub fn get_element_decl(&self, name: &str) -> Option<&XmlElementDecl> {
        self.elements.get(name)
    }

    /// Register an attribute declaration. Returns `false` if it is already declared for the element.
    #[doc(alias = "xmlAddAttributeDecl")]
    pub fn add_attribute_decl(&mut self, decl: XmlAttributeDecl) -> bool {
        let key = (decl.elem.clone(), decl.name.clone());
        if self.attributes.contains_key(&key) {
            return false;
        }
        self.attributes.insert(key, decl);
        true
    }

    #[doc(alias = "xmlGetDtdAttrDesc")]
    pub fn get_attribute_decl(&self, elem: &str, name: &str) -> Option<&XmlAttributeDecl> {
        self.attributes.get(&(elem.to_owned(), name.to_owned()))
    }
}

use crate::tree::{XmlDoc, XmlStandalone};

/// This is the set of XML parser options that can be passed down
/// to [`XmlParserCtxt::use_options`].
#[doc(alias = "xmlParserOption")]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlParserOption {
    /// substitute entities
    XmlParseNoent = 1 << 1,
    /// remove blank nodes
    XmlParseNoblanks = 1 << 8,
}

/// Which DTD subset the parser is currently reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlInSubset {
    #[default]
    NotInSubset = 0,
    InternalSubset = 1,
    ExternalSubset = 2,
}

/// The parser context.
///
/// It is threaded through every SAX2 notification of one document.
#[doc(alias = "xmlParserCtxt")]
#[derive(Debug)]
pub struct XmlParserCtxt {
    // the document being built
    pub(crate) my_doc: Option<XmlDoc>,
    // is the document well formed
    pub(crate) well_formed: bool,
    // shall we replace entities ?
    pub(crate) replace_entities: bool,
    // the XML version string
    pub(crate) version: Option<String>,
    // the declared encoding, if any
    pub(crate) encoding: Option<String>,
    // standalone document
    pub(crate) standalone: XmlStandalone,
    // Parsing DTD
    pub(crate) in_subset: XmlInSubset,
    // ugly but ...
    pub(crate) keep_blanks: bool,
    // Extra options
    pub(crate) options: i32,
}

impl XmlParserCtxt {
    #[doc(alias = "xmlNewParserCtxt")]
    pub fn new() -> Self {
        Self {
            my_doc: None,
            well_formed: true,
            replace_entities: false,
            version: None,
            encoding: None,
            standalone: XmlStandalone::NoXmlDecl,
            in_subset: XmlInSubset::NotInSubset,
            keep_blanks: true,
            options: 0,
        }
    }

    /// Applies the options to the parser context.
    ///
    /// Returns the options that were not recognized.
    #[doc(alias = "xmlCtxtUseOptions")]
    pub fn use_options(&mut self, mut options: i32) -> i32 {
        if options & XmlParserOption::XmlParseNoent as i32 != 0 {
            self.replace_entities = true;
            options -= XmlParserOption::XmlParseNoent as i32;
            self.options |= XmlParserOption::XmlParseNoent as i32;
        } else {
            self.replace_entities = false;
            self.options &= !(XmlParserOption::XmlParseNoent as i32);
        }
        if options & XmlParserOption::XmlParseNoblanks as i32 != 0 {
            self.keep_blanks = false;
            options -= XmlParserOption::XmlParseNoblanks as i32;
            self.options |= XmlParserOption::XmlParseNoblanks as i32;
        } else {
            self.keep_blanks = true;
            self.options &= !(XmlParserOption::XmlParseNoblanks as i32);
        }
        options
    }

    pub fn options(&self) -> i32 {
        self.options
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn set_version(&mut self, version: Option<&str>) {
        self.version = version.map(|v| v.to_owned());
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

    pub fn in_subset(&self) -> XmlInSubset {
        self.in_subset
    }

    pub fn set_in_subset(&mut self, in_subset: XmlInSubset) {
        self.in_subset = in_subset;
    }

    pub fn keep_blanks(&self) -> bool {
        self.keep_blanks
    }

    pub fn replace_entities(&self) -> bool {
        self.replace_entities
    }

    pub fn is_well_formed(&self) -> bool {
        self.well_formed
    }

    /// The document handed over by the tree builder at the end of the parse.
    pub fn document(&self) -> Option<&XmlDoc> {
        self.my_doc.as_ref()
    }

    pub fn take_document(&mut self) -> Option<XmlDoc> {
        self.my_doc.take()
    }
}

impl Default for XmlParserCtxt {
    fn default() -> Self {
        Self::new()
    }
}

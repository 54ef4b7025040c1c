//! Drive SAX2 notifications from the `xmlparser` token stream.
//!
//! `xmlparser` only splits the input into tokens. Namespace resolution,
//! tag matching, reference expansion and attribute value normalization
//! are done here, the way `parser.c` of libxml2 does them for its own scanner.

use std::borrow::Cow;

use log::{debug, trace};
use xmlparser::{ElementEnd, EntityDefinition, ExternalId, Token, Tokenizer};

use crate::{
    error::XmlError,
    tree::{XML_XML_NAMESPACE, XmlEntityType, XmlStandalone},
};

use super::{
    XmlInSubset, XmlParserCtxt,
    sax::{SaxAttribute, SaxHandler, SaxNamespace, XmlSAXLocator},
};

/// Entity substitution deeper than this is treated as a loop.
const MAX_ENTITY_DEPTH: usize = 40;

/// Roughly the maximum allowed amplification factor of the input after entity expansion.
const XML_PARSER_NON_LINEAR: u64 = 5;

/// A certain amount of expansion is always allowed.
const XML_PARSER_ALLOWED_EXPANSION: u64 = 1_000_000;

/// Fixed cost for each entity expansion, so that empty or very short entities
/// still count against the limit.
const XML_ENT_FIXED_COST: u64 = 20;

/// Parse `input` and report it to `handler`.
pub(crate) fn parse<H: SaxHandler + ?Sized>(
    ctxt: &mut XmlParserCtxt,
    handler: &mut H,
    input: &str,
) -> Result<(), XmlError> {
    let mut reader = Reader::new(ctxt, handler, input.len() as u64);
    let locator = XmlSAXLocator {
        line: 1,
        column: 1,
        ..Default::default()
    };
    reader.handler.set_document_locator(reader.ctxt, &locator)?;
    for token in Tokenizer::from(input) {
        reader.token(token?)?;
    }
    reader.finish()
}

struct PendingElement {
    prefix: String,
    local: String,
    // (prefix, local name, normalized value)
    attrs: Vec<(String, String, String)>,
}

struct OpenElement {
    prefix: String,
    local: String,
    uri: Option<String>,
    // number of namespace bindings in scope before this element
    scope: usize,
}

struct DoctypeInfo {
    name: String,
    external_id: Option<String>,
    system_id: Option<String>,
}

enum Piece<'a> {
    Text(&'a str),
    Char(char),
    Entity(&'a str),
}

struct Reader<'a, H: ?Sized> {
    ctxt: &'a mut XmlParserCtxt,
    handler: &'a mut H,
    started: bool,
    seen_root: bool,
    doctype: Option<DoctypeInfo>,
    has_external_subset: bool,
    bindings: Vec<(Option<String>, String)>,
    stack: Vec<OpenElement>,
    pending: Option<PendingElement>,
    input_len: u64,
    // bytes produced by entity expansion so far
    expanded: u64,
}

impl<'a, H: SaxHandler + ?Sized> Reader<'a, H> {
    fn new(ctxt: &'a mut XmlParserCtxt, handler: &'a mut H, input_len: u64) -> Self {
        Self {
            ctxt,
            handler,
            started: false,
            seen_root: false,
            doctype: None,
            has_external_subset: false,
            bindings: vec![],
            stack: vec![],
            pending: None,
            input_len,
            expanded: 0,
        }
    }

    /// Account for the expansion of entity `name` into `len` bytes.
    ///
    /// Fails once the expanded size passes the allowed amount and grows
    /// out of proportion to the input.
    #[doc(alias = "xmlParserEntityCheck")]
    fn entity_check(&mut self, name: &str, len: usize) -> Result<(), XmlError> {
        self.expanded = self
            .expanded
            .saturating_add(len as u64)
            .saturating_add(XML_ENT_FIXED_COST);
        if self.expanded > XML_PARSER_ALLOWED_EXPANSION
            && (self.expanded == u64::MAX
                || self.expanded / XML_PARSER_NON_LINEAR > self.input_len)
        {
            debug!("Maximum entity amplification factor exceeded at '{name}'");
            return Err(XmlError::EntityAmplification(name.to_owned()));
        }
        Ok(())
    }

    fn start_document(&mut self) -> Result<(), XmlError> {
        self.started = true;
        self.handler.start_document(self.ctxt)
    }

    fn token(&mut self, token: Token<'_>) -> Result<(), XmlError> {
        if let Token::Declaration {
            version,
            encoding,
            standalone,
            ..
        } = token
        {
            self.ctxt.set_version(Some(version.as_str()));
            self.ctxt.set_encoding(encoding.map(|e| e.as_str()));
            self.ctxt.set_standalone(match standalone {
                Some(true) => XmlStandalone::ExplicitYes,
                Some(false) => XmlStandalone::ExplicitNo,
                None => XmlStandalone::ImplicitNo,
            });
            return self.start_document();
        }
        if !self.started {
            self.start_document()?;
        }

        match token {
            Token::Declaration { .. } => Ok(()),
            Token::DtdStart {
                name, external_id, ..
            } => self.start_dtd(name.as_str(), external_id),
            Token::EmptyDtd {
                name, external_id, ..
            } => {
                self.start_dtd(name.as_str(), external_id)?;
                self.end_dtd()
            }
            Token::DtdEnd { .. } => self.end_dtd(),
            Token::EntityDeclaration {
                name,
                definition,
                span,
            } => self.entity_decl(name.as_str(), definition, span.as_str()),
            Token::ProcessingInstruction {
                target, content, ..
            } => self.handler.processing_instruction(
                self.ctxt,
                target.as_str(),
                content.map(|c| c.as_str()),
            ),
            Token::Comment { text, .. } => {
                if self.ctxt.in_subset() != XmlInSubset::NotInSubset {
                    return Ok(());
                }
                self.handler.comment(self.ctxt, text.as_str().as_bytes())
            }
            Token::ElementStart { prefix, local, .. } => {
                self.pending = Some(PendingElement {
                    prefix: prefix.as_str().to_owned(),
                    local: local.as_str().to_owned(),
                    attrs: vec![],
                });
                Ok(())
            }
            Token::Attribute {
                prefix,
                local,
                value,
                ..
            } => {
                let mut normalized = String::new();
                self.attribute_value(value.as_str(), 0, &mut normalized)?;
                let Some(pending) = self.pending.as_mut() else {
                    return Err(XmlError::Structural("attribute outside of a start tag"));
                };
                pending.attrs.push((
                    prefix.as_str().to_owned(),
                    local.as_str().to_owned(),
                    normalized,
                ));
                Ok(())
            }
            Token::ElementEnd { end, .. } => match end {
                ElementEnd::Open => self.open_element(false),
                ElementEnd::Empty => self.open_element(true),
                ElementEnd::Close(prefix, local) => {
                    self.close_element(prefix.as_str(), local.as_str())
                }
            },
            Token::Text { text } => {
                if self.stack.is_empty() && text.as_str().bytes().all(is_blank) {
                    return Ok(());
                }
                self.text(text.as_str(), 0)
            }
            Token::Cdata { text, .. } => {
                self.handler.start_cdata(self.ctxt)?;
                let text = normalize_eol(text.as_str());
                self.handler.characters(self.ctxt, text.as_bytes())?;
                self.handler.end_cdata(self.ctxt)
            }
        }
    }

    fn finish(mut self) -> Result<(), XmlError> {
        if !self.started {
            self.start_document()?;
        }
        if let Some(open) = self.stack.last() {
            debug!("premature end of data in tag {}", qname(&open.prefix, &open.local));
            return Err(XmlError::Structural("premature end of data in tag"));
        }
        if !self.seen_root {
            return Err(XmlError::Structural("document has no root element"));
        }
        self.handler.end_document(self.ctxt)
    }

    fn start_dtd(&mut self, name: &str, external_id: Option<ExternalId<'_>>) -> Result<(), XmlError> {
        let (eid, sid) = split_external_id(external_id);
        trace!("DOCTYPE {name} {eid:?} {sid:?}");
        self.ctxt.set_in_subset(XmlInSubset::InternalSubset);
        self.handler.start_dtd(self.ctxt, name, eid, sid)?;
        self.handler.internal_subset(self.ctxt, Some(name), eid, sid)?;
        self.doctype = Some(DoctypeInfo {
            name: name.to_owned(),
            external_id: eid.map(|e| e.to_owned()),
            system_id: sid.map(|s| s.to_owned()),
        });
        Ok(())
    }

    fn end_dtd(&mut self) -> Result<(), XmlError> {
        self.ctxt.set_in_subset(XmlInSubset::NotInSubset);
        self.handler.end_dtd(self.ctxt)?;
        let Some(doctype) = self.doctype.as_ref() else {
            return Ok(());
        };
        if doctype.external_id.is_none() && doctype.system_id.is_none() {
            return Ok(());
        }
        self.has_external_subset = true;
        self.handler.external_subset(
            self.ctxt,
            Some(&doctype.name),
            doctype.external_id.as_deref(),
            doctype.system_id.as_deref(),
        )
    }

    fn entity_decl(
        &mut self,
        name: &str,
        definition: EntityDefinition<'_>,
        span: &str,
    ) -> Result<(), XmlError> {
        let parameter = span
            .strip_prefix("<!ENTITY")
            .is_some_and(|rest| rest.trim_start().starts_with('%'));
        let name = if parameter {
            Cow::Owned(format!("%{name}"))
        } else {
            Cow::Borrowed(name)
        };
        match definition {
            EntityDefinition::EntityValue(value) => {
                let value = expand_char_refs(value.as_str())?;
                self.handler.internal_entity_decl(self.ctxt, &name, &value)
            }
            EntityDefinition::ExternalId(external_id) => {
                let (public_id, system_id) = split_external_id(Some(external_id));
                // `xmlparser` accepts the NDATA part without reporting it
                let tail = span.rsplit(['"', '\'']).next().unwrap_or_default();
                let mut words = tail
                    .split(|c: char| c.is_ascii_whitespace() || c == '>')
                    .filter(|w| !w.is_empty());
                match (words.next(), words.next()) {
                    (Some("NDATA"), Some(notation)) if !parameter => self
                        .handler
                        .unparsed_entity_decl(self.ctxt, &name, public_id, system_id, notation),
                    _ => self
                        .handler
                        .external_entity_decl(self.ctxt, &name, public_id, system_id),
                }
            }
        }
    }

    /// Resolve a namespace prefix against the declarations in scope.
    ///
    /// An empty prefix selects the default namespace, and `xmlns=""` undeclares it.
    fn lookup(&self, prefix: &str) -> Result<Option<String>, XmlError> {
        if prefix == "xml" {
            return Ok(Some(XML_XML_NAMESPACE.to_owned()));
        }
        let key = (!prefix.is_empty()).then_some(prefix);
        match self.bindings.iter().rev().find(|(p, _)| p.as_deref() == key) {
            Some((_, uri)) => Ok((!uri.is_empty()).then(|| uri.clone())),
            None if key.is_none() => Ok(None),
            None => Err(XmlError::UnboundPrefix(prefix.to_owned())),
        }
    }

    fn open_element(&mut self, empty: bool) -> Result<(), XmlError> {
        let Some(pending) = self.pending.take() else {
            return Err(XmlError::Structural("tag end without a start tag"));
        };
        if self.stack.is_empty() && self.seen_root {
            return Err(XmlError::Structural("extra content at the end of the document"));
        }
        self.seen_root = true;

        let scope = self.bindings.len();
        let mut namespaces = vec![];
        let mut attributes = vec![];
        for (prefix, local, value) in pending.attrs {
            if prefix.is_empty() && local == "xmlns" {
                namespaces.push((None, value));
            } else if prefix == "xmlns" {
                if local != "xml" {
                    namespaces.push((Some(local), value));
                }
            } else {
                attributes.push((prefix, local, value));
            }
        }
        self.bindings.extend(namespaces.iter().cloned());

        let uri = self.lookup(&pending.prefix)?;
        let mut resolved = Vec::with_capacity(attributes.len());
        for (prefix, local, value) in &attributes {
            let uri = if prefix.is_empty() {
                None
            } else {
                self.lookup(prefix)?
            };
            resolved.push((prefix, local, uri, value));
        }

        let namespaces = namespaces
            .iter()
            .map(|(prefix, uri)| SaxNamespace {
                prefix: prefix.as_deref(),
                uri,
            })
            .collect::<Vec<_>>();
        let attributes = resolved
            .iter()
            .map(|(prefix, local, uri, value)| SaxAttribute {
                local_name: local,
                prefix: (!prefix.is_empty()).then_some(prefix.as_str()),
                uri: uri.as_deref(),
                value,
                defaulted: false,
            })
            .collect::<Vec<_>>();
        self.handler.start_element_ns(
            self.ctxt,
            &pending.local,
            (!pending.prefix.is_empty()).then_some(pending.prefix.as_str()),
            uri.as_deref(),
            &namespaces,
            &attributes,
        )?;

        self.stack.push(OpenElement {
            prefix: pending.prefix,
            local: pending.local,
            uri,
            scope,
        });
        if empty {
            self.end_element()?;
        }
        Ok(())
    }

    fn close_element(&mut self, prefix: &str, local: &str) -> Result<(), XmlError> {
        let Some(open) = self.stack.last() else {
            return Err(XmlError::Structural("closing tag without an open element"));
        };
        if open.prefix != prefix || open.local != local {
            return Err(XmlError::TagMismatch {
                expected: qname(&open.prefix, &open.local).into_owned(),
                found: qname(prefix, local).into_owned(),
            });
        }
        self.end_element()
    }

    fn end_element(&mut self) -> Result<(), XmlError> {
        let Some(open) = self.stack.pop() else {
            return Ok(());
        };
        self.bindings.truncate(open.scope);
        self.handler.end_element_ns(
            self.ctxt,
            &open.local,
            (!open.prefix.is_empty()).then_some(open.prefix.as_str()),
            open.uri.as_deref(),
        )
    }

    fn flush_text(&mut self, buf: &mut String) -> Result<(), XmlError> {
        if !buf.is_empty() {
            self.handler.characters(self.ctxt, buf.as_bytes())?;
            buf.clear();
        }
        Ok(())
    }

    /// Report character data, splitting it at the references it contains.
    fn text(&mut self, raw: &str, depth: usize) -> Result<(), XmlError> {
        let text = normalize_eol(raw);
        if !text.contains('&') && text.bytes().all(is_blank) {
            return self.handler.ignorable_whitespace(self.ctxt, text.as_bytes());
        }
        let mut buf = String::new();
        for piece in split_references(&text)? {
            match piece {
                Piece::Text(s) => buf.push_str(s),
                Piece::Char(c) => buf.push(c),
                Piece::Entity(name) => self.entity_reference(name, depth, &mut buf)?,
            }
        }
        self.flush_text(&mut buf)
    }

    fn entity_reference(
        &mut self,
        name: &str,
        depth: usize,
        buf: &mut String,
    ) -> Result<(), XmlError> {
        let Some(entity) = self.handler.get_entity(self.ctxt, name)? else {
            if self.has_external_subset && self.ctxt.standalone() != XmlStandalone::ExplicitYes {
                debug!("Entity '{name}' not defined, may be in the external subset");
                self.flush_text(buf)?;
                self.handler.skipped_entity(self.ctxt, name)?;
                return self.handler.reference(self.ctxt, name);
            }
            return Err(XmlError::EntityNotFound(name.to_owned()));
        };
        match entity.etype() {
            XmlEntityType::XmlInternalPredefinedEntity => {
                buf.push_str(entity.content().unwrap_or_default());
                Ok(())
            }
            XmlEntityType::XmlInternalGeneralEntity
                if self.ctxt.replace_entities() && !entity.content_has_lt() =>
            {
                if depth >= MAX_ENTITY_DEPTH {
                    return Err(XmlError::EntityLoop(name.to_owned()));
                }
                let content = entity.content().unwrap_or_default();
                self.entity_check(name, content.len())?;
                self.flush_text(buf)?;
                self.handler.start_entity(self.ctxt, name)?;
                self.text(content, depth + 1)?;
                self.handler.end_entity(self.ctxt, name)
            }
            _ => {
                self.flush_text(buf)?;
                self.handler.reference(self.ctxt, name)
            }
        }
    }

    /// Normalize an attribute value into `out`.
    ///
    /// References are expanded and literal tabs, line feeds and carriage returns become spaces.
    fn attribute_value(&mut self, raw: &str, depth: usize, out: &mut String) -> Result<(), XmlError> {
        let raw = normalize_eol(raw);
        for piece in split_references(&raw)? {
            match piece {
                Piece::Text(s) => out.extend(s.chars().map(|c| match c {
                    '\t' | '\n' | '\r' => ' ',
                    c => c,
                })),
                Piece::Char(c) => out.push(c),
                Piece::Entity(name) => {
                    let entity = self
                        .handler
                        .get_entity(self.ctxt, name)?
                        .ok_or_else(|| XmlError::EntityNotFound(name.to_owned()))?;
                    match entity.etype() {
                        XmlEntityType::XmlInternalPredefinedEntity => {
                            out.push_str(entity.content().unwrap_or_default());
                        }
                        XmlEntityType::XmlInternalGeneralEntity if !entity.content_has_lt() => {
                            if depth >= MAX_ENTITY_DEPTH {
                                return Err(XmlError::EntityLoop(name.to_owned()));
                            }
                            let content = entity.content().unwrap_or_default();
                            self.entity_check(name, content.len())?;
                            self.attribute_value(content, depth + 1, out)?;
                        }
                        _ => return Err(XmlError::InvalidReference(format!("&{name};"))),
                    }
                }
            }
        }
        Ok(())
    }
}

fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn qname<'a>(prefix: &str, local: &'a str) -> Cow<'a, str> {
    if prefix.is_empty() {
        Cow::Borrowed(local)
    } else {
        Cow::Owned(format!("{prefix}:{local}"))
    }
}

fn split_external_id(external_id: Option<ExternalId<'_>>) -> (Option<&str>, Option<&str>) {
    match external_id {
        Some(ExternalId::System(system)) => (None, Some(system.as_str())),
        Some(ExternalId::Public(public, system)) => (Some(public.as_str()), Some(system.as_str())),
        None => (None, None),
    }
}

/// Line ends are reported as a single line feed.
fn normalize_eol(s: &str) -> Cow<'_, str> {
    if s.contains('\r') {
        Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(s)
    }
}

fn parse_char_ref(code: &str) -> Option<char> {
    let value = match code.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse().ok()?,
    };
    char::from_u32(value)
}

fn split_references(mut s: &str) -> Result<Vec<Piece<'_>>, XmlError> {
    let mut pieces = vec![];
    while let Some(amp) = s.find('&') {
        if amp > 0 {
            pieces.push(Piece::Text(&s[..amp]));
        }
        let rest = &s[amp + 1..];
        let Some(semi) = rest.find(';') else {
            return Err(XmlError::InvalidReference(s[amp..].to_owned()));
        };
        let name = &rest[..semi];
        let piece = match name.strip_prefix('#') {
            Some(code) => Piece::Char(
                parse_char_ref(code)
                    .ok_or_else(|| XmlError::InvalidReference(format!("&{name};")))?,
            ),
            None if !name.is_empty() => Piece::Entity(name),
            None => return Err(XmlError::InvalidReference("&;".to_owned())),
        };
        pieces.push(piece);
        s = &rest[semi + 1..];
    }
    if !s.is_empty() {
        pieces.push(Piece::Text(s));
    }
    Ok(pieces)
}

/// Expand the character references of an entity value, keeping entity references as written.
fn expand_char_refs(value: &str) -> Result<Cow<'_, str>, XmlError> {
    if !value.contains("&#") {
        return Ok(Cow::Borrowed(value));
    }
    let mut out = String::with_capacity(value.len());
    for piece in split_references(value)? {
        match piece {
            Piece::Text(s) => out.push_str(s),
            Piece::Char(c) => out.push(c),
            Piece::Entity(name) => {
                out.push('&');
                out.push_str(name);
                out.push(';');
            }
        }
    }
    Ok(Cow::Owned(out))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::tree::XmlEntity;

    use super::*;

    /// Records the notifications as text lines.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl SaxHandler for Recorder {
        fn start_document(&mut self, ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
            self.events.push(format!(
                "start_document {:?} {:?} {:?}",
                ctxt.version(),
                ctxt.encoding(),
                ctxt.standalone()
            ));
            Ok(())
        }

        fn end_document(&mut self, _ctxt: &mut XmlParserCtxt) -> Result<(), XmlError> {
            self.events.push("end_document".to_owned());
            Ok(())
        }

        fn start_element_ns(
            &mut self,
            _ctxt: &mut XmlParserCtxt,
            localname: &str,
            prefix: Option<&str>,
            uri: Option<&str>,
            namespaces: &[SaxNamespace],
            attributes: &[SaxAttribute],
        ) -> Result<(), XmlError> {
            let ns = namespaces
                .iter()
                .map(|ns| format!(" xmlns:{}={}", ns.prefix.unwrap_or_default(), ns.uri))
                .collect::<String>();
            let attrs = attributes
                .iter()
                .map(|a| format!(" {}[{}]={:?}", a.qualified_name(), a.uri.unwrap_or_default(), a.value))
                .collect::<String>();
            self.events.push(format!(
                "start {}:{localname}[{}]{ns}{attrs}",
                prefix.unwrap_or_default(),
                uri.unwrap_or_default()
            ));
            Ok(())
        }

        fn end_element_ns(
            &mut self,
            _ctxt: &mut XmlParserCtxt,
            localname: &str,
            prefix: Option<&str>,
            uri: Option<&str>,
        ) -> Result<(), XmlError> {
            self.events.push(format!(
                "end {}:{localname}[{}]",
                prefix.unwrap_or_default(),
                uri.unwrap_or_default()
            ));
            Ok(())
        }

        fn characters(&mut self, _ctxt: &mut XmlParserCtxt, ch: &[u8]) -> Result<(), XmlError> {
            self.events
                .push(format!("characters {:?}", String::from_utf8_lossy(ch)));
            Ok(())
        }

        fn ignorable_whitespace(
            &mut self,
            _ctxt: &mut XmlParserCtxt,
            ch: &[u8],
        ) -> Result<(), XmlError> {
            self.events
                .push(format!("whitespace {:?}", String::from_utf8_lossy(ch)));
            Ok(())
        }

        fn reference(&mut self, _ctxt: &mut XmlParserCtxt, name: &str) -> Result<(), XmlError> {
            self.events.push(format!("reference {name}"));
            Ok(())
        }

        fn skipped_entity(&mut self, _ctxt: &mut XmlParserCtxt, name: &str) -> Result<(), XmlError> {
            self.events.push(format!("skipped {name}"));
            Ok(())
        }

        fn internal_subset(
            &mut self,
            _ctxt: &mut XmlParserCtxt,
            name: Option<&str>,
            external_id: Option<&str>,
            system_id: Option<&str>,
        ) -> Result<(), XmlError> {
            self.events
                .push(format!("internal_subset {name:?} {external_id:?} {system_id:?}"));
            Ok(())
        }

        fn external_subset(
            &mut self,
            _ctxt: &mut XmlParserCtxt,
            name: Option<&str>,
            external_id: Option<&str>,
            system_id: Option<&str>,
        ) -> Result<(), XmlError> {
            self.events
                .push(format!("external_subset {name:?} {external_id:?} {system_id:?}"));
            Ok(())
        }

        fn internal_entity_decl(
            &mut self,
            ctxt: &mut XmlParserCtxt,
            name: &str,
            value: &str,
        ) -> Result<(), XmlError> {
            self.events.push(format!(
                "internal_entity {name} {value:?} {:?}",
                ctxt.in_subset()
            ));
            Ok(())
        }

        fn external_entity_decl(
            &mut self,
            _ctxt: &mut XmlParserCtxt,
            name: &str,
            public_id: Option<&str>,
            system_id: Option<&str>,
        ) -> Result<(), XmlError> {
            self.events
                .push(format!("external_entity {name} {public_id:?} {system_id:?}"));
            Ok(())
        }

        fn unparsed_entity_decl(
            &mut self,
            _ctxt: &mut XmlParserCtxt,
            name: &str,
            _public_id: Option<&str>,
            system_id: Option<&str>,
            notation_name: &str,
        ) -> Result<(), XmlError> {
            self.events
                .push(format!("unparsed_entity {name} {system_id:?} {notation_name}"));
            Ok(())
        }

        fn get_entity(
            &mut self,
            _ctxt: &mut XmlParserCtxt,
            name: &str,
        ) -> Result<Option<Rc<XmlEntity>>, XmlError> {
            Ok(crate::tree::xml_get_predefined_entity(name))
        }
    }

    fn record(input: &str) -> Result<Vec<String>, XmlError> {
        let mut ctxt = XmlParserCtxt::new();
        let mut recorder = Recorder::default();
        parse(&mut ctxt, &mut recorder, input)?;
        Ok(recorder.events)
    }

    #[test]
    fn declaration_test() {
        let events = record("<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>").unwrap();
        assert_eq!(
            events,
            [
                "start_document Some(\"1.0\") Some(\"UTF-8\") ImplicitNo",
                "start :a[]",
                "end :a[]",
                "end_document",
            ]
        );

        let events = record("<?xml version=\"1.0\" standalone=\"yes\"?><a/>").unwrap();
        assert_eq!(events[0], "start_document Some(\"1.0\") None ExplicitYes");

        let events = record("<a/>").unwrap();
        assert_eq!(events[0], "start_document None None NoXmlDecl");
    }

    #[test]
    fn namespace_test() {
        let events = record(concat!(
            "<p:a xmlns:p=\"urn:p\" xmlns=\"urn:d\" p:x=\"1\" y=\"2\">",
            "<b xmlns=\"\"/><c xml:lang=\"en\"/>",
            "</p:a>"
        ))
        .unwrap();
        assert_eq!(
            &events[1..events.len() - 1],
            [
                "start p:a[urn:p] xmlns:p=urn:p xmlns:=urn:d p:x[urn:p]=\"1\" y[]=\"2\"",
                "start :b[] xmlns:=",
                "end :b[]",
                "start :c[urn:d] xml:lang[http://www.w3.org/XML/1998/namespace]=\"en\"",
                "end :c[urn:d]",
                "end p:a[urn:p]",
            ]
        );

        assert!(matches!(
            record("<q:a/>"),
            Err(XmlError::UnboundPrefix(prefix)) if prefix == "q"
        ));
    }

    #[test]
    fn text_test() {
        let events = record("<a>x &lt; y&#65;&#x42;\r\nz<![CDATA[<c>]]> </a>").unwrap();
        assert_eq!(
            &events[2..events.len() - 2],
            [
                "characters \"x < yAB\\nz\"",
                "characters \"<c>\"",
                "whitespace \" \"",
            ]
        );
    }

    #[test]
    fn attribute_normalization_test() {
        let events = record("<a v=\"1\t2\r\n3&#10;&amp;\"/>").unwrap();
        assert_eq!(events[1], "start :a[] v[]=\"1 2 3\\n&\"");
    }

    #[test]
    fn dtd_test() {
        let events = record(concat!(
            "<!DOCTYPE a SYSTEM \"a.dtd\" [\n",
            "<!ENTITY e \"v&#65;&f;\">\n",
            "<!ENTITY % p \"q\">\n",
            "<!ENTITY x SYSTEM \"x.xml\">\n",
            "<!ENTITY img SYSTEM \"i.png\" NDATA png>\n",
            "]>\n",
            "<a>&e;</a>"
        ))
        .unwrap();
        assert_eq!(
            &events[1..7],
            [
                "internal_subset Some(\"a\") None Some(\"a.dtd\")",
                "internal_entity e \"vA&f;\" InternalSubset",
                "internal_entity %p \"q\" InternalSubset",
                "external_entity x None Some(\"x.xml\")",
                "unparsed_entity img Some(\"i.png\") png",
                "external_subset Some(\"a\") None Some(\"a.dtd\")",
            ]
        );
        // unknown here, but the external subset may declare it
        assert_eq!(events[8], "skipped e");
        assert_eq!(events[9], "reference e");
    }

    #[test]
    fn undeclared_entity_test() {
        assert!(matches!(
            record("<a>&nope;</a>"),
            Err(XmlError::EntityNotFound(name)) if name == "nope"
        ));
        assert!(matches!(
            record("<a v=\"&nope;\"/>"),
            Err(XmlError::EntityNotFound(_))
        ));
    }

    #[test]
    fn malformed_test() {
        assert!(matches!(
            record("<a></b>"),
            Err(XmlError::TagMismatch { expected, found }) if expected == "a" && found == "b"
        ));
        assert!(record("<a>").is_err());
        assert!(record("").is_err());
        assert!(record("<a>&#xZZ;</a>").is_err());
    }

    #[test]
    fn split_references_test() {
        assert_eq!(expand_char_refs("a&#x3C;b&c;").unwrap(), "a<b&c;");
        assert_eq!(expand_char_refs("plain").unwrap(), "plain");
        assert!(expand_char_refs("&#xD800;").is_err());
        assert!(split_references("a & b").is_err());
        assert_eq!(normalize_eol("a\r\nb\rc"), "a\nb\nc");
    }
}

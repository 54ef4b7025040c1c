use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
};

/// Errors returned by the tree builder, the tree primitives and the serializer.
///
/// Every SAX2 notification returns one of these on failure,
/// and the event source must treat it as fatal for the current document.
#[derive(Debug)]
pub enum XmlError {
    /// Text or a comment arrived while no element was open.
    Structural(&'static str),
    /// An attribute with the same name (and namespace) is already set on the element.
    DuplicateAttribute { element: String, name: String },
    /// No entity with this name is known.
    EntityNotFound(String),
    /// The document is marked standalone but the entity is only available
    /// from an excluded external subset.
    NotStandalone(String),
    /// No parser context was supplied.
    InvalidParserContext,
    /// No document is attached yet, or a node belongs to another document.
    InvalidDocument,
    /// The operation is not supported for this kind of node.
    InvalidOperation(&'static str),
    /// The requested output encoding is not known.
    UnknownEncoding(String),
    /// The output sink failed.
    Io(io::Error),
    /// The tokenizer rejected the input.
    #[cfg(feature = "libxml_reader")]
    Syntax(xmlparser::Error),
    /// A closing tag does not match the element that is open.
    TagMismatch { expected: String, found: String },
    /// A namespace prefix is used without a declaration in scope.
    UnboundPrefix(String),
    /// A character or entity reference cannot be parsed.
    InvalidReference(String),
    /// Entity substitution nested too deeply.
    EntityLoop(String),
    /// Entity substitution produced too much output for the size of the input.
    EntityAmplification(String),
}

impl Display for XmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(msg) => write!(f, "{msg}"),
            Self::DuplicateAttribute { element, name } => {
                write!(f, "Attribute {name} redefined on element {element}")
            }
            Self::EntityNotFound(name) => write!(f, "Entity '{name}' not found"),
            Self::NotStandalone(name) => write!(
                f,
                "Entity({name}) document marked standalone but requires external subset"
            ),
            Self::InvalidParserContext => write!(f, "invalid parser context"),
            Self::InvalidDocument => write!(f, "invalid document"),
            Self::InvalidOperation(msg) => write!(f, "operation cannot be performed: {msg}"),
            Self::UnknownEncoding(name) => write!(f, "unknown encoding {name}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            #[cfg(feature = "libxml_reader")]
            Self::Syntax(err) => write!(f, "{err}"),
            Self::TagMismatch { expected, found } => {
                write!(f, "Opening and ending tag mismatch: {expected} and {found}")
            }
            Self::UnboundPrefix(prefix) => write!(f, "Namespace prefix {prefix} is not defined"),
            Self::InvalidReference(text) => write!(f, "invalid reference '{text}'"),
            Self::EntityLoop(name) => write!(f, "Detected an entity reference loop at '{name}'"),
            Self::EntityAmplification(name) => {
                write!(f, "Maximum entity amplification factor exceeded at '{name}'")
            }
        }
    }
}

impl Error for XmlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            #[cfg(feature = "libxml_reader")]
            Self::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for XmlError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "libxml_reader")]
impl From<xmlparser::Error> for XmlError {
    fn from(value: xmlparser::Error) -> Self {
        Self::Syntax(value)
    }
}

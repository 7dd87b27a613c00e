//! Error types for COLLADA import.

use thiserror::Error;

use crate::xml::XmlError;

/// Structural problems found while reading a document.
///
/// Any of these aborts the import; no partial document is returned.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("Root node is <{0}>, expected <COLLADA>")]
    NotCollada(String),

    #[error("Unexpected sub element <{element}> in tag <{parent}>")]
    UnexpectedElement { parent: String, element: String },

    #[error("Expected attribute \"{attribute}\" in element <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("Unknown reference format in url \"{url}\" in <{element}> element")]
    InvalidReference { element: String, url: String },

    #[error("Unable to resolve {kind} reference \"{id}\"")]
    UnresolvedReference { kind: &'static str, id: String },

    #[error("Expected different index count in <{element}> element: expected {expected}, found {actual}")]
    CountMismatch {
        element: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid number \"{value}\" in <{element}> element")]
    InvalidNumber { element: String, value: String },

    #[error("Expected more values while reading {0} contents")]
    OutOfData(String),

    #[error("Invalid data index ({index}/{count}) in primitive specification")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Invalid {0}: only one is allowed")]
    Duplicate(&'static str),

    #[error("Controller chain forms a cycle through \"{0}\"")]
    ControllerCycle(String),

    #[error("{0}")]
    Message(String),
}

impl ParseError {
    pub(crate) fn unexpected(parent: &str, element: &str) -> Self {
        ParseError::UnexpectedElement {
            parent: parent.to_string(),
            element: element.to_string(),
        }
    }

    pub(crate) fn missing(element: &str, attribute: &str) -> Self {
        ParseError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub(crate) fn bad_url(element: &str, url: &str) -> Self {
        ParseError::InvalidReference {
            element: element.to_string(),
            url: url.to_string(),
        }
    }

    pub(crate) fn unresolved(kind: &'static str, id: &str) -> Self {
        ParseError::UnresolvedReference {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// The single failure surfaced to callers; always names the source file.
#[derive(Error, Debug)]
pub enum ColladaError {
    #[error("Collada: {file} - {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("Collada: {file} - failed to open: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl ColladaError {
    /// Name of the file the failure belongs to.
    pub fn file(&self) -> &str {
        match self {
            ColladaError::Parse { file, .. } | ColladaError::Io { file, .. } => file,
        }
    }
}

/// Result type for loading operations.
pub type ColladaResult<T> = Result<T, ColladaError>;

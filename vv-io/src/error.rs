//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while sniffing, staging or parsing mesh files
///
/// Parsers never let these escape `MeshParser::parse`; they are logged at the
/// parser boundary and turned into an empty mesh list.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Unexpected end of data while reading {what}")]
    Truncated { what: String },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Failed to stage input into a temporary file: {source}")]
    Staging {
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] vv_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        IoError::ParseError {
            message: message.into(),
        }
    }

    pub(crate) fn truncated(what: impl Into<String>) -> Self {
        IoError::Truncated { what: what.into() }
    }
}

/// Result type for vv-io operations
pub type Result<T> = std::result::Result<T, IoError>;

//! Error types for GPX parsing, replay and recording

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Well-formed XML that is not a usable GPX document
    #[error("Invalid GPX document: {0}")]
    InvalidDocument(String),

    /// Document without a first track point
    #[error("GPX document has no track points")]
    EmptyDocument,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] scape_common::Error),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.into())
    }
}

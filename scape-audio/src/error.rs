//! Error types for scape-audio
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use std::path::PathBuf;
use thiserror::Error;

use crate::audio::types::PcmFormat;

/// Main error type for scape-audio
#[derive(Error, Debug)]
pub enum Error {
    /// Named asset does not exist in the loader
    #[error("Audio asset not found: {0}")]
    AssetNotFound(String),

    /// Asset exists but could not be decoded
    #[error("Audio decode error for {path}: {reason}")]
    AssetDecode { path: PathBuf, reason: String },

    /// Buffers meant to be played together disagree on PCM format
    #[error("PCM format mismatch for {asset}: expected {expected}, found {found}")]
    FormatMismatch {
        asset: String,
        expected: PcmFormat,
        found: PcmFormat,
    },

    /// A composed sound family has no members
    #[error("Empty sound family: {0}")]
    EmptyFamily(String),

    /// Speech synthesis could not be started
    #[error("Speech synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Beacon family has no region layout to select from
    #[error("No default selector for beacon family: {0}")]
    NoSelector(String),

    /// Equalizer or filter definitions could not be parsed
    #[error("Invalid filter definition: {0}")]
    InvalidFilter(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the common crate
    #[error(transparent)]
    Common(#[from] scape_common::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidFilter(err.to_string())
    }
}

/// Failures reported by a speech synthesis backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("voice unavailable: {0}")]
    VoiceUnavailable(String),

    #[error("backend failure: {0}")]
    Backend(String),

    #[error("rendering cancelled")]
    Cancelled,
}

/// Convenience Result type using scape-audio Error
pub type Result<T> = std::result::Result<T, Error>;

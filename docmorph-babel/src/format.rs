//! Output formats
//!
//! The set of outputs is closed: a word-processor package and a standalone HTML page.
//! Formats are selected by name or detected from an output file's extension.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConvertError;

/// Serialized output of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializedDocument {
    /// UTF-8 text output (HTML)
    Text(String),
    /// Binary output (DOCX)
    Binary(Vec<u8>),
}

impl SerializedDocument {
    /// Consume the serialized output and return the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            SerializedDocument::Text(text) => text.into_bytes(),
            SerializedDocument::Binary(bytes) => bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Docx,
    Html,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Docx, OutputFormat::Html];

    /// The name of this format ("docx", "html")
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "Office Open XML word-processor package",
            OutputFormat::Html => "Standalone HTML5 page with embedded CSS",
        }
    }

    /// File extensions without the leading dot.
    pub fn file_extensions(&self) -> &'static [&'static str] {
        match self {
            OutputFormat::Docx => &["docx"],
            OutputFormat::Html => &["html", "htm"],
        }
    }

    /// Whether the serialized output is binary and must go to a file.
    pub fn is_binary(&self) -> bool {
        matches!(self, OutputFormat::Docx)
    }

    pub fn from_name(name: &str) -> Result<Self, ConvertError> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == name || format.file_extensions().contains(&name.as_str()))
            .ok_or(ConvertError::UnsupportedFormat(name))
    }

    /// Detects the format from a filename's extension.
    pub fn detect_from_filename(filename: impl AsRef<Path>) -> Option<Self> {
        let extension = filename.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.file_extensions().contains(&extension.as_str()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

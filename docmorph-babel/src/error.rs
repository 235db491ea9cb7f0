//! Error types for conversion operations
//!
//! Only [`ConvertError`] ever leaves the public pipeline functions. The other
//! error types describe per-element failures that the Builder swallows and
//! replaces with a visible fallback.

use thiserror::Error;

/// Conversion-level failure. A conversion either fully succeeds or fails with one of these.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The annotated HTML could not be parsed into a tree
    #[error("Parse error: {0}")]
    Parse(String),
    /// The package writer rejected the document model
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Output format name or extension not recognized
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to obtain the bytes behind an image source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid data URL")]
    InvalidDataUrl,
    #[error("not a decodable image: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The typesetting engine could not lay out a TeX expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot typeset `{tex}`: {message}")]
pub struct MathError {
    pub tex: String,
    pub message: String,
}

/// Off-screen rasterization of typeset markup failed.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("no headless browser available: {0}")]
    BrowserUnavailable(String),
    #[error("browser exited with status {0}")]
    BrowserFailed(String),
    #[error("rendered surface is empty")]
    EmptySurface,
    #[error("image error: {0}")]
    Image(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

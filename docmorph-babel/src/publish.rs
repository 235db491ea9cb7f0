//! Document publishing pipeline.
//!
//! Provides a high-level API for converting markdown sources to output formats,
//! handling both in-memory and file-based output.
//!
//! Use this for commands like "Export to DOCX" where you want a single call that
//! handles rendering, model building, serialization and optional file writing.
//! For more control, call the stage functions at the crate root directly.

use std::path::{Path, PathBuf};

use log::info;

use crate::error::ConvertError;
use crate::format::{OutputFormat, SerializedDocument};
use crate::ir::DocumentStyleConfig;
use crate::services::Services;

/// Specifies how to publish a document.
///
/// ```ignore
/// let spec = PublishSpec::new(&source, OutputFormat::Docx)
///     .with_output_path("output.docx");
/// ```
///
/// If no output path is provided, text formats return in-memory content.
/// Binary formats (DOCX) require an explicit output path.
#[derive(Debug, Clone)]
pub struct PublishSpec<'a> {
    /// Markdown source with `$…$` / `$$…$$` math.
    pub source: &'a str,
    pub format: OutputFormat,
    /// Optional file path for writing output. Required for binary formats.
    pub output: Option<PathBuf>,
    /// Title of the HTML page; derived from the first heading when absent.
    pub title: Option<String>,
}

impl<'a> PublishSpec<'a> {
    pub fn new(source: &'a str, format: OutputFormat) -> Self {
        Self {
            source,
            format,
            output: None,
            title: None,
        }
    }

    /// Sets the output file path. If provided, content is written to disk.
    pub fn with_output_path(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// The output from a successful publish operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishArtifact {
    /// Content held in memory (for text formats without an output path).
    InMemory(String),
    /// Path to the written file (when output path was specified).
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    pub artifact: PublishArtifact,
}

/// Publishes a document as described by `spec`.
///
/// # Errors
///
/// Returns [`ConvertError`] if:
/// - Building the document model or serializing fails
/// - File I/O fails
/// - A binary format is requested without an output path
pub async fn publish(
    spec: PublishSpec<'_>,
    config: &DocumentStyleConfig,
    services: &Services,
) -> Result<PublishResult, ConvertError> {
    if spec.format.is_binary() && spec.output.is_none() {
        return Err(ConvertError::Serialize(format!(
            "{} output requires an explicit output path",
            spec.format
        )));
    }
    let title = spec.title.as_deref();
    let serialized =
        crate::convert_with_title(spec.source, spec.format, config, services, title).await?;
    match serialized {
        SerializedDocument::Text(text) => write_or_return_text(text, spec.output).await,
        SerializedDocument::Binary(bytes) => write_binary(bytes, spec.output).await,
    }
}

async fn write_or_return_text(
    text: String,
    output: Option<PathBuf>,
) -> Result<PublishResult, ConvertError> {
    match output {
        Some(path) => write_to_path(path, text.into_bytes()).await,
        None => Ok(PublishResult {
            artifact: PublishArtifact::InMemory(text),
        }),
    }
}

async fn write_binary(
    bytes: Vec<u8>,
    output: Option<PathBuf>,
) -> Result<PublishResult, ConvertError> {
    let path = output.ok_or_else(|| {
        ConvertError::Serialize("binary formats require an explicit output path".to_string())
    })?;
    write_to_path(path, bytes).await
}

async fn write_to_path(path: PathBuf, bytes: Vec<u8>) -> Result<PublishResult, ConvertError> {
    tokio::fs::write(&path, &bytes).await?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(PublishResult {
        artifact: PublishArtifact::File(path),
    })
}

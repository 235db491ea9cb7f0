//! Markdown + LaTeX math to word-processor documents
//!
//!     This crate converts markdown with embedded `$…$` / `$$…$$` math into a DOCX package
//!     (or a standalone HTML page), with headings, lists, tables, code, images and math
//!     rendered as pictures.
//!
//!     TLDR: the pipeline is four stages, each usable on its own:
//!         - [`render_html`]: markdown → annotated HTML (math protected, typeset, restored)
//!         - [`build_document`]: annotated HTML → `Vec<DocumentNode>` (fetches images,
//!           rasterizes math)
//!         - [`serialize_docx`]: `Vec<DocumentNode>` → DOCX bytes
//!         - [`publish::publish`]: all of the above plus writing the result
//!
//! Architecture
//!
//!     The annotated HTML is the contract between the renderer and the builder. Math
//!     containers carry their TeX source in a percent-encoded `data-latex` attribute, so the
//!     builder never has to reverse-engineer typeset markup.
//!
//!     The document model (./ir) is the contract between the builder and the serializer: a
//!     flat, ordered sequence of strictly-typed nodes. The serializer never reorders them.
//!
//!     Everything touching the outside world (image fetching, math typesetting, off-screen
//!     rasterization) sits behind a trait bundled in [`Services`], so the core stays
//!     deterministic under test.
//!
//!     This is a pure lib: it powers docmorph-cli but never prints, reads env vars for
//!     configuration, or exits. (Locating a browser binary is the only env lookup.)
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── format.rs               # OutputFormat, SerializedDocument
//!     ├── publish.rs              # End-to-end pipeline with file output
//!     ├── services.rs             # External collaborators
//!     ├── fetch.rs                # Image fetching (http, data:, files)
//!     ├── chrome.rs               # Headless browser discovery
//!     ├── math
//!     │   ├── fence.rs            # Math fence codec
//!     │   ├── typeset.rs          # TeX → MathML
//!     │   ├── raster.rs           # Equation rasterizer
//!     │   └── browser.rs          # Off-screen surface via headless Chrome
//!     ├── formats
//!     │   ├── markdown            # Markdown → annotated HTML
//!     │   ├── html                # Annotated HTML → document model, standalone export
//!     │   └── docx                # Document model → DOCX package
//!     └── ir                      # Document model and styles
//!
//! Failure policy
//!
//!     A conversion either succeeds completely or fails with one [`ConvertError`]. Inside
//!     that, per-element problems are absorbed: unreachable images become `[Image: alt]`
//!     text, math that cannot be rasterized becomes its TeX source in the math font.

#[cfg(feature = "native-export")]
pub mod chrome;
pub mod error;
pub mod fetch;
pub mod format;
pub mod formats;
pub mod ir;
pub mod math;
pub mod publish;
pub mod services;

pub use error::{ConvertError, FetchError, MathError, RasterError};
pub use format::{OutputFormat, SerializedDocument};
pub use formats::docx::serialize_docx;
pub use formats::markdown::render_html;
pub use ir::{DocumentNode, DocumentStyleConfig};
pub use services::{ConvertSettings, Services};

use formats::html::{wrap_in_document, Builder, DEFAULT_TITLE};

/// Builds the document model of annotated HTML.
pub async fn build_document(
    html: &str,
    config: &DocumentStyleConfig,
    services: &Services,
) -> Result<Vec<DocumentNode>, ConvertError> {
    Builder::new(config, services).build(html).await
}

/// Text of the first level-1 ATX heading, used as the HTML page title.
pub fn document_title(source: &str) -> Option<String> {
    source
        .lines()
        .filter_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().trim_end_matches('#').trim().to_string())
        .find(|title| !title.is_empty())
}

/// Markdown source to serialized output.
pub async fn convert(
    source: &str,
    format: OutputFormat,
    config: &DocumentStyleConfig,
    services: &Services,
) -> Result<SerializedDocument, ConvertError> {
    convert_with_title(source, format, config, services, None).await
}

/// Like [`convert`], with an explicit HTML page title.
pub async fn convert_with_title(
    source: &str,
    format: OutputFormat,
    config: &DocumentStyleConfig,
    services: &Services,
    title: Option<&str>,
) -> Result<SerializedDocument, ConvertError> {
    let html = render_html(source, services.typesetter.as_ref());
    match format {
        OutputFormat::Html => {
            let title = title
                .map(str::to_string)
                .or_else(|| document_title(source))
                .unwrap_or_else(|| DEFAULT_TITLE.to_string());
            Ok(SerializedDocument::Text(wrap_in_document(
                &html, &title, config,
            )))
        }
        OutputFormat::Docx => {
            let nodes = build_document(&html, config, services).await?;
            serialize_docx(nodes, config).map(SerializedDocument::Binary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_from_first_h1() {
        assert_eq!(
            document_title("intro\n## Sub\n# Main Title #\n# Other\n").as_deref(),
            Some("Main Title")
        );
        assert_eq!(document_title("no heading"), None);
    }
}

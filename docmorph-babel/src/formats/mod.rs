//! Format implementations
//!
//! Markdown is the only input; DOCX and standalone HTML are the outputs. HTML is also
//! the intermediate representation between the two halves of the pipeline.

pub mod docx;
pub mod html;
pub mod markdown;

pub use docx::serialize_docx;
pub use html::{wrap_in_document, Builder};
pub use markdown::{render_html, render_markdown};

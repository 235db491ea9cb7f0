//! Document model
//!
//! The strictly-typed representation between the loosely-structured HTML tree and
//! the output package. Styles ([`style`]) are read-only inputs; nodes ([`nodes`]) are
//! owned by whoever built them and consumed by the serializer.

pub mod nodes;
pub mod style;

pub use nodes::{
    BlockFormat, CodeBlock, DocumentNode, Heading, Image, InlineRun, List, MathContent,
    Paragraph, RasterImage, Table, TableCell,
};
pub use style::{Alignment, DocumentStyleConfig, ImageStyle, LinkStyle, StyleSpec};

//! Core data structures of the document model.
//!
//! The Builder produces a `Vec<DocumentNode>` in document order; the package
//! serializer consumes it without reordering.

use super::style::{Alignment, StyleSpec, TWIPS_PER_POINT};

/// A block-level structural unit of the document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentNode {
    Heading(Heading),
    Paragraph(Paragraph),
    Blockquote(Paragraph),
    CodeBlock(CodeBlock),
    List(List),
    Table(Table),
    /// A rule-only paragraph (bottom border, no text).
    Rule,
    Image(Image),
    MathDisplay(MathContent),
}

impl DocumentNode {
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentNode::Heading(_) => "heading",
            DocumentNode::Paragraph(_) => "paragraph",
            DocumentNode::Blockquote(_) => "blockquote",
            DocumentNode::CodeBlock(_) => "code-block",
            DocumentNode::List(_) => "list",
            DocumentNode::Table(_) => "table",
            DocumentNode::Rule => "rule",
            DocumentNode::Image(_) => "image",
            DocumentNode::MathDisplay(_) => "math-display",
        }
    }
}

/// Paragraph-level layout shared by every text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockFormat {
    pub alignment: Alignment,
    /// Twips
    pub spacing_before: u32,
    /// Twips
    pub spacing_after: u32,
}

impl BlockFormat {
    pub fn new(alignment: Alignment, spacing_before: u32, spacing_after: u32) -> Self {
        Self {
            alignment,
            spacing_before,
            spacing_after,
        }
    }

    /// Alignment and margins of a style, with margins converted from points to twips.
    pub fn from_style(style: &StyleSpec) -> Self {
        Self::new(
            style.alignment,
            to_twips(style.margin_top_pt),
            to_twips(style.margin_bottom_pt),
        )
    }
}

pub fn to_twips(points: f32) -> u32 {
    (points.max(0.0) * TWIPS_PER_POINT).round() as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// 1..=6 as authored; styling clamps to 3.
    pub level: u8,
    pub format: BlockFormat,
    pub runs: Vec<InlineRun>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub format: BlockFormat,
    pub runs: Vec<InlineRun>,
}

/// Verbatim code: the full text content of a `<pre>`, in one styled run.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub format: BlockFormat,
    pub text: String,
    pub style: StyleSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub format: BlockFormat,
    /// One entry per item, all at the same bullet level.
    pub items: Vec<Vec<InlineRun>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<TableCell>>,
}

impl Table {
    /// True when no row holds a cell.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub is_header: bool,
    /// `100 / cells in this row`
    pub width_pct: f32,
    pub runs: Vec<InlineRun>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub source_url: String,
    pub data: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    pub format: BlockFormat,
}

/// Pixel data of a rasterized expression with its logical dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// PNG
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// A math expression as it ends up in the package.
#[derive(Debug, Clone, PartialEq)]
pub enum MathContent {
    Raster(RasterImage),
    /// The exact TeX source, used when rasterization was not possible.
    Fallback(String),
}

/// The smallest styled unit of inline content.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineRun {
    Text {
        content: String,
        style: StyleSpec,
    },
    LineBreak,
    Hyperlink {
        href: String,
        children: Vec<InlineRun>,
    },
    InlineImage {
        data: Vec<u8>,
        width_px: u32,
        height_px: u32,
    },
    MathInline {
        math: MathContent,
        /// Ambient style, used to render the fallback text.
        style: StyleSpec,
    },
}

impl InlineRun {
    pub fn text(content: impl Into<String>, style: &StyleSpec) -> Self {
        InlineRun::Text {
            content: content.into(),
            style: style.clone(),
        }
    }

    /// True for runs that would render as nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            InlineRun::Text { content, .. } => content.trim().is_empty(),
            InlineRun::Hyperlink { children, .. } => children.iter().all(InlineRun::is_blank),
            InlineRun::LineBreak | InlineRun::InlineImage { .. } | InlineRun::MathInline { .. } => {
                false
            }
        }
    }

    /// Concatenated text of this run and its children.
    pub fn plain_text(&self) -> String {
        match self {
            InlineRun::Text { content, .. } => content.clone(),
            InlineRun::LineBreak => "\n".to_string(),
            InlineRun::Hyperlink { children, .. } => plain_text(children),
            InlineRun::InlineImage { .. } => String::new(),
            InlineRun::MathInline { math, .. } => match math {
                MathContent::Fallback(tex) => tex.clone(),
                MathContent::Raster(_) => String::new(),
            },
        }
    }
}

pub fn plain_text(runs: &[InlineRun]) -> String {
    runs.iter().map(InlineRun::plain_text).collect()
}

/// Empty or whitespace-only content; such paragraphs are not emitted.
pub fn is_blank(runs: &[InlineRun]) -> bool {
    runs.iter().all(InlineRun::is_blank)
}

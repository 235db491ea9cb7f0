//! Document model builder (annotated HTML → `Vec<DocumentNode>`)
//!
//!     Walks the body's element children in order and classifies each one into a block
//!     kind. Classification is a closed set ([`BlockTag`]); anything unrecognised is a
//!     generic container that either becomes a paragraph (when it holds direct text) or
//!     is descended into.
//!
//!     Per-element failures never abort the build:
//!         - an image that cannot be fetched becomes the text `[Image: alt]`,
//!         - math that cannot be rasterized becomes its TeX source in the math font,
//!         - whitespace-only paragraphs are dropped.
//!
//!     Table cells are built concurrently; everything else is sequential so node order
//!     always matches document order.

use futures::future::{join_all, LocalBoxFuture};
use log::{debug, warn};
use markup5ever_rcdom::Handle;

use super::dom::{self, attr, element_children, has_class, tag_name, text_content};
use super::image::{image_dimensions, to_png};
use crate::error::{ConvertError, FetchError};
use crate::ir::nodes::{is_blank, to_twips};
use crate::ir::{
    Alignment, BlockFormat, CodeBlock, DocumentNode, DocumentStyleConfig, Heading, Image,
    InlineRun, List, MathContent, Paragraph, Table, TableCell,
};
use crate::math::fence::{decode_source, BLOCK_CLASS};
use crate::math::MATH_SOURCE_ATTR;
use crate::services::Services;

/// Spacing around each list item, in points.
const LIST_ITEM_SPACING_PT: f32 = 5.0;

/// Block-level element kinds the builder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Heading(u8),
    Paragraph,
    Blockquote,
    Preformatted,
    List { ordered: bool },
    Table,
    Rule,
    Image,
    /// Never rendered: scripts, styles, templates.
    Ignored,
    Container,
}

impl BlockTag {
    pub fn classify(tag: &str) -> Self {
        match tag {
            "h1" => BlockTag::Heading(1),
            "h2" => BlockTag::Heading(2),
            "h3" => BlockTag::Heading(3),
            "h4" => BlockTag::Heading(4),
            "h5" => BlockTag::Heading(5),
            "h6" => BlockTag::Heading(6),
            "p" => BlockTag::Paragraph,
            "blockquote" => BlockTag::Blockquote,
            "pre" => BlockTag::Preformatted,
            "ul" => BlockTag::List { ordered: false },
            "ol" => BlockTag::List { ordered: true },
            "table" => BlockTag::Table,
            "hr" => BlockTag::Rule,
            "img" => BlockTag::Image,
            "script" | "style" | "template" | "noscript" => BlockTag::Ignored,
            _ => BlockTag::Container,
        }
    }
}

/// Text that stands in for an image that could not be fetched.
pub fn image_placeholder(alt: Option<&str>) -> String {
    let alt = alt.map(str::trim).filter(|alt| !alt.is_empty());
    format!("[Image: {}]", alt.unwrap_or("Image"))
}

/// Drops whitespace-only text runs at both ends.
pub(crate) fn trim_runs(mut runs: Vec<InlineRun>) -> Vec<InlineRun> {
    let is_blank_text = |run: &InlineRun| matches!(run, InlineRun::Text { .. }) && run.is_blank();
    while runs.last().is_some_and(is_blank_text) {
        runs.pop();
    }
    let leading = runs.iter().take_while(|run| is_blank_text(run)).count();
    runs.drain(..leading);
    runs
}

pub struct Builder<'a> {
    pub(super) config: &'a DocumentStyleConfig,
    pub(super) services: &'a Services,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a DocumentStyleConfig, services: &'a Services) -> Self {
        Self { config, services }
    }

    /// Builds the document model of `html`. Fails only if the markup cannot be parsed.
    pub async fn build(&self, html: &str) -> Result<Vec<DocumentNode>, ConvertError> {
        let dom = dom::parse_html(html)?;
        let Some(body) = dom::find_element(&dom.document, "body") else {
            return Ok(Vec::new());
        };

        let mut nodes = Vec::new();
        for child in element_children(&body) {
            nodes.extend(self.block(child).await);
        }
        debug!("Built {} document nodes", nodes.len());
        Ok(nodes)
    }

    fn block(&self, element: Handle) -> LocalBoxFuture<'_, Vec<DocumentNode>> {
        Box::pin(async move {
            if let Some(tex) = math_source(&element) {
                return vec![DocumentNode::MathDisplay(self.math(&tex, true).await)];
            }
            let Some(tag) = tag_name(&element) else {
                return Vec::new();
            };

            match BlockTag::classify(&tag) {
                BlockTag::Heading(level) => {
                    let style = self.config.heading(level);
                    let runs = trim_runs(self.inline_runs(element, style.clone()).await);
                    vec![DocumentNode::Heading(Heading {
                        level,
                        format: BlockFormat::from_style(style),
                        runs,
                    })]
                }
                BlockTag::Paragraph => self.paragraph(element).await.into_iter().collect(),
                BlockTag::Blockquote => {
                    let style = &self.config.blockquote;
                    let runs = trim_runs(self.inline_runs(element, style.clone()).await);
                    vec![DocumentNode::Blockquote(Paragraph {
                        format: BlockFormat::from_style(style),
                        runs,
                    })]
                }
                BlockTag::Preformatted => {
                    let style = &self.config.code_block;
                    vec![DocumentNode::CodeBlock(CodeBlock {
                        format: BlockFormat {
                            alignment: Alignment::Left,
                            ..BlockFormat::from_style(style)
                        },
                        text: text_content(&element),
                        style: style.clone(),
                    })]
                }
                BlockTag::List { ordered } => {
                    let items = self.list_items(element).await;
                    let spacing = to_twips(LIST_ITEM_SPACING_PT);
                    vec![DocumentNode::List(List {
                        ordered,
                        format: BlockFormat::new(
                            self.config.paragraph.alignment,
                            spacing,
                            spacing,
                        ),
                        items,
                    })]
                }
                BlockTag::Table => self
                    .table(&element)
                    .await
                    .map(DocumentNode::Table)
                    .into_iter()
                    .collect(),
                BlockTag::Rule => vec![DocumentNode::Rule],
                BlockTag::Image => self.block_image(&element).await.into_iter().collect(),
                BlockTag::Ignored => Vec::new(),
                BlockTag::Container => {
                    if dom::has_direct_text(&element) {
                        return self.paragraph(element).await.into_iter().collect();
                    }
                    let mut nodes = Vec::new();
                    for child in element_children(&element) {
                        nodes.extend(self.block(child).await);
                    }
                    nodes
                }
            }
        })
    }

    async fn paragraph(&self, element: Handle) -> Option<DocumentNode> {
        let style = &self.config.paragraph;
        let runs = trim_runs(self.inline_runs(element, style.clone()).await);
        if is_blank(&runs) {
            return None;
        }
        Some(DocumentNode::Paragraph(Paragraph {
            format: BlockFormat::from_style(style),
            runs,
        }))
    }

    /// One item per child of the list; nested lists are flattened into further items
    /// at the same level, right after their parent item.
    fn list_items(&self, list: Handle) -> LocalBoxFuture<'_, Vec<Vec<InlineRun>>> {
        Box::pin(async move {
            let style = &self.config.paragraph;
            let mut items = Vec::new();
            for item in element_children(&list) {
                let mut runs = Vec::new();
                let mut nested = Vec::new();
                for child in dom::children(&item) {
                    if matches!(tag_name(&child).as_deref(), Some("ul" | "ol")) {
                        nested.push(child);
                    } else {
                        runs.extend(self.node_runs(child, style.clone()).await);
                    }
                }
                items.push(trim_runs(runs));
                for list in nested {
                    items.extend(self.list_items(list).await);
                }
            }
            items
        })
    }

    /// `None` when the table has no cells at all. Rows without cells are skipped.
    async fn table(&self, element: &Handle) -> Option<Table> {
        let rows = dom::select_all(element, &["tr"]);
        let rows: Vec<_> = join_all(rows.into_iter().map(|row| self.table_row(row)))
            .await
            .into_iter()
            .filter(|cells| !cells.is_empty())
            .collect();
        if rows.is_empty() {
            debug!("Dropping table without cells");
            return None;
        }
        Some(Table { rows })
    }

    async fn table_row(&self, row: Handle) -> Vec<TableCell> {
        let cells = dom::select_all(&row, &["th", "td"]);
        let width_pct = if cells.is_empty() {
            0.0
        } else {
            100.0 / cells.len() as f32
        };
        join_all(cells.into_iter().map(|cell| async move {
            let is_header = tag_name(&cell).as_deref() == Some("th");
            let style = if is_header {
                self.config.paragraph.clone().with_bold()
            } else {
                self.config.paragraph.clone()
            };
            TableCell {
                is_header,
                width_pct,
                runs: trim_runs(self.inline_runs(cell, style).await),
            }
        }))
        .await
    }

    async fn block_image(&self, element: &Handle) -> Option<DocumentNode> {
        let src = attr(element, "src")?;
        let image_style = &self.config.image;
        let format = BlockFormat::new(
            image_style.alignment,
            to_twips(image_style.margin_top_pt),
            to_twips(image_style.margin_bottom_pt),
        );
        match self.fetch_image(&src).await {
            Ok(data) => {
                let (width, height) = image_dimensions(element);
                let (width_px, height_px) = image_style.fit(width, height);
                Some(DocumentNode::Image(Image {
                    source_url: src,
                    data,
                    width_px,
                    height_px,
                    format,
                }))
            }
            Err(err) => {
                warn!("Failed to fetch image {src}: {err}");
                let text = image_placeholder(attr(element, "alt").as_deref());
                Some(DocumentNode::Paragraph(Paragraph {
                    format: BlockFormat::from_style(&self.config.paragraph),
                    runs: vec![InlineRun::text(text, &self.config.paragraph)],
                }))
            }
        }
    }

    /// Image bytes behind `src`, as PNG.
    pub(super) async fn fetch_image(&self, src: &str) -> Result<Vec<u8>, FetchError> {
        let data = self
            .services
            .fetcher
            .fetch(src, self.services.fetch_timeout)
            .await?;
        to_png(data)
    }

    pub(super) async fn math(&self, tex: &str, display: bool) -> MathContent {
        match self.services.math.rasterize(tex, display).await {
            Some(image) => MathContent::Raster(image),
            None => {
                debug!("Falling back to source text for `{tex}`");
                MathContent::Fallback(tex.to_string())
            }
        }
    }
}

/// Decoded TeX of a math carrier element.
/// An empty attribute does not make a carrier.
pub(super) fn math_source(element: &Handle) -> Option<String> {
    attr(element, MATH_SOURCE_ATTR)
        .map(|encoded| decode_source(&encoded))
        .filter(|tex| !tex.is_empty())
}

pub(super) fn is_display_math(element: &Handle) -> bool {
    has_class(element, BLOCK_CLASS)
}

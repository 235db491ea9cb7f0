//! DOCX export (document model → Office Open XML package)
//!
//!     Consumes the node sequence in order and appends one or more package elements per
//!     node. Mapping:
//!
//!     | Node          | Package element                                                 |
//!     |---------------|-----------------------------------------------------------------|
//!     | Heading       | paragraph with heading style `HeadingN` and styled runs         |
//!     | Paragraph     | paragraph, config alignment and spacing                         |
//!     | Blockquote    | paragraph indented 720 twips with a left border                 |
//!     | CodeBlock     | left-aligned paragraph, one shaded monospace run, line breaks   |
//!     | List          | one numbered paragraph per item, shared bullet definition       |
//!     | Table         | full-width table, percentage cells, then a spacer paragraph     |
//!     | Rule          | empty paragraph with a bottom border                            |
//!     | Image         | image run in a paragraph aligned per image config               |
//!     | MathDisplay   | centered paragraph: image run, or the TeX in the math font      |
//!
//!     Sizes are written in half-points (`font_size_pt * 2`), spacing in twips and image
//!     extents in EMU (9525 per pixel).

pub mod numbering;

use std::io::Cursor;

use docx_rs::{
    AlignmentType, BorderType, BreakType, Docx, Hyperlink, HyperlinkType, IndentLevel,
    LineSpacing, NumberingId, Paragraph as DocxParagraph, ParagraphBorder,
    ParagraphBorderPosition, ParagraphBorders, Pic, Run, RunFonts, Shading, Style, StyleType,
    Table as DocxTable, TableCell as DocxTableCell, TableRow, WidthType,
};
use log::debug;

use crate::error::ConvertError;
use crate::ir::style::MATH_FALLBACK_FONT;
use crate::ir::{
    Alignment, BlockFormat, CodeBlock, DocumentNode, DocumentStyleConfig, InlineRun,
    MathContent, RasterImage, StyleSpec, Table,
};
use numbering::ListNumbering;

/// EMU per CSS pixel.
pub const EMU_PER_PX: u32 = 9525;

/// Blockquote left indent, in twips.
pub const BLOCKQUOTE_INDENT: i32 = 720;

/// Spacing around rules, display math and after tables, in twips.
const BLOCK_SPACING: u32 = 240;

const CODE_SHADING: &str = "F5F5F5";
const HEADER_SHADING: &str = "E0E0E0";

/// Display-math fallback text is this many half-points larger than body text.
const DISPLAY_MATH_SIZE_BUMP: usize = 4;

fn alignment(alignment: Alignment) -> AlignmentType {
    match alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
        Alignment::Justify => AlignmentType::Both,
    }
}

fn half_points(points: f32) -> usize {
    (points.max(0.0) * 2.0).round() as usize
}

fn fonts(family: &str) -> RunFonts {
    RunFonts::new()
        .ascii(family)
        .hi_ansi(family)
        .east_asia(family)
        .cs(family)
}

fn formatted(paragraph: DocxParagraph, format: &BlockFormat) -> DocxParagraph {
    paragraph.align(alignment(format.alignment)).line_spacing(
        LineSpacing::new()
            .before(format.spacing_before)
            .after(format.spacing_after),
    )
}

fn styled_run(run: Run, style: &StyleSpec) -> Run {
    let mut run = run
        .fonts(fonts(&style.font_family))
        .size(half_points(style.font_size_pt))
        .color(style.hex_color());
    if style.bold {
        run = run.bold();
    }
    if style.italic {
        run = run.italic();
    }
    if style.underline {
        run = run.underline("single");
    }
    run
}

fn text_run(content: &str, style: &StyleSpec) -> Run {
    styled_run(Run::new().add_text(content), style)
}

fn image_run(data: &[u8], width_px: u32, height_px: u32) -> Run {
    let pic = Pic::new_with_dimensions(data.to_vec(), width_px, height_px)
        .size(width_px * EMU_PER_PX, height_px * EMU_PER_PX);
    Run::new().add_image(pic)
}

fn raster_run(image: &RasterImage) -> Run {
    image_run(&image.bytes, image.width_px, image.height_px)
}

/// TeX source in the math font, italic, in the ambient color.
fn math_fallback_run(tex: &str, style: &StyleSpec, size: usize) -> Run {
    Run::new()
        .add_text(tex)
        .fonts(fonts(MATH_FALLBACK_FONT))
        .size(size)
        .color(style.hex_color())
        .italic()
}

/// Runs usable inside a hyperlink; nested links are flattened into their text.
fn link_runs(runs: &[InlineRun], out: &mut Vec<Run>) {
    for run in runs {
        match run {
            InlineRun::Text { content, style } => out.push(text_run(content, style)),
            InlineRun::LineBreak => out.push(Run::new().add_break(BreakType::TextWrapping)),
            InlineRun::Hyperlink { children, .. } => link_runs(children, out),
            InlineRun::InlineImage {
                data,
                width_px,
                height_px,
            } => out.push(image_run(data, *width_px, *height_px)),
            InlineRun::MathInline { math, style } => out.push(inline_math_run(math, style)),
        }
    }
}

fn inline_math_run(math: &MathContent, style: &StyleSpec) -> Run {
    match math {
        MathContent::Raster(image) => raster_run(image),
        MathContent::Fallback(tex) => {
            math_fallback_run(tex, style, half_points(style.font_size_pt))
        }
    }
}

fn add_runs(mut paragraph: DocxParagraph, runs: &[InlineRun]) -> DocxParagraph {
    for run in runs {
        paragraph = match run {
            InlineRun::Hyperlink { href, children } => {
                let mut link = Hyperlink::new(href, HyperlinkType::External);
                let mut inner = Vec::new();
                link_runs(children, &mut inner);
                for run in inner {
                    link = link.add_run(run);
                }
                paragraph.add_hyperlink(link)
            }
            other => {
                let mut single = Vec::with_capacity(1);
                link_runs(std::slice::from_ref(other), &mut single);
                single
                    .into_iter()
                    .fold(paragraph, |paragraph, run| paragraph.add_run(run))
            }
        };
    }
    paragraph
}

fn border(position: ParagraphBorderPosition, space: usize) -> ParagraphBorder {
    ParagraphBorder::new(position)
        .val(BorderType::Single)
        .size(6)
        .space(space)
        .color("auto")
}

/// `paragraph` with a single border on one side and none elsewhere.
fn bordered(mut paragraph: DocxParagraph, border: ParagraphBorder) -> DocxParagraph {
    paragraph.property = paragraph
        .property
        .set_borders(ParagraphBorders::with_empty().set(border));
    paragraph
}

fn code_paragraph(code: &CodeBlock) -> DocxParagraph {
    let text = code.text.trim_end_matches('\n');
    let mut run = styled_run(Run::new(), &code.style).shading(Shading::new().fill(CODE_SHADING));
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    formatted(DocxParagraph::new(), &code.format).add_run(run)
}

fn table(table: &Table) -> DocxTable {
    let rows = table
        .rows
        .iter()
        .filter(|cells| !cells.is_empty())
        .map(|cells| {
            TableRow::new(
                cells
                    .iter()
                    .map(|cell| {
                        let paragraph = DocxParagraph::new().align(if cell.is_header {
                            AlignmentType::Center
                        } else {
                            AlignmentType::Left
                        });
                        // Fiftieths of a percent.
                        let width = (cell.width_pct * 50.0).round() as usize;
                        let docx_cell = DocxTableCell::new()
                            .add_paragraph(add_runs(paragraph, &cell.runs))
                            .width(width, WidthType::Pct);
                        if cell.is_header {
                            docx_cell.shading(Shading::new().fill(HEADER_SHADING))
                        } else {
                            docx_cell
                        }
                    })
                    .collect(),
            )
        })
        .collect();
    DocxTable::new(rows).width(5000, WidthType::Pct)
}

fn heading_styles(docx: Docx) -> Docx {
    (1..=6).fold(docx, |docx, level| {
        docx.add_style(
            Style::new(format!("Heading{level}"), StyleType::Paragraph)
                .name(format!("Heading {level}")),
        )
    })
}

struct PackageWriter<'a> {
    docx: Docx,
    numbering: ListNumbering,
    config: &'a DocumentStyleConfig,
}

impl<'a> PackageWriter<'a> {
    fn new(config: &'a DocumentStyleConfig) -> Self {
        Self {
            docx: heading_styles(Docx::new()),
            numbering: ListNumbering::default(),
            config,
        }
    }

    fn push(&mut self, paragraph: DocxParagraph) {
        let docx = std::mem::take(&mut self.docx);
        self.docx = docx.add_paragraph(paragraph);
    }

    fn write(&mut self, node: DocumentNode) {
        match node {
            DocumentNode::Heading(heading) => {
                let level = heading.level.clamp(1, 6);
                let paragraph = formatted(DocxParagraph::new(), &heading.format)
                    .style(&format!("Heading{level}"));
                self.push(add_runs(paragraph, &heading.runs));
            }
            DocumentNode::Paragraph(paragraph) => {
                let docx_paragraph = formatted(DocxParagraph::new(), &paragraph.format);
                self.push(add_runs(docx_paragraph, &paragraph.runs));
            }
            DocumentNode::Blockquote(quote) => {
                let paragraph = bordered(
                    formatted(DocxParagraph::new(), &quote.format)
                        .indent(Some(BLOCKQUOTE_INDENT), None, None, None),
                    border(ParagraphBorderPosition::Left, 6),
                );
                self.push(add_runs(paragraph, &quote.runs));
            }
            DocumentNode::CodeBlock(code) => self.push(code_paragraph(&code)),
            DocumentNode::List(list) => {
                let docx = std::mem::take(&mut self.docx);
                let (docx, id) = self.numbering.numbering_for(docx, list.ordered);
                self.docx = docx;
                for item in &list.items {
                    let paragraph = formatted(DocxParagraph::new(), &list.format)
                        .numbering(NumberingId::new(id), IndentLevel::new(0));
                    self.push(add_runs(paragraph, item));
                }
            }
            DocumentNode::Table(data) if data.is_empty() => {
                debug!("Skipping table without cells");
            }
            DocumentNode::Table(data) => {
                let docx = std::mem::take(&mut self.docx);
                self.docx = docx.add_table(table(&data));
                self.push(
                    DocxParagraph::new().line_spacing(LineSpacing::new().before(BLOCK_SPACING)),
                );
            }
            DocumentNode::Rule => {
                let paragraph = bordered(
                    DocxParagraph::new(),
                    border(ParagraphBorderPosition::Bottom, 1),
                )
                .line_spacing(
                    LineSpacing::new()
                        .before(BLOCK_SPACING)
                        .after(BLOCK_SPACING),
                );
                self.push(paragraph);
            }
            DocumentNode::Image(image) => {
                let paragraph = formatted(DocxParagraph::new(), &image.format)
                    .add_run(image_run(&image.data, image.width_px, image.height_px));
                self.push(paragraph);
            }
            DocumentNode::MathDisplay(math) => {
                let paragraph = DocxParagraph::new().align(AlignmentType::Center).line_spacing(
                    LineSpacing::new()
                        .before(BLOCK_SPACING)
                        .after(BLOCK_SPACING),
                );
                let run = match &math {
                    MathContent::Raster(image) => raster_run(image),
                    MathContent::Fallback(tex) => {
                        let body = &self.config.paragraph;
                        math_fallback_run(
                            tex,
                            body,
                            half_points(body.font_size_pt) + DISPLAY_MATH_SIZE_BUMP,
                        )
                    }
                };
                self.push(paragraph.add_run(run));
            }
        }
    }

    fn finish(self) -> Result<Vec<u8>, ConvertError> {
        let mut buffer = Vec::new();
        self.docx
            .build()
            .pack(&mut Cursor::new(&mut buffer))
            .map_err(|e| ConvertError::Serialize(e.to_string()))?;
        Ok(buffer)
    }
}

/// Writes the nodes, in order, into a DOCX package.
pub fn serialize_docx(
    nodes: Vec<DocumentNode>,
    config: &DocumentStyleConfig,
) -> Result<Vec<u8>, ConvertError> {
    debug!("Packaging {} nodes", nodes.len());
    let mut writer = PackageWriter::new(config);
    for node in nodes {
        writer.write(node);
    }
    writer.finish()
}

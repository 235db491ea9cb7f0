//! Deterministic stand-ins for the network and the browser.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use docmorph_babel::error::FetchError;
use docmorph_babel::fetch::ImageFetcher;
use docmorph_babel::ir::nodes::plain_text;
use docmorph_babel::ir::{DocumentNode, MathContent, RasterImage};
use docmorph_babel::math::{MathMlTypesetter, MathRasterizer};
use docmorph_babel::{build_document, render_html, DocumentStyleConfig, Services};

/// A tiny valid PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Serves a fixed set of URLs; everything else is a 404.
#[derive(Default)]
pub struct StubFetcher {
    pub images: HashMap<String, Vec<u8>>,
}

impl StubFetcher {
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }
}

#[async_trait(?Send)]
impl ImageFetcher for StubFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
        self.images.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

pub type MathCalls = Rc<RefCell<Vec<(String, bool)>>>;

/// Rasterizes everything to a 10x5 image except TeX containing `\fail`.
#[derive(Default)]
pub struct StubRasterizer {
    pub calls: MathCalls,
}

#[async_trait(?Send)]
impl MathRasterizer for StubRasterizer {
    async fn rasterize(&self, tex: &str, display: bool) -> Option<RasterImage> {
        self.calls.borrow_mut().push((tex.to_string(), display));
        if tex.contains("\\fail") {
            return None;
        }
        Some(RasterImage {
            bytes: png(20, 10),
            width_px: 10,
            height_px: 5,
        })
    }
}

pub fn services_with(fetcher: StubFetcher) -> (Services, MathCalls) {
    let rasterizer = StubRasterizer::default();
    let calls = rasterizer.calls.clone();
    let services = Services::new(
        Box::new(fetcher),
        Box::new(rasterizer),
        Box::new(MathMlTypesetter),
    );
    (services, calls)
}

pub fn services() -> Services {
    services_with(StubFetcher::default()).0
}

/// Markdown straight to the document model with default styles.
pub async fn build_markdown(source: &str, services: &Services) -> Vec<DocumentNode> {
    let html = render_html(source, services.typesetter.as_ref());
    build_document(&html, &DocumentStyleConfig::default(), services)
        .await
        .unwrap()
}

/// One line per node: kind plus its text.
pub fn outline(nodes: &[DocumentNode]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            DocumentNode::Heading(heading) => {
                format!("heading {}: {}", heading.level, plain_text(&heading.runs))
            }
            DocumentNode::Paragraph(paragraph) => {
                format!("paragraph: {}", plain_text(&paragraph.runs))
            }
            DocumentNode::Blockquote(quote) => format!("blockquote: {}", plain_text(&quote.runs)),
            DocumentNode::CodeBlock(code) => format!("code: {}", code.text.trim_end()),
            DocumentNode::List(list) => format!(
                "list {}: {}",
                if list.ordered { "ordered" } else { "unordered" },
                list.items
                    .iter()
                    .map(|item| plain_text(item).trim().to_string())
                    .collect::<Vec<_>>()
                    .join(" | ")
            ),
            DocumentNode::Table(table) => format!(
                "table: {} rows x {} cells",
                table.rows.len(),
                table.rows.first().map(Vec::len).unwrap_or(0)
            ),
            DocumentNode::Rule => "rule".to_string(),
            DocumentNode::Image(image) => {
                format!("image: {} {}x{}", image.source_url, image.width_px, image.height_px)
            }
            DocumentNode::MathDisplay(MathContent::Raster(_)) => "math: raster".to_string(),
            DocumentNode::MathDisplay(MathContent::Fallback(tex)) => format!("math: {tex}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

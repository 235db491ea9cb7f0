//! Inline content (HTML children → `Vec<InlineRun>`)
//!
//! Each element may override style along independent axes: weight (`strong`/`b`),
//! slant (`em`/`i`), underline (`u`), monospace plus accent color (`code`) and color
//! (inline `style="color: …"`). Overrides apply to a copy of the ambient style and
//! only to the element's own subtree.

use futures::future::LocalBoxFuture;
use log::warn;
use markup5ever_rcdom::{Handle, NodeData};
use once_cell::sync::Lazy;
use regex::Regex;

use super::builder::{image_placeholder, is_display_math, math_source, Builder};
use super::dom::{self, attr, collapse_whitespace, tag_name};
use super::image::image_dimensions;
use crate::ir::{InlineRun, StyleSpec};

// `background-color` must not count as a text color.
static STYLE_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[;\s])color\s*:\s*#?([0-9a-f]{6})").expect("valid color pattern")
});

/// Inline element kinds with dedicated handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineTag {
    Break,
    Anchor,
    Image,
    Strong,
    Emphasis,
    Code,
    Underline,
    /// Any other element: its children inherit the ambient style.
    Other,
}

impl InlineTag {
    pub fn classify(tag: &str) -> Self {
        match tag {
            "br" => InlineTag::Break,
            "a" => InlineTag::Anchor,
            "img" => InlineTag::Image,
            "strong" | "b" => InlineTag::Strong,
            "em" | "i" => InlineTag::Emphasis,
            "code" => InlineTag::Code,
            "u" => InlineTag::Underline,
            _ => InlineTag::Other,
        }
    }
}

/// `#rrggbb` from an inline `style` attribute.
pub fn inline_color(element: &Handle) -> Option<String> {
    let style = attr(element, "style")?;
    STYLE_COLOR
        .captures(&style)
        .map(|caps| format!("#{}", caps[1].to_ascii_lowercase()))
}

impl Builder<'_> {
    /// Runs of all children of `parent`, in order.
    pub(super) fn inline_runs(
        &self,
        parent: Handle,
        style: StyleSpec,
    ) -> LocalBoxFuture<'_, Vec<InlineRun>> {
        Box::pin(async move {
            let mut runs = Vec::new();
            for child in dom::children(&parent) {
                runs.extend(self.node_runs(child, style.clone()).await);
            }
            runs
        })
    }

    /// Runs of a single node under the ambient `style`.
    pub(super) async fn node_runs(&self, node: Handle, style: StyleSpec) -> Vec<InlineRun> {
        match &node.data {
            NodeData::Text { contents } => {
                let text = collapse_whitespace(&contents.borrow());
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![InlineRun::Text {
                        content: text,
                        style,
                    }]
                }
            }
            NodeData::Element { .. } => self.element_runs(node.clone(), style).await,
            _ => Vec::new(),
        }
    }

    async fn element_runs(&self, element: Handle, style: StyleSpec) -> Vec<InlineRun> {
        if let Some(tex) = math_source(&element) {
            let math = self.math(&tex, is_display_math(&element)).await;
            return vec![InlineRun::MathInline { math, style }];
        }
        let Some(tag) = tag_name(&element) else {
            return Vec::new();
        };

        let style = match inline_color(&element) {
            Some(color) => style.with_color(color),
            None => style,
        };

        match InlineTag::classify(&tag) {
            InlineTag::Break => vec![InlineRun::LineBreak],
            InlineTag::Anchor => {
                // Without a target an anchor is ordinary text.
                let Some(href) = attr(&element, "href").filter(|href| !href.trim().is_empty())
                else {
                    return self.inline_runs(element, style).await;
                };
                let children = self
                    .inline_runs(element, style.with_link(&self.config.link))
                    .await;
                vec![InlineRun::Hyperlink { href, children }]
            }
            InlineTag::Image => self.inline_image(&element, &style).await,
            InlineTag::Strong => self.inline_runs(element, style.with_bold()).await,
            InlineTag::Emphasis => self.inline_runs(element, style.with_italic()).await,
            InlineTag::Code => self.inline_runs(element, style.with_code()).await,
            InlineTag::Underline => self.inline_runs(element, style.with_underline()).await,
            InlineTag::Other => self.inline_runs(element, style).await,
        }
    }

    async fn inline_image(&self, element: &Handle, style: &StyleSpec) -> Vec<InlineRun> {
        let Some(src) = attr(element, "src") else {
            return Vec::new();
        };
        match self.fetch_image(&src).await {
            Ok(data) => {
                let (width, height) = image_dimensions(element);
                let (width_px, height_px) = self.config.image.fit(width, height);
                vec![InlineRun::InlineImage {
                    data,
                    width_px,
                    height_px,
                }]
            }
            Err(err) => {
                warn!("Failed to fetch inline image {src}: {err}");
                let text = image_placeholder(attr(element, "alt").as_deref());
                vec![InlineRun::text(text, style)]
            }
        }
    }
}

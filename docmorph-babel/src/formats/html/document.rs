//! Standalone HTML export.
//!
//! Wraps the annotated HTML in a self-contained document. Typography is derived from
//! the same style configuration the package serializer uses, so both outputs agree.

use crate::formats::markdown::highlight_css;
use crate::ir::{DocumentStyleConfig, ImageStyle, LinkStyle, StyleSpec};

pub const DEFAULT_TITLE: &str = "Document";

fn rule(selector: &str, style: &StyleSpec) -> String {
    format!(
        "{selector} {{ font-family: '{}'; font-size: {}pt; color: {}; font-weight: {}; font-style: {}; text-decoration: {}; text-align: {}; margin: {}pt 0 {}pt; }}\n",
        style.font_family.replace('\'', ""),
        style.font_size_pt,
        style.color,
        if style.bold { "bold" } else { "normal" },
        if style.italic { "italic" } else { "normal" },
        if style.underline { "underline" } else { "none" },
        style.alignment.as_css(),
        style.margin_top_pt,
        style.margin_bottom_pt,
    )
}

fn link_rule(link: &LinkStyle) -> String {
    format!(
        "a {{ color: {}; text-decoration: {}; }}\n",
        link.color,
        if link.underline { "underline" } else { "none" }
    )
}

fn image_rule(image: &ImageStyle) -> String {
    let (margin_left, margin_right) = match image.alignment {
        crate::ir::Alignment::Center => ("auto", "auto"),
        crate::ir::Alignment::Right => ("auto", "0"),
        _ => ("0", "auto"),
    };
    format!(
        "img {{ max-width: {}; height: auto; }}\np > img:only-child {{ display: block; margin: {}pt {margin_right} {}pt {margin_left}; }}\n",
        image.max_width, image.margin_top_pt, image.margin_bottom_pt,
    )
}

/// CSS for every configured block category.
pub fn style_css(config: &DocumentStyleConfig) -> String {
    let mut css = String::new();
    css.push_str(&rule("h1", &config.heading1));
    css.push_str(&rule("h2", &config.heading2));
    css.push_str(&rule("h3, h4, h5, h6", &config.heading3));
    css.push_str(&rule("p, li, td, th", &config.paragraph));
    css.push_str(&rule("blockquote, blockquote p", &config.blockquote));
    css.push_str(&rule("pre, pre code", &config.code_block));
    css.push_str(&link_rule(&config.link));
    css.push_str(&image_rule(&config.image));
    css
}

/// Wraps annotated HTML in a complete HTML5 document with embedded CSS.
pub fn wrap_in_document(body_html: &str, title: &str, config: &DocumentStyleConfig) -> String {
    let baseline_css = include_str!("../../../css/baseline.css");
    let style_css = style_css(config);
    let highlight_css = highlight_css();
    let escaped_title = html_escape::encode_text(title);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="generator" content="docmorph">
  <title>{escaped_title}</title>
  <style>
{baseline_css}
{style_css}
{highlight_css}
  </style>
</head>
<body>
<div class="docmorph-document">
{body_html}
</div>
</body>
</html>"#
    )
}
